// SPDX-License-Identifier: MIT

// One test per report descriptor in tests/data, generated by build.rs
include!(concat!(env!("OUT_DIR"), "/test-report-descriptors.rs"));
