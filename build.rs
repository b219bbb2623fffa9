// SPDX-License-Identifier: MIT

use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // For each hid.bin file in our tests/data directory, create one basic test function
    // that parses that report descriptor and checks the report layout
    let datadir: PathBuf = [concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data")]
        .iter()
        .collect();
    let out_dir = std::env::var_os("OUT_DIR").ok_or("OUT_DIR is not set")?;
    let dest_path = PathBuf::from(&out_dir).join("test-report-descriptors.rs");
    let mut file = std::fs::File::create(dest_path)?;

    println!("cargo:rerun-if-changed=tests/data");

    writeln!(file, "use hidparser::*;")?;
    writeln!(file)?;

    if !datadir.is_dir() {
        return Ok(());
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(&datadir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.to_string_lossy().ends_with(".hid.bin"))
        .collect();
    entries.sort();

    for path in entries {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let funcname = filename.replace([':', '.', '-'], "_");
        writeln!(
            file,
            "
#[test]
#[allow(non_snake_case)]
fn test_{funcname}() {{
    let bytes: Vec<u8> = std::fs::read({path:?}).unwrap();
    let rdesc = ReportDescriptor::try_from(&bytes)
        .unwrap_or_else(|e| panic!(\"Failed to parse {filename}: {{e}}\"));
    for report in rdesc.reports() {{
        let total: usize = report.fields().iter().map(|f| f.report_size()).sum();
        assert_eq!(total, report.size());
        for pair in report.fields().windows(2) {{
            assert_eq!(pair[0].bits().end, pair[1].bits().start);
        }}
    }}
}}
"
        )?;
    }

    Ok(())
}
