// SPDX-License-Identifier: MIT

use hidparser::*;
use proptest::prelude::*;

/// A descriptor with a constant padding field followed by the field
/// under test.
fn padded_field(padding: u32, size: u32, signed: bool) -> Field {
    let minimum = if signed { -1 } else { 0 };
    let bytes = ReportDescriptorBuilder::new()
        .report_count(1)
        .report_size(padding)
        .input(MainFlags::CONSTANT)
        .usage_page(0x01)
        .usage(0x30)
        .logical_minimum(minimum)
        .logical_maximum(1)
        .report_size(size)
        .input(MainFlags::VARIABLE)
        .build();
    let rdesc = parse_report_descriptor(&bytes).unwrap();
    rdesc.fields().last().cloned().unwrap()
}

fn truncate(value: i64, size: usize, signed: bool) -> i64 {
    let unused = 64 - size as u32;
    if signed {
        (value << unused) >> unused
    } else {
        ((value as u64) << unused >> unused) as i64
    }
}

proptest! {
    #[test]
    fn encode_decode(
        padding in 0u32..=32,
        size in 1u32..=32,
        signed in any::<bool>(),
        value in any::<i64>(),
        mut buffer in proptest::collection::vec(any::<u8>(), 9),
    ) {
        let field = padded_field(padding, size, signed);
        prop_assert_eq!(field.report_offset(), padding as usize);
        prop_assert_eq!(field.is_signed(), signed);

        let before = buffer.clone();
        field.insert(value, &mut buffer).unwrap();
        let decoded = field.extract(&buffer).unwrap();
        prop_assert_eq!(decoded, truncate(value, size as usize, signed));

        // no bit outside the field has changed
        for bit in (0..buffer.len() * 8).filter(|b| !field.bits().contains(b)) {
            let mask = 1u8 << (bit % 8);
            prop_assert_eq!(before[bit / 8] & mask, buffer[bit / 8] & mask);
        }
    }

    #[test]
    fn fields_are_contiguous(
        items in proptest::collection::vec((0u32..=32, 0u32..=8), 0..24),
    ) {
        let builder = items.iter().fold(ReportDescriptorBuilder::new(), |b, (size, count)| {
            b.report_size(*size).report_count(*count).input(MainFlags::VARIABLE)
        });
        let rdesc = parse_report_descriptor(&builder.build()).unwrap();

        let expected_bits: u32 = items.iter().map(|(s, c)| s * c).sum();
        let expected_fields: u32 = items.iter().map(|(_, c)| c).sum();
        let reports = rdesc.reports();
        prop_assert_eq!(reports.len(), usize::from(!items.is_empty()));
        if let Some(report) = reports.first() {
            prop_assert_eq!(report.size(), expected_bits as usize);
            prop_assert_eq!(report.fields().len(), expected_fields as usize);
            let total: usize = report.fields().iter().map(|f| f.report_size()).sum();
            prop_assert_eq!(total, report.size());
            for pair in report.fields().windows(2) {
                prop_assert_eq!(pair[0].bits().end, pair[1].bits().start);
            }
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(rdesc) = parse_report_descriptor(&bytes) {
            for report in rdesc.reports() {
                let buffer = vec![0u8; report.size_in_bytes()];
                for field in report.fields() {
                    prop_assert!(field.extract(&buffer).is_ok());
                }
            }
        }
    }
}
