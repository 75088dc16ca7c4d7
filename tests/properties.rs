use proptest::prelude::*;
use simdcsv::{row_boundaries, Backend, Delimiter, PositionIndex, Table};

/// Buffers over a small alphabet that hits every delimiter often; up to 200
/// bytes covers several full chunks plus a partial tail
fn csv_bytes(alphabet: &'static [u8]) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(alphabet), 0..200)
}

const WITH_QUOTES: &[u8] = b"ab,\n\"";
const WITHOUT_QUOTES: &[u8] = b"ab,\n";

proptest! {
    #[test]
    fn boundaries_are_strictly_ascending(data in csv_bytes(WITH_QUOTES)) {
        let index = PositionIndex::build(&data).unwrap();
        let boundaries = row_boundaries(&index, data.len());
        prop_assert_eq!(boundaries[0], 0);
        prop_assert_eq!(*boundaries.last().unwrap(), data.len());
        prop_assert!(boundaries.windows(2).all(|w| w[0] < w[1]));

        let table = Table::parse(&data).unwrap();
        prop_assert_eq!(table.row_count(), boundaries.len() - 1);
    }

    #[test]
    fn every_row_has_a_field(data in csv_bytes(WITH_QUOTES)) {
        let table = Table::parse(&data).unwrap();
        for row in table.rows() {
            prop_assert!(row.size() >= 1);
            prop_assert_eq!(row.fields().count(), row.size());
        }
    }

    #[test]
    fn fields_past_the_end_are_empty(data in csv_bytes(WITH_QUOTES), extra in 0usize..8) {
        let table = Table::parse(&data).unwrap();
        for row in table.rows() {
            prop_assert!(row.field(row.size() + extra).is_empty());
        }
    }

    #[test]
    fn fields_stay_inside_their_row(data in csv_bytes(WITH_QUOTES)) {
        let table = Table::parse(&data).unwrap();
        let base = data.as_ptr() as usize;
        for row in table.rows() {
            let range = row.range();
            for field in row.fields().filter(|f| !f.is_empty()) {
                let start = field.as_ptr() as usize - base;
                prop_assert!(start >= range.start);
                prop_assert!(start + field.len() <= range.end);
                prop_assert!(!field.contains(&b',') && !field.contains(&b'\n'));
            }
        }
    }

    #[test]
    fn build_matches_naive_scan(data in csv_bytes(WITH_QUOTES)) {
        let detected = PositionIndex::build(&data).unwrap();
        let scalar = PositionIndex::build_with(&data, Backend::Scalar).unwrap();
        prop_assert_eq!(&detected, &scalar);
        prop_assert_eq!(&detected, &PositionIndex::build(&data).unwrap());

        for kind in Delimiter::ALL {
            let expected: Vec<u32> = data
                .iter()
                .enumerate()
                .filter(|&(_, &b)| b == kind.byte())
                .map(|(i, _)| i as u32)
                .collect();
            prop_assert_eq!(detected.offsets(kind), expected.as_slice());
        }
        prop_assert_eq!(detected.positions().count(), detected.commas().len()
            + detected.newlines().len() + detected.quotes().len());
    }

    #[test]
    fn rejoining_fields_reproduces_input(data in csv_bytes(WITHOUT_QUOTES)) {
        let table = Table::parse(&data).unwrap();
        let rows: Vec<Vec<u8>> = table
            .rows()
            .map(|row| row.fields().collect::<Vec<_>>().join(&b','))
            .collect();
        let mut rebuilt = rows.join(&b'\n');
        if data.last() == Some(&b'\n') {
            rebuilt.push(b'\n');
        }
        prop_assert_eq!(rebuilt, data);
    }
}
