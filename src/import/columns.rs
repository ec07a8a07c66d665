use csv::StringRecord;

const BOM: char = '\u{feff}';

/// Trimmed cell at `index`, or `""` when the column is unmapped or the row
/// is too short.
pub fn cell(record: &StringRecord, index: Option<usize>) -> &str {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .unwrap_or("")
}

pub fn normalize_header(name: &str) -> String {
    name.trim().trim_start_matches(BOM).trim().to_string()
}

pub fn header_eq(name: &str, expected: &str) -> bool {
    name.trim().to_lowercase() == expected.to_lowercase()
}

pub fn header_contains(name: &str, fragment: &str) -> bool {
    name.trim().to_lowercase().contains(&fragment.to_lowercase())
}

/// Parses an id cell. Anything that is not a plain unsigned number is not a
/// data row.
pub fn parse_id(value: &str) -> Option<i64> {
    value.trim().parse::<u32>().ok().map(i64::from)
}
