//! Rendering of command results for the terminal.

use cachectl_core::DuplicateRecord;

/// One `size, key, mime` line per record, the same shape cachetool prints
pub fn duplicates_as_text(records: &[DuplicateRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{}, {}, {}\n", r.size, r.key, r.mime))
        .collect()
}

pub fn duplicates_as_json(records: &[DuplicateRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Human-readable byte count, e.g. `1.0 MiB`
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(size: u64, key: &str) -> DuplicateRecord {
        DuplicateRecord {
            size,
            key: key.to_string(),
            mime: "image/png".to_string(),
        }
    }

    #[test]
    fn text_matches_tool_format() {
        let out = duplicates_as_text(&[record(10497, "https://a/x.png"), record(1, "k")]);
        assert_eq!(out, "10497, https://a/x.png, image/png\n1, k, image/png\n");
    }

    #[test]
    fn json_is_an_array_of_records() {
        let out = duplicates_as_json(&[record(5, "k")]).expect("json");
        let value: serde_json::Value = serde_json::from_str(&out).expect("parse back");
        assert_eq!(value[0]["size"], 5);
        assert_eq!(value[0]["key"], "k");
    }

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1_048_576), "1.0 MiB");
        assert_eq!(human_size(1536), "1.5 KiB");
    }
}
