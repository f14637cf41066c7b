//! Result interpreter: turns captured tool output into typed values.
//!
//! Everything here is pure. Malformed output is always an `Error::Parse`;
//! no function guesses a default.

use bytes::Bytes;
use cachectl_core::{CapturedStdout, DuplicateRecord, Error, Result, StreamContent};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `<digits>, <text without comma>, <non-whitespace token>`
    static ref DUPLICATE_RECORD_REGEX: Regex =
        Regex::new(r"^([0-9]*), ([^,]*), (\S*)$").unwrap();
}

/// Total cache size in bytes.
///
/// Chunks are concatenated without a separator before parsing, so a number
/// split across reads still parses.
pub fn parse_size(chunks: &[String]) -> Result<u64> {
    let joined = chunks.concat();
    joined
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::parse("integer", joined))
}

/// Cache keys in output order, duplicates kept
pub fn key_list(chunks: Vec<String>) -> Vec<String> {
    chunks
}

/// Stream `index > 0` is text: each captured chunk is kept verbatim, line
/// breaks included, and separate chunks are joined with `,`. Stream 0 is
/// returned as raw chunks.
pub fn stream_content(stdout: CapturedStdout, index: u32) -> StreamContent {
    if index > 0 {
        return StreamContent::join_text(&stdout.into_lines());
    }

    match stdout {
        CapturedStdout::Binary(chunks) => StreamContent::Binary(chunks),
        CapturedStdout::Text(lines) => {
            StreamContent::Binary(lines.into_iter().map(Bytes::from).collect())
        }
    }
}

/// Parse the `list_dups` listing.
///
/// A chunk may carry several records separated by line breaks. Blank lines
/// are skipped; any other line that does not match the record grammar fails
/// the whole call.
pub fn parse_duplicates(chunks: &[String]) -> Result<Vec<DuplicateRecord>> {
    chunks
        .iter()
        .flat_map(|chunk| chunk.lines())
        .filter(|line| !line.trim().is_empty())
        .map(parse_duplicate_line)
        .collect()
}

fn parse_duplicate_line(line: &str) -> Result<DuplicateRecord> {
    let captures = DUPLICATE_RECORD_REGEX
        .captures(line)
        .ok_or_else(|| Error::parse("duplicate record", line))?;

    let size = captures[1]
        .parse::<u64>()
        .map_err(|_| Error::parse("duplicate record size", line))?;

    Ok(DuplicateRecord {
        size,
        key: captures[2].to_string(),
        mime: captures[3].to_string(),
    })
}
