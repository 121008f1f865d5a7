//! Utility functions for script text handling.

use encoding_rs::UTF_16LE;

/// UTF-16 little-endian byte order mark.
const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];

/// Decodes UTF-16 script bytes.
///
/// A byte order mark selects the endianness (and is dropped); without one
/// the data is read as little endian. Undecodable units are discarded.
pub fn decode_utf16(data: &[u8]) -> String {
    let (text, _, had_errors) = UTF_16LE.decode(data);
    if had_errors {
        text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER).collect()
    } else {
        text.into_owned()
    }
}

/// Encodes text as UTF-16 little endian, prefixed with a byte order mark.
pub fn encode_utf16_with_bom(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + text.len() * 2);
    out.extend_from_slice(&UTF16LE_BOM);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Splits a line into its content and its terminator (`\n`, `\r\n` or none).
pub fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, &line[body.len()..])
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, &line[body.len()..])
    } else {
        (line, "")
    }
}

/// Returns the lower-cased extension of a file name, without the dot.
pub fn extension_lowercase(path: &std::path::Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
