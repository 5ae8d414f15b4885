//! `key=value` properties files holding the SQL text behind each syntax key.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Lookup from syntax key to its raw (still escape-encoded) text.
pub type SyntaxMap = HashMap<String, String>;

/// Load a properties file.
///
/// Blank lines, `#` comments and lines without `=` are skipped. Lines split
/// on the first `=`; later keys overwrite earlier ones.
pub fn load(path: &Path) -> Result<SyntaxMap> {
    let text = fs::read_to_string(path).map_err(|e| Error::from_read(path, e))?;
    Ok(parse(&text))
}

pub fn parse(text: &str) -> SyntaxMap {
    let mut map = SyntaxMap::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

/// Decode the `\n`, `\t` and `\=` escapes used in stored SQL text.
pub fn decode_escapes(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\=", "=")
}
