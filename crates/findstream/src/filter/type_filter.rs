//! `find -type` code lookup.

use crate::error::{FindError, Result};
use crate::types::FileKind;

/// Looks up a file kind by its GNU find type code.
pub fn lookup_type_code(code: char) -> Option<FileKind> {
    match code {
        'b' => Some(FileKind::BlockDevice),
        'c' => Some(FileKind::CharDevice),
        'd' => Some(FileKind::Directory),
        'f' => Some(FileKind::File),
        'l' => Some(FileKind::Symlink),
        'p' => Some(FileKind::Fifo),
        's' => Some(FileKind::Socket),
        _ => None,
    }
}

/// Parses a string of type codes; each character is one alternative.
pub fn parse_type_codes(codes: &str) -> Result<Vec<FileKind>> {
    if codes.is_empty() {
        return Err(FindError::config("type: requires at least one type code"));
    }
    let mut kinds = Vec::with_capacity(codes.len());
    for code in codes.chars() {
        let kind = lookup_type_code(code)
            .ok_or_else(|| FindError::config(format!("unknown type code: {code:?}")))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}
