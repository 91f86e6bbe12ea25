//! Format dispatcher: classifies an input by its first line so callers can
//! route legacy dialects to their own parsers. Only PGEX is handled by this
//! crate; the SMBX readers are external collaborators.

use std::io::{self, SeekFrom};

use crate::io::TextInput;

/// The dialect a file appears to be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// The section-based PGEX format handled by this crate.
    Pgex,
    /// The compact legacy format whose files open with a bare version number.
    Smbx64,
    /// The SMBX-38A dialect, recognizable by its `SMBXFile` magic.
    Smbx38a,
}

/// Sniffs the first line and rewinds the input to byte 0.
pub fn detect_format(input: &mut dyn TextInput) -> io::Result<FileKind> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    input.seek(SeekFrom::Start(0))?;

    if line.starts_with("SMBXFile") {
        return Ok(FileKind::Smbx38a);
    }
    if !line.is_empty() && line.bytes().all(|byte| byte.is_ascii_digit()) {
        return Ok(FileKind::Smbx64);
    }
    Ok(FileKind::Pgex)
}
