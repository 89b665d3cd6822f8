//! Plain-text extraction for user-supplied context files.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};

/// Extensions offered by the file prompt. Advisory only; every file gets the
/// same raw text decode.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["txt", "pdf", "docx"];

/// Reads the whole file and decodes it as text. PDF and DOCX are accepted by
/// name but are not parsed; their bytes are decoded as-is, with invalid UTF-8
/// replaced rather than rejected. No size limit.
pub fn read_context_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .with_context(|| format!("could not read context file {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_plain_text_in_full() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all("line one\nline two\n".as_bytes()).unwrap();

        let text = read_context_file(file.path()).unwrap();
        assert_eq!(text, "line one\nline two\n");
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x68, 0x69, 0xff, 0xfe]).unwrap();

        let text = read_context_file(file.path()).unwrap();
        assert!(text.starts_with("hi"));
        assert!(text.contains('\u{fffd}'));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_context_file(Path::new("/nonexistent/context.txt"));
        assert!(err.is_err());
    }
}
