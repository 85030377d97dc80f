//! Character encoding detection and decoding of raw files.
//!
//! Detection is a heuristic: the first supported encoding under which the
//! whole file decodes without error wins. A file that happens to decode
//! cleanly under an earlier, wrong encoding is accepted silently.

mod cp437;

use std::fmt;
use std::path::Path;

use crate::error::{IngestError, Result};

/// Character encodings a raw file may be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceEncoding {
    Utf8,
    Cp1252,
    Cp437,
}

/// Supported encodings, in detection priority order.
pub const SUPPORTED_ENCODINGS: [SourceEncoding; 3] = [
    SourceEncoding::Utf8,
    SourceEncoding::Cp1252,
    SourceEncoding::Cp437,
];

/// Bytes left undefined by Windows code page 1252.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

impl SourceEncoding {
    /// Identifier used in metadata documents.
    pub fn label(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Cp1252 => "cp1252",
            SourceEncoding::Cp437 => "cp437",
        }
    }

    /// Looks up a supported encoding by its metadata identifier.
    pub fn from_label(label: &str) -> Option<Self> {
        SUPPORTED_ENCODINGS
            .into_iter()
            .find(|encoding| encoding.label() == label)
    }

    /// Strictly decodes `bytes`, returning `None` on any invalid sequence.
    ///
    /// A leading byte-order mark is kept as U+FEFF.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            SourceEncoding::Utf8 => encoding_rs::UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
            SourceEncoding::Cp1252 => {
                if bytes.iter().any(|byte| CP1252_UNDEFINED.contains(byte)) {
                    return None;
                }
                encoding_rs::WINDOWS_1252
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(|text| text.into_owned())
            }
            SourceEncoding::Cp437 => Some(cp437::decode(bytes)),
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Determines the encoding of a raw file.
///
/// A declared encoding is returned as-is if it is supported, without looking
/// at the file. Otherwise each supported encoding is tried in priority order
/// against the full file contents.
pub fn detect_encoding(declared: Option<&str>, raw_path: &Path) -> Result<SourceEncoding> {
    if let Some(label) = declared {
        return SourceEncoding::from_label(label).ok_or_else(|| IngestError::InvalidEncoding {
            encoding: label.to_string(),
        });
    }

    let bytes = read_bytes(raw_path)?;
    for encoding in SUPPORTED_ENCODINGS {
        if encoding.decode(&bytes).is_some() {
            tracing::debug!(
                path = %raw_path.display(),
                encoding = %encoding,
                "Detected character encoding"
            );
            return Ok(encoding);
        }
        tracing::trace!(path = %raw_path.display(), encoding = %encoding, "Decode attempt failed");
    }

    Err(IngestError::EncodingDetectionFailed {
        path: raw_path.to_path_buf(),
    })
}

/// Reads a file and decodes it with the given encoding.
pub fn read_decoded(path: &Path, encoding: SourceEncoding) -> Result<String> {
    let bytes = read_bytes(path)?;
    encoding
        .decode(&bytes)
        .ok_or_else(|| IngestError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.label(),
        })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| IngestError::read(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_declared_encoding_is_not_checked_against_content() {
        // cp437 content, declared utf-8: returned without reading the file
        let encoding = detect_encoding(Some("utf-8"), Path::new("/nonexistent.csv")).unwrap();
        assert_eq!(encoding, SourceEncoding::Utf8);
    }

    #[test]
    fn test_declared_encoding_must_be_supported() {
        let err = detect_encoding(Some("latin-1"), Path::new("/nonexistent.csv")).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidEncoding { ref encoding } if encoding == "latin-1"
        ));
    }

    #[test]
    fn test_detects_utf8() {
        let file = temp_file("Name\nCafé Ñandú\n".as_bytes());
        assert_eq!(
            detect_encoding(None, file.path()).unwrap(),
            SourceEncoding::Utf8
        );
    }

    #[test]
    fn test_detects_cp1252() {
        // 0xE9 = 'é' in cp1252, invalid as a lone UTF-8 byte
        let file = temp_file(b"Name\nCaf\xE9\n");
        assert_eq!(
            detect_encoding(None, file.path()).unwrap(),
            SourceEncoding::Cp1252
        );
    }

    #[test]
    fn test_falls_back_to_cp437() {
        // 0x81 is undefined in cp1252, 'ü' in cp437
        let file = temp_file(b"Name\nM\x81ller\n");
        let encoding = detect_encoding(None, file.path()).unwrap();
        assert_eq!(encoding, SourceEncoding::Cp437);
        assert_eq!(read_decoded(file.path(), encoding).unwrap(), "Name\nMüller\n");
    }

    #[test]
    fn test_utf8_keeps_bom() {
        let decoded = SourceEncoding::Utf8.decode(b"\xEF\xBB\xBFName").unwrap();
        assert_eq!(decoded, "\u{feff}Name");
    }

    #[test]
    fn test_read_decoded_rejects_invalid_bytes() {
        let file = temp_file(b"Caf\xE9");
        let err = read_decoded(file.path(), SourceEncoding::Utf8).unwrap_err();
        assert!(matches!(err, IngestError::Decode { .. }));
    }

    #[test]
    fn test_from_label() {
        assert_eq!(SourceEncoding::from_label("cp1252"), Some(SourceEncoding::Cp1252));
        assert_eq!(SourceEncoding::from_label("UTF-8"), None);
    }
}
