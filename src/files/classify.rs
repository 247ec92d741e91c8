//! Text/binary sniffing and decoding.

use serde::{Deserialize, Serialize};

/// How many leading bytes are inspected for binary markers.
const SNIFF_LEN: usize = 8192;

/// Share of control characters above which non-UTF-8 data counts as binary.
const MAX_CONTROL_RATIO: f32 = 0.1;

/// Text encodings the engine can open and remember per tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-8-bom")]
    Utf8Bom,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
    #[serde(rename = "latin-1")]
    Latin1,
}

impl Encoding {
    /// Label for the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf8Bom => "UTF-8 with BOM",
            Encoding::Utf16Le => "UTF-16 LE",
            Encoding::Utf16Be => "UTF-16 BE",
            Encoding::Latin1 => "Latin-1",
        }
    }
}

/// Result of sniffing a file's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileClassification {
    pub is_text: bool,
    pub encoding: Encoding,
}

impl FileClassification {
    fn text(encoding: Encoding) -> Self {
        Self {
            is_text: true,
            encoding,
        }
    }

    fn binary() -> Self {
        Self {
            is_text: false,
            encoding: Encoding::Utf8,
        }
    }
}

/// Decide whether `bytes` is text and in which encoding.
///
/// Byte-order marks win; otherwise a NUL byte in the first 8 KiB marks the
/// data as binary, valid UTF-8 is UTF-8, and anything else is Latin-1 unless
/// it is dominated by control characters.
pub fn classify(bytes: &[u8]) -> FileClassification {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return FileClassification::text(Encoding::Utf8Bom);
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return FileClassification::text(Encoding::Utf16Le);
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return FileClassification::text(Encoding::Utf16Be);
    }

    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    if sample.contains(&0) {
        return FileClassification::binary();
    }

    if std::str::from_utf8(bytes).is_ok() {
        return FileClassification::text(Encoding::Utf8);
    }

    let control = sample
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C | 0x1B))
        .count();
    if !sample.is_empty() && control as f32 / sample.len() as f32 > MAX_CONTROL_RATIO {
        return FileClassification::binary();
    }

    FileClassification::text(Encoding::Latin1)
}

/// Decode `bytes` that were classified as `encoding` text.
pub fn decode_text(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        Encoding::Utf8Bom => String::from_utf8_lossy(bytes.get(3..).unwrap_or_default()).into_owned(),
        Encoding::Utf16Le | Encoding::Utf16Be => {
            let body = bytes.get(2..).unwrap_or_default();
            let units: Vec<u16> = body
                .chunks_exact(2)
                .map(|pair| match encoding {
                    Encoding::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
                    _ => u16::from_be_bytes([pair[0], pair[1]]),
                })
                .collect();
            String::from_utf16_lossy(&units)
        }
        Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
    }
}
