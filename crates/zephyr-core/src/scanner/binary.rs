//! Binary/oversized file classification (spec.md §4.4): files that are
//! skipped entirely rather than scanned, recorded as `info`-severity
//! findings.

use std::path::Path;

const BINARY_EXTENSIONS: &[&str] = &[
    "so", "dylib", "a", "o", "bin", "exe", "png", "jpg", "jpeg", "gif", "ico", "pdf", "zip", "gz", "tar", "woff",
    "woff2", "ttf",
];

const MAX_SCANNABLE_BYTES: u64 = 1024 * 1024;
const SNIFF_WINDOW_BYTES: usize = 4096;

/// Why a file was skipped, for the `info`-severity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    BinaryExtension,
    NullByteSniff,
    Oversized,
}

impl SkipReason {
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::BinaryExtension => "skipped: recognized binary file extension",
            Self::NullByteSniff => "skipped: null byte detected in first 4 KiB",
            Self::Oversized => "skipped: file exceeds 1 MiB scan limit",
        }
    }
}

/// Decides whether `path` should be skipped, reading at most
/// `SNIFF_WINDOW_BYTES` to check for a null byte. Returns `None` if the
/// file should be scanned normally.
pub fn classify(path: &Path, metadata: &std::fs::Metadata) -> std::io::Result<Option<SkipReason>> {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if BINARY_EXTENSIONS.iter().any(|b| b.eq_ignore_ascii_case(ext)) {
            return Ok(Some(SkipReason::BinaryExtension));
        }
    }

    if metadata.len() > MAX_SCANNABLE_BYTES {
        return Ok(Some(SkipReason::Oversized));
    }

    let bytes = std::fs::read(path)?;
    let window = &bytes[..bytes.len().min(SNIFF_WINDOW_BYTES)];
    if window.contains(&0) {
        return Ok(Some(SkipReason::NullByteSniff));
    }

    Ok(None)
}
