//! Content-type detection from leading bytes.

/// A detected file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileType {
    /// Canonical extension, without the dot.
    pub ext: &'static str,
    /// MIME type.
    pub mime: &'static str,
}

/// Detects the type of a buffer.
pub trait ContentSniffer: Send + Sync {
    /// Returns the detected type, or `None` if the content is not recognized.
    fn sniff(&self, data: &[u8]) -> Option<FileType>;
}

/// Signature-based detection of common image formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

const PNG: FileType = FileType {
    ext: "png",
    mime: "image/png",
};
const JPG: FileType = FileType {
    ext: "jpg",
    mime: "image/jpeg",
};
const GIF: FileType = FileType {
    ext: "gif",
    mime: "image/gif",
};
const WEBP: FileType = FileType {
    ext: "webp",
    mime: "image/webp",
};
const AVIF: FileType = FileType {
    ext: "avif",
    mime: "image/avif",
};
const TIF: FileType = FileType {
    ext: "tif",
    mime: "image/tiff",
};
const ICO: FileType = FileType {
    ext: "ico",
    mime: "image/x-icon",
};
const BMP: FileType = FileType {
    ext: "bmp",
    mime: "image/bmp",
};
const SVG: FileType = FileType {
    ext: "svg",
    mime: "image/svg+xml",
};

/// How far into a text document to look for an `<svg` element.
const SVG_SCAN_LIMIT: usize = 4096;

impl ContentSniffer for MagicSniffer {
    fn sniff(&self, data: &[u8]) -> Option<FileType> {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            return Some(PNG);
        }
        if data.starts_with(&[0xff, 0xd8, 0xff]) {
            return Some(JPG);
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(GIF);
        }
        if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(WEBP);
        }
        if data.len() >= 12 && &data[4..8] == b"ftyp" && matches!(&data[8..12], b"avif" | b"avis") {
            return Some(AVIF);
        }
        if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            return Some(TIF);
        }
        if data.starts_with(&[0, 0, 1, 0]) && data.len() >= 6 {
            return Some(ICO);
        }
        if data.len() >= 14 && data.starts_with(b"BM") {
            return Some(BMP);
        }
        if is_svg(data) {
            return Some(SVG);
        }
        None
    }
}

fn is_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(SVG_SCAN_LIMIT)];
    let head = head.strip_prefix(b"\xef\xbb\xbf").unwrap_or(head);
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let head = &head[start..];
    if head.starts_with(b"<svg") {
        return true;
    }
    (head.starts_with(b"<?xml") || head.starts_with(b"<!--") || head.starts_with(b"<!DOCTYPE"))
        && head.windows(4).any(|w| w == b"<svg")
}
