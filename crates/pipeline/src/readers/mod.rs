//! Format-specific readers turning raw bytes into structured values.
//!
//! Each reader returns `None` for input it cannot make sense of; the run
//! loop skips such files without invoking the schema engine.

mod html;
mod image;
mod subtitle;
mod text;

use std::path::Path;

use strata_schema::Value;

pub use html::read_html;
pub use image::read_image;
pub use subtitle::read_subtitle;
pub use text::read_text;

/// Input classification, by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Html,
    Image,
    Text,
    Subtitle,
    Unknown,
}

impl FileKind {
    /// Detect the kind from a path's extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "html" | "htm" => Self::Html,
            "jpg" | "jpeg" | "png" => Self::Image,
            "txt" => Self::Text,
            "srt" => Self::Subtitle,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Image => "image",
            Self::Text => "text",
            Self::Subtitle => "subtitle",
            Self::Unknown => "unknown",
        }
    }
}

/// Dispatch `content` to the reader for `kind`.
pub fn parse(kind: FileKind, content: &[u8], path: &Path) -> Option<Value> {
    let parsed = match kind {
        FileKind::Html => read_html(content),
        FileKind::Image => Some(read_image(content)),
        FileKind::Text => Some(read_text(content)),
        FileKind::Subtitle => Some(read_subtitle(content)),
        FileKind::Unknown => None,
    };

    if parsed.is_none() {
        tracing::warn!("No structured data in {:?} ({})", path, kind.as_str());
    }
    parsed
}
