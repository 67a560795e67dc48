//! Asset type classification.

use std::path::Path;

use crate::utils::mime::{self, types};

/// Kind of source asset, derived from its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    Script,
    Stylesheet,
    Png,
    Jpeg,
    Gif,
    Webp,
    Svg,
    Icon,
    Font,
    Other,
}

/// Transform applied before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// Concatenate, minify and mangle.
    Script,
    /// Minify and republish `url(...)` sub-resources.
    Stylesheet,
    /// Optimize a scratch copy with the PNG tool.
    RasterPng,
    /// Optimize a scratch copy with the JPEG tool.
    RasterJpeg,
    /// Upload bytes verbatim.
    Passthrough,
}

impl AssetType {
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            types::JAVASCRIPT => Self::Script,
            types::CSS => Self::Stylesheet,
            types::PNG => Self::Png,
            types::JPEG => Self::Jpeg,
            types::GIF => Self::Gif,
            types::WEBP => Self::Webp,
            types::SVG => Self::Svg,
            types::ICO => Self::Icon,
            m if mime::is_font(m) => Self::Font,
            _ => Self::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::from_mime(mime::from_path(path))
    }

    pub const fn transform(self) -> TransformKind {
        match self {
            Self::Script => TransformKind::Script,
            Self::Stylesheet => TransformKind::Stylesheet,
            Self::Png => TransformKind::RasterPng,
            Self::Jpeg => TransformKind::RasterJpeg,
            _ => TransformKind::Passthrough,
        }
    }

    /// Only text assets can be concatenated into one artifact.
    pub const fn is_bundleable(self) -> bool {
        matches!(self, Self::Script | Self::Stylesheet)
    }
}

impl TransformKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::RasterPng => "raster-png",
            Self::RasterJpeg => "raster-jpeg",
            Self::Passthrough => "passthrough",
        }
    }
}
