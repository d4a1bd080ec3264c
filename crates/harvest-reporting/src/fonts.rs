//! Font discovery and text measurement for the rendered images.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};

use crate::ReportError;

/// Common locations of a sans-serif TrueType font, tried in order when no
/// font is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Width and height in pixels of a line of text at a given pixel size.
pub trait TextMeasure {
    fn text_size(&self, text: &str, px: f32) -> (u32, u32);
}

impl TextMeasure for FontVec {
    fn text_size(&self, text: &str, px: f32) -> (u32, u32) {
        imageproc::drawing::text_size(PxScale::from(px), self, text)
    }
}

fn read_font(path: &Path) -> Result<FontVec, ReportError> {
    let bytes = std::fs::read(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec(bytes).map_err(|e| ReportError::Font {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the font used for all chart text.
///
/// An explicitly configured font must load. Without one, the first readable
/// system candidate is used; `Ok(None)` means the images are drawn without
/// text.
pub fn load_font(configured: Option<&Path>) -> Result<Option<FontVec>, ReportError> {
    if let Some(path) = configured {
        return read_font(path).map(Some);
    }
    for candidate in SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from) {
        if !candidate.is_file() {
            continue;
        }
        match read_font(&candidate) {
            Ok(font) => {
                tracing::debug!(path = %candidate.display(), "using system font");
                return Ok(Some(font));
            }
            Err(e) => tracing::debug!(error = %e, "skipping font candidate"),
        }
    }
    tracing::warn!("no usable font found; word cloud and chart labels will be blank");
    Ok(None)
}
