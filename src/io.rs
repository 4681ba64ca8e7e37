use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use egui::Vec2;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageError, RgbaImage};
use rfd::FileDialog;

/// Extensions offered by the photo picker and accepted by the CLI.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tga", "ico", "tiff", "tif"];

/// Longest edge given to a freshly placed photo, in canvas units.
pub const DEFAULT_IMPORT_EDGE: f32 = 300.0;

pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

// ============================================================================
// ERRORS
// ============================================================================

/// Failure to bring an image onto the board.
#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Decode(String),
    Empty,
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(e) => write!(f, "I/O error: {}", e),
            ImportError::Decode(e) => write!(f, "Could not decode image: {}", e),
            ImportError::Empty => write!(f, "Image has no pixels"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        ImportError::Io(e)
    }
}

impl From<ImageError> for ImportError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::IoError(io) => ImportError::Io(io),
            other => ImportError::Decode(other.to_string()),
        }
    }
}

/// Failure to encode or write an exported image.
#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Encode(String),
    Clipboard(String),
    EmptyBoard,
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "I/O error: {}", e),
            ExportError::Encode(e) => write!(f, "Encode error: {}", e),
            ExportError::Clipboard(e) => write!(f, "Clipboard error: {}", e),
            ExportError::EmptyBoard => write!(f, "Nothing to export"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<ImageError> for ExportError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::IoError(io) => ExportError::Io(io),
            other => ExportError::Encode(other.to_string()),
        }
    }
}

// ============================================================================
// IMPORT
// ============================================================================

/// Decode encoded image bytes to RGBA.
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbaImage, ImportError> {
    let img = image::load_from_memory(bytes)?.into_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(ImportError::Empty);
    }
    Ok(img)
}

/// Load an image file from disk.
pub fn load_image(path: &Path) -> Result<RgbaImage, ImportError> {
    let img = image::open(path)?.into_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(ImportError::Empty);
    }
    log::info!("loaded {} ({}x{})", path.display(), img.width(), img.height());
    Ok(img)
}

/// Frame size for an image of `(w, h)` pixels so its longer side is
/// `max_edge`. Aspect ratio is preserved; small images are enlarged too.
pub fn fit_size(w: u32, h: u32, max_edge: f32) -> Vec2 {
    if w == 0 || h == 0 || max_edge <= 0.0 {
        return Vec2::splat(max_edge.max(1.0));
    }
    let k = max_edge / w.max(h) as f32;
    Vec2::new(w as f32 * k, h as f32 * k)
}

/// Native single-file picker for photos. `None` when the user cancels.
pub fn pick_image_path(start_dir: Option<&Path>) -> Option<PathBuf> {
    let mut dialog = FileDialog::new()
        .set_title("Choose a photo")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .add_filter("All Files", &["*"]);
    if let Some(dir) = start_dir {
        dialog = dialog.set_directory(dir);
    }
    dialog.pick_file()
}

// ============================================================================
// EXPORT
// ============================================================================

/// Encode as PNG in memory. This is the byte format stored on board items.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    encoder.write_image(image.as_raw(), image.width(), image.height(), image::ColorType::Rgba8)?;
    Ok(out)
}

/// Write an image as PNG. Safe to call from a worker thread.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoder = PngEncoder::new(&mut writer);
    encoder.write_image(image.as_raw(), image.width(), image.height(), image::ColorType::Rgba8)?;
    log::info!("saved {}", path.display());
    Ok(())
}

/// Native save dialog for PNG export.
pub fn pick_save_path(start_dir: Option<&Path>, file_name: &str) -> Option<PathBuf> {
    let mut dialog = FileDialog::new()
        .set_title("Save board as PNG")
        .set_file_name(file_name)
        .add_filter("PNG", &["png"]);
    if let Some(dir) = start_dir {
        dialog = dialog.set_directory(dir);
    }
    let path = dialog.save_file()?;
    if path.extension().is_none() {
        return Some(path.with_extension("png"));
    }
    Some(path)
}

/// Put an image on the system clipboard.
pub fn copy_to_clipboard(image: &RgbaImage) -> Result<(), ExportError> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| ExportError::Clipboard(e.to_string()))?;
    let data = arboard::ImageData {
        width: image.width() as usize,
        height: image.height() as usize,
        bytes: std::borrow::Cow::Borrowed(image.as_raw()),
    };
    clipboard
        .set_image(data)
        .map_err(|e| ExportError::Clipboard(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn fit_keeps_aspect() {
        assert_eq!(fit_size(600, 300, 300.0), Vec2::new(300.0, 150.0));
        assert_eq!(fit_size(50, 100, 300.0), Vec2::new(150.0, 300.0));
    }

    #[test]
    fn png_bytes_decode_back() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]));
        let bytes = encode_png(&img).expect("encode");
        assert_eq!(decode_bytes(&bytes).expect("decode"), img);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(decode_bytes(b"not an image"), Err(ImportError::Decode(_))));
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(is_image_extension("JPG"));
        assert!(!is_image_extension("pfe"));
    }
}
