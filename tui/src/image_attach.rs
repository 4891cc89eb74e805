//! Image attachment pipeline: path normalization, decode, downscale, and `data:` URL encoding.

use std::io::Cursor;
use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use image::ImageFormat;
use image::ImageReader;
use image::imageops::FilterType;

/// Default bounding box for attached images.
pub const DEFAULT_MAX_IMAGE_SIZE: ImageBounds = ImageBounds {
    max_width: 800,
    max_height: 800,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ImageBounds {
    fn default() -> Self {
        DEFAULT_MAX_IMAGE_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedImageFormat {
    Png,
    Jpeg,
}

impl EncodedImageFormat {
    pub fn label(self) -> &'static str {
        match self {
            EncodedImageFormat::Png => "PNG",
            EncodedImageFormat::Jpeg => "JPEG",
        }
    }

    fn mime(self) -> &'static str {
        match self {
            EncodedImageFormat::Png => "image/png",
            EncodedImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// A decoded, resized image ready to be embedded in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub format: EncodedImageFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageAttachError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to process image: {0}")]
    Image(#[from] image::ImageError),
    #[error("image resize task failed: {0}")]
    Task(String),
}

/// Decode the image at `path`, shrink it to fit `bounds`, and encode it as a `data:` URL.
///
/// The aspect ratio is preserved and images already inside the bounds are never upscaled.
/// Images with an alpha channel are re-encoded as PNG; everything else as JPEG.
pub fn load_image_attachment(
    path: &Path,
    bounds: ImageBounds,
) -> Result<AttachedImage, ImageAttachError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let img = fit_within(img, bounds);
    let (width, height) = (img.width(), img.height());

    let format = if img.color().has_alpha() {
        EncodedImageFormat::Png
    } else {
        EncodedImageFormat::Jpeg
    };
    let mut bytes = Vec::new();
    match format {
        EncodedImageFormat::Png => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?,
        EncodedImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?,
    }

    Ok(AttachedImage {
        data_url: format!("data:{};base64,{}", format.mime(), STANDARD.encode(&bytes)),
        width,
        height,
        format,
    })
}

/// Async wrapper around [`load_image_attachment`] that keeps decoding off the UI loop.
pub async fn resize_image(
    path: PathBuf,
    bounds: ImageBounds,
) -> Result<AttachedImage, ImageAttachError> {
    tokio::task::spawn_blocking(move || load_image_attachment(&path, bounds))
        .await
        .map_err(|err| ImageAttachError::Task(err.to_string()))?
}

fn fit_within(img: DynamicImage, bounds: ImageBounds) -> DynamicImage {
    if img.width() <= bounds.max_width && img.height() <= bounds.max_height {
        return img;
    }
    img.resize(bounds.max_width, bounds.max_height, FilterType::Triangle)
}

/// Normalize pasted text that may represent a filesystem path.
///
/// Supports:
/// - `file://` URLs (converted to local paths)
/// - Windows/UNC paths
/// - shell-escaped single paths (via `shlex`)
pub fn normalize_pasted_path(pasted: &str) -> Option<PathBuf> {
    let pasted = pasted.trim();
    if pasted.is_empty() {
        return None;
    }

    if let Ok(url) = url::Url::parse(pasted)
        && url.scheme() == "file"
    {
        return url.to_file_path().ok();
    }

    // Detect unquoted Windows paths and bypass POSIX shlex, which treats backslashes as
    // escapes (e.g., C:\Users\Alice\file.png). Also handles UNC paths (\\server\share\path).
    let drive = pasted
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && pasted.get(1..2) == Some(":")
        && pasted.get(2..3).is_some_and(|s| s == "\\" || s == "/");
    if drive || pasted.starts_with("\\\\") {
        return Some(PathBuf::from(pasted));
    }

    let parts: Vec<String> = shlex::Shlex::new(pasted).collect();
    if parts.len() == 1 {
        return parts.into_iter().next().map(PathBuf::from);
    }

    None
}
