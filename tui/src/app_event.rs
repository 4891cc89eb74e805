//! Application-level events used to route async results back onto the UI loop.

use std::path::PathBuf;

use crate::attachment_upload::UploadError;
use crate::image_attach::AttachedImage;
use crate::image_attach::ImageBounds;

#[derive(Debug)]
pub enum AppEvent {
    /// Decode and shrink the image at `path` off the UI loop.
    StartImageResize {
        generation: u64,
        path: PathBuf,
        bounds: ImageBounds,
    },

    /// An image finished decoding/resizing and can be previewed.
    ImageAttached {
        generation: u64,
        image: AttachedImage,
    },

    /// Kick off the upload of a generic attachment.
    StartUpload(PathBuf),

    /// The upload of `file_name` was rejected or never reached the server.
    UploadFailed {
        file_name: String,
        error: UploadError,
    },
}
