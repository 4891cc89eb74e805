// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod app_event;
mod app_event_sender;
mod attachment_upload;
mod bottom_pane;
mod composer_app;
mod exit;
mod image_attach;
mod key_hint;
mod render;
mod tui;
mod ui_consts;

pub use attachment_upload::AttachmentUploader;
pub use attachment_upload::HttpAttachmentUploader;
pub use attachment_upload::UploadError;
pub use bottom_pane::ComposerParams;
pub use bottom_pane::DEFAULT_PLACEHOLDER;
pub use bottom_pane::SendRequest;
pub use bottom_pane::UPLOAD_FAILED_MESSAGE;
pub use composer_app::ComposerApp;
pub use composer_protocol::MessageContent;
pub use exit::AppExitInfo;
pub use exit::ExitReason;
pub use image_attach::AttachedImage;
pub use image_attach::DEFAULT_MAX_IMAGE_SIZE;
pub use image_attach::ImageAttachError;
pub use image_attach::ImageBounds;
pub use image_attach::load_image_attachment;
pub use image_attach::resize_image;
pub use tui::restore;
