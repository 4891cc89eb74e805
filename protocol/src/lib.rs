//! Wire types shared between the composer widget and whatever embeds it.
//!
//! This crate intentionally keeps only the payload shapes that cross the widget boundary: the
//! composed message handed to `on_send`, and the body returned by the upload endpoint.

pub mod message;
pub mod upload;

pub use message::ContentPart;
pub use message::ImageUrl;
pub use message::MessageContent;
pub use upload::UploadMetadata;
