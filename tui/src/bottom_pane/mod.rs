//! Bottom-pane widgets: the composer itself plus the popups and footer it owns.

mod alert_popup;
mod chat_composer;
mod footer;
mod path_prompt;
mod textarea;
mod word_boundary;

pub use chat_composer::ChatComposer;
pub use chat_composer::ComposerParams;
pub use chat_composer::DEFAULT_PLACEHOLDER;
pub use chat_composer::InputResult;
pub use chat_composer::SendRequest;
pub use chat_composer::UPLOAD_FAILED_MESSAGE;
