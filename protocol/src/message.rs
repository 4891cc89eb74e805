use serde::Deserialize;
use serde::Serialize;

/// Content of a composed chat message.
///
/// Serialized as a bare JSON string when only text was typed, or as an ordered array of parts
/// when an image was attached:
///
/// ```json
/// [{"type":"text","text":"caption"},{"type":"image_url","image_url":{"url":"data:..."}}]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Build the payload for a send: plain text, or a text part followed by an image part.
    pub fn compose(text: impl Into<String>, image_url: Option<String>) -> Self {
        let text = text.into();
        match image_url {
            Some(url) => MessageContent::Parts(vec![
                ContentPart::Text { text },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url },
                },
            ]),
            None => MessageContent::Text(text),
        }
    }

    /// The typed text of the message, regardless of shape.
    pub fn text(&self) -> &str {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => parts
                .iter()
                .find_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .unwrap_or_default(),
        }
    }

    /// The embedded image URL, if one was attached.
    pub fn image_url(&self) -> Option<&str> {
        match self {
            MessageContent::Text(_) => None,
            MessageContent::Parts(parts) => parts.iter().find_map(|part| match part {
                ContentPart::ImageUrl { image_url } => Some(image_url.url.as_str()),
                ContentPart::Text { .. } => None,
            }),
        }
    }
}

/// One element of a multi-part message.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// Pre-encoded `data:` URI image.
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ImageUrl {
    pub url: String,
}
