use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use composer_tui::DEFAULT_MAX_IMAGE_SIZE;
use composer_tui::ImageBounds;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:50505";

/// Settings read from `config.toml`. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerConfig {
    pub server_url: String,
    pub clear_on_send: bool,
    pub placeholder: Option<String>,
    pub image_bounds: ImageBounds,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            clear_on_send: true,
            placeholder: None,
            image_bounds: DEFAULT_MAX_IMAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config file.
    ///
    /// A missing file yields the defaults. So does a file that is not valid TOML, after a warning
    /// is logged; a broken config should not keep the composer from starting.
    pub fn load(&self) -> anyhow::Result<ComposerConfig> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(ComposerConfig::default());
        };

        let doc = match content.parse::<DocumentMut>() {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!("ignoring invalid {}: {err}", self.path.display());
                return Ok(ComposerConfig::default());
            }
        };

        Ok(read_config(&doc))
    }
}

pub fn default_config_path(home: &Path) -> PathBuf {
    home.join(".chat-composer").join("config.toml")
}

fn read_config(doc: &DocumentMut) -> ComposerConfig {
    let defaults = ComposerConfig::default();
    let image = doc.get("image").and_then(TomlItem::as_table);
    let image_dimension = |key: &str| {
        image
            .and_then(|table| table.get(key))
            .and_then(TomlItem::as_integer)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
    };

    ComposerConfig {
        server_url: read_string(doc, "server_url").unwrap_or(defaults.server_url),
        clear_on_send: doc
            .get("clear_on_send")
            .and_then(TomlItem::as_bool)
            .unwrap_or(defaults.clear_on_send),
        placeholder: read_string(doc, "placeholder"),
        image_bounds: ImageBounds {
            max_width: image_dimension("max_width").unwrap_or(defaults.image_bounds.max_width),
            max_height: image_dimension("max_height").unwrap_or(defaults.image_bounds.max_height),
        },
    }
}

fn read_string(doc: &DocumentMut, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(TomlItem::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}
