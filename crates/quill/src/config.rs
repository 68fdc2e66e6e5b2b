use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

use crate::service::DEFAULT_POSTS_FOLDER;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for a blog, usually read from `quill.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    /// The folder holding the `<slug>.md` post files.
    pub posts_path: PathBuf,

    /// The page size used when a search does not ask for one.
    pub items_per_page: usize,

    /// The language used when a search does not ask for one.
    pub default_language: String,

    /// The timezone article dates are displayed in.
    pub timezone: Tz,

    /// Whether code blocks are syntax highlighted.
    pub highlight: bool,

    pub server: ServerConfig,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            posts_path: PathBuf::from(DEFAULT_POSTS_FOLDER),
            items_per_page: 10,
            default_language: "es".to_string(),
            timezone: Tz::UTC,
            highlight: true,
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl BlogConfig {
    /// Loads the config at `path`, falling back to the defaults when the file
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        contents.parse()
    }
}

impl std::str::FromStr for BlogConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!("".parse::<BlogConfig>().unwrap(), BlogConfig::default());
    }

    #[test]
    fn test_parse_config() {
        let config: BlogConfig = indoc! {r#"
            posts_path = "content/posts"
            items_per_page = 5
            default_language = "en"
            timezone = "Europe/Madrid"
            highlight = false

            [server]
            address = "0.0.0.0:8080"
        "#}
        .parse()
        .unwrap();

        assert_eq!(
            config,
            BlogConfig {
                posts_path: PathBuf::from("content/posts"),
                items_per_page: 5,
                default_language: "en".to_string(),
                timezone: Tz::Europe__Madrid,
                highlight: false,
                server: ServerConfig {
                    address: SocketAddr::from(([0, 0, 0, 0], 8080)),
                },
            }
        );
    }

    #[test]
    fn test_partial_config() {
        let config: BlogConfig = "items_per_page = 20".parse().unwrap();

        assert_eq!(config.items_per_page, 20);
        assert_eq!(config.posts_path, PathBuf::from("posts"));
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            "timezone = \"Mars/Olympus\"".parse::<BlogConfig>(),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            "items_per_page = \"many\"".parse::<BlogConfig>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = BlogConfig::load("definitely/not/here/quill.toml").unwrap();

        assert_eq!(config, BlogConfig::default());
    }
}
