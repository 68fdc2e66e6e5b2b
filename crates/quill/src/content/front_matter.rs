use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// The untyped key/value pairs found in a post's front matter block.
///
/// Keys keep the order in which they appear in the source file.
pub type FrontMatter = IndexMap<String, Value>;

// The closing delimiter only counts when it starts a line.
static YAML_REGEX: OnceLock<Regex> = OnceLock::new();
static TOML_REGEX: OnceLock<Regex> = OnceLock::new();

fn yaml_regex() -> &'static Regex {
    YAML_REGEX.get_or_init(|| {
        let pattern = r"^[[:space:]]*---(\r?\n(?:(?s:.*?)\r?\n)?)---[[:space:]]*(?:$|\r?\n((?s:.*))$)";
        Regex::new(pattern).expect("failed to compile regex for YAML front matter")
    })
}

fn toml_regex() -> &'static Regex {
    TOML_REGEX.get_or_init(|| {
        let pattern = r"^[[:space:]]*\+\+\+(\r?\n(?:(?s:.*?)\r?\n)?)\+\+\+[[:space:]]*(?:$|\r?\n((?s:.*))$)";
        Regex::new(pattern).expect("failed to compile regex for TOML front matter")
    })
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FrontMatterFormat {
    /// Delimited by `---` lines.
    Yaml,

    /// Delimited by `+++` lines.
    Toml,
}

#[derive(Debug)]
pub struct RawFrontMatter<'a> {
    pub format: FrontMatterFormat,
    pub text: &'a str,
}

impl RawFrontMatter<'_> {
    fn deserialize(&self) -> Result<FrontMatter, ExtractFrontMatterError> {
        match self.format {
            FrontMatterFormat::Yaml => {
                match serde_yaml::from_str::<serde_yaml::Value>(self.text)? {
                    serde_yaml::Value::Null => Ok(FrontMatter::new()),
                    value @ serde_yaml::Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
                    _ => Err(ExtractFrontMatterError::NotAMapping),
                }
            }
            FrontMatterFormat::Toml => {
                let table = toml::from_str::<toml::Table>(self.text)?;

                Ok(table
                    .into_iter()
                    .map(|(key, value)| (key, toml_to_json(value)))
                    .collect())
            }
        }
    }
}

/// Converts a TOML value into its JSON counterpart.
///
/// Datetimes have no JSON representation, so they become strings.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(string) => Value::String(string),
        toml::Value::Integer(integer) => Value::from(integer),
        toml::Value::Float(float) => Value::from(float),
        toml::Value::Boolean(boolean) => Value::Bool(boolean),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(array) => Value::Array(array.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

/// Splits `content` into its raw front matter block and the body that follows it.
///
/// Returns `None` when the content does not start with a front matter block.
pub fn split_front_matter(content: &str) -> Option<(RawFrontMatter<'_>, &str)> {
    let formats = [
        (FrontMatterFormat::Yaml, yaml_regex()),
        (FrontMatterFormat::Toml, toml_regex()),
    ];

    formats.into_iter().find_map(|(format, regex)| {
        let captures = regex.captures(content)?;
        let text = captures.get(1)?.as_str();
        let body = captures.get(2).map_or("", |m| m.as_str());

        Some((RawFrontMatter { format, text }, body))
    })
}

#[derive(Error, Debug)]
pub enum ExtractFrontMatterError {
    #[error("invalid YAML front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML front matter: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("front matter is not a mapping of keys to values")]
    NotAMapping,
}

/// Separates a raw markdown file into its front matter and its body.
pub trait FrontMatterExtractor {
    /// Returns the front matter of `raw_file`, or an empty mapping when it has none.
    fn extract_front_matter(&self, raw_file: &str) -> Result<FrontMatter, ExtractFrontMatterError>;

    /// Returns everything after the front matter block.
    fn extract_content<'a>(&self, raw_file: &'a str) -> &'a str;
}

/// Extracts YAML (`---`) or TOML (`+++`) front matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatterExtractor;

impl FrontMatterExtractor for MatterExtractor {
    fn extract_front_matter(&self, raw_file: &str) -> Result<FrontMatter, ExtractFrontMatterError> {
        match split_front_matter(raw_file) {
            Some((front_matter, _)) => front_matter.deserialize(),
            None => Ok(FrontMatter::new()),
        }
    }

    fn extract_content<'a>(&self, raw_file: &'a str) -> &'a str {
        match split_front_matter(raw_file) {
            Some((_, content)) => content,
            None => raw_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_extract_yaml_front_matter() {
        let raw = indoc! {r#"
            ---
            title: Hola, mundo
            timestamp: "2021-11-02T10:00:00Z"
            readingTime: 4
            tags:
              - rust
              - web
            ---

            # Hola

            Primer artículo.
        "#};

        let front_matter = MatterExtractor.extract_front_matter(raw).unwrap();

        assert_eq!(front_matter["title"], json!("Hola, mundo"));
        assert_eq!(front_matter["timestamp"], json!("2021-11-02T10:00:00Z"));
        assert_eq!(front_matter["readingTime"], json!(4));
        assert_eq!(front_matter["tags"], json!(["rust", "web"]));
        assert_eq!(
            front_matter.keys().collect::<Vec<_>>(),
            vec!["title", "timestamp", "readingTime", "tags"]
        );

        assert_eq!(
            MatterExtractor.extract_content(raw),
            "# Hola\n\nPrimer artículo.\n"
        );
    }

    #[test]
    fn test_extract_toml_front_matter() {
        let raw = indoc! {r#"
            +++
            title = "Hello"
            timestamp = 2022-01-01T08:30:00Z
            tags = ["rust"]
            +++
            Body text.
        "#};

        let front_matter = MatterExtractor.extract_front_matter(raw).unwrap();

        assert_eq!(front_matter["title"], json!("Hello"));
        assert_eq!(front_matter["timestamp"], json!("2022-01-01T08:30:00Z"));
        assert_eq!(front_matter["tags"], json!(["rust"]));
        assert_eq!(MatterExtractor.extract_content(raw), "Body text.\n");
    }

    #[test]
    fn test_no_front_matter() {
        let raw = "# Just a heading\n\nAnd a paragraph.\n";

        assert_eq!(
            MatterExtractor.extract_front_matter(raw).unwrap(),
            FrontMatter::new()
        );
        assert_eq!(MatterExtractor.extract_content(raw), raw);
    }

    #[test]
    fn test_empty_front_matter() {
        let raw = "---\n---\nBody\n";

        assert_eq!(
            MatterExtractor.extract_front_matter(raw).unwrap(),
            FrontMatter::new()
        );
        assert_eq!(MatterExtractor.extract_content(raw), "Body\n");
    }

    #[test]
    fn test_invalid_yaml_front_matter() {
        let raw = "---\ntitle: [unclosed\n---\nBody\n";

        assert!(matches!(
            MatterExtractor.extract_front_matter(raw),
            Err(ExtractFrontMatterError::Yaml(_))
        ));
    }

    #[test]
    fn test_scalar_front_matter_is_rejected() {
        let raw = "---\njust a string\n---\nBody\n";

        assert!(matches!(
            MatterExtractor.extract_front_matter(raw),
            Err(ExtractFrontMatterError::NotAMapping)
        ));
    }

    #[test]
    fn test_delimiter_inside_a_value_does_not_close_the_block() {
        let raw = "---\ntitle: Parte 1 ---\ntags: [a]\n---\nBody\n";

        let front_matter = MatterExtractor.extract_front_matter(raw).unwrap();

        assert_eq!(front_matter["title"], json!("Parte 1 ---"));
        assert_eq!(front_matter["tags"], json!(["a"]));
        assert_eq!(MatterExtractor.extract_content(raw), "Body\n");

        let raw = "+++\ntitle = \"Parte 2 +++\"\n+++\nBody\n";

        let front_matter = MatterExtractor.extract_front_matter(raw).unwrap();

        assert_eq!(front_matter["title"], json!("Parte 2 +++"));
        assert_eq!(MatterExtractor.extract_content(raw), "Body\n");
    }

    #[test]
    fn test_body_keeps_leading_indentation() {
        let raw = "---\ntitle: Code\n---\n\n    indented code\n";

        assert_eq!(MatterExtractor.extract_content(raw), "    indented code\n");
    }
}
