use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{FrontMatter, ReadingMetrics, AVERAGE_ADULT_WPM};

/// The descriptive data of a post, taken from its front matter.
///
/// Every field except the slug is optional: front matter is not validated, so
/// a missing or unusable key simply leaves its field empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetadata {
    /// Unique identifier derived from the post's file name.
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_date: Option<String>,
    /// Reading time in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_reading_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_author_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// The language the post is written in, when it declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl PostMetadata {
    /// Maps the known front matter keys onto a [`PostMetadata`].
    pub fn from_front_matter(slug: impl Into<String>, front_matter: &FrontMatter) -> Self {
        Self {
            slug: slug.into(),
            title: string_field(front_matter, "title"),
            subtitle: string_field(front_matter, "subtitle"),
            image_url: string_field(front_matter, "imageUrl"),
            thumbnail_url: string_field(front_matter, "thumbnailUrl"),
            article_date: string_field(front_matter, "timestamp"),
            article_reading_time: number_field(front_matter, "readingTime"),
            image_author_name: string_field(front_matter, "imageAuthorName"),
            image_author_url: string_field(front_matter, "imageAuthorUrl"),
            image_source_name: string_field(front_matter, "imageSourceName"),
            image_source_url: string_field(front_matter, "imageSourceUrl"),
            excerpt: string_field(front_matter, "excerpt"),
            tags: tags_field(front_matter, "tags"),
            author: string_field(front_matter, "author"),
            language: string_field(front_matter, "language"),
        }
    }
}

impl AsRef<PostMetadata> for PostMetadata {
    fn as_ref(&self) -> &PostMetadata {
        self
    }
}

fn string_field(front_matter: &FrontMatter, key: &str) -> Option<String> {
    match front_matter.get(key)? {
        Value::String(string) => Some(string.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(boolean) => Some(boolean.to_string()),
        _ => None,
    }
}

fn number_field(front_matter: &FrontMatter, key: &str) -> Option<f64> {
    match front_matter.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(string) => string.trim().parse().ok(),
        _ => None,
    }
}

fn tags_field(front_matter: &FrontMatter, key: &str) -> Option<Vec<String>> {
    match front_matter.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(tag) => Some(tag.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
        ),
        Value::String(tag) => Some(vec![tag.clone()]),
        _ => None,
    }
}

/// A post: its metadata plus the unparsed markdown body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub metadata: PostMetadata,
    pub article_body: String,
}

impl Post {
    /// Returns the reading metrics of the article body.
    pub fn reading_metrics(&self) -> ReadingMetrics {
        ReadingMetrics::for_content(&self.article_body, AVERAGE_ADULT_WPM)
    }
}

impl AsRef<PostMetadata> for Post {
    fn as_ref(&self) -> &PostMetadata {
        &self.metadata
    }
}
