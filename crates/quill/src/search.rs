use derive_more::Deref;

use crate::content::PostMetadata;

/// The lowercased terms of a search, in the order they were typed.
#[derive(Debug, Default, PartialEq, Eq, Clone, Deref)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    /// Splits a raw search on whitespace. An empty search has no terms.
    pub fn parse(raw_search: &str) -> Self {
        Self(
            raw_search
                .split_whitespace()
                .map(str::to_lowercase)
                .collect(),
        )
    }
}

/// A keyword search over post titles and tags, optionally narrowed to one
/// language.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SearchQuery {
    pub terms: SearchTerms,
    pub language: Option<String>,
}

impl SearchQuery {
    pub fn new(raw_search: &str, language: &str) -> Self {
        let language = language.trim();

        Self {
            terms: SearchTerms::parse(raw_search),
            language: (!language.is_empty()).then(|| language.to_lowercase()),
        }
    }

    /// Whether the post contains every term and is written in the requested
    /// language. Posts that declare no language match any language.
    ///
    /// An empty search still applies the language filter, so it only returns
    /// every post when none of them declares a different language.
    pub fn matches(&self, metadata: &PostMetadata) -> bool {
        self.matches_language(metadata) && self.matches_terms(metadata)
    }

    fn matches_language(&self, metadata: &PostMetadata) -> bool {
        match (&self.language, &metadata.language) {
            (Some(requested), Some(declared)) => declared.trim().to_lowercase() == *requested,
            _ => true,
        }
    }

    fn matches_terms(&self, metadata: &PostMetadata) -> bool {
        if self.terms.is_empty() {
            return true;
        }

        let haystack = searchable_text(metadata);

        self.terms.iter().all(|term| haystack.contains(term.as_str()))
    }
}

/// The title followed by the tags, separated by spaces and lowercased.
fn searchable_text(metadata: &PostMetadata) -> String {
    let title = metadata.title.as_deref().unwrap_or_default();
    let tags = metadata.tags.as_deref().unwrap_or_default().join(" ");

    format!("{title} {tags}").to_lowercase()
}
