use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::BlogConfig;
use crate::content::{
    file_name_for_slug, is_valid_slug, slug_from_file_name, sort_by_date, ExtractFrontMatterError,
    FrontMatterExtractor, MatterExtractor, Post, PostMetadata,
};
use crate::markdown::{HighlightingParser, MarkdownParser, ParseOptions};
use crate::pagination::PostPagination;
use crate::search::SearchQuery;
use crate::storage::{DiskFileSystem, FileSystem};

/// The folder posts are read from unless configured otherwise.
pub const DEFAULT_POSTS_FOLDER: &str = "posts";

/// The extension of post files.
pub const POST_EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum PostServiceError {
    #[error("file system error: {0}")]
    FileSystem(String),

    #[error("invalid front matter in '{file_name}': {source}")]
    FrontMatter {
        file_name: String,
        source: ExtractFrontMatterError,
    },
}

/// Retrieves, searches, and renders the posts stored in one folder.
pub struct PostService<F, E, P> {
    posts_path: PathBuf,
    file_system: F,
    extractor: E,
    parser: P,
    parse_options: ParseOptions,
}

/// A [`PostService`] reading from disk with the default extractor and parser.
pub type DefaultPostService = PostService<DiskFileSystem, MatterExtractor, HighlightingParser>;

impl DefaultPostService {
    pub fn from_config(config: &BlogConfig) -> Self {
        PostService::new(
            &config.posts_path,
            DiskFileSystem,
            MatterExtractor,
            HighlightingParser,
        )
        .with_parse_options(ParseOptions {
            highlight: config.highlight,
        })
    }
}

impl<F, E, P> PostService<F, E, P>
where
    F: FileSystem,
    E: FrontMatterExtractor,
    P: MarkdownParser,
{
    pub fn new(posts_path: impl AsRef<Path>, file_system: F, extractor: E, parser: P) -> Self {
        Self {
            posts_path: posts_path.as_ref().to_owned(),
            file_system,
            extractor,
            parser,
            parse_options: ParseOptions::default(),
        }
    }

    pub fn with_parse_options(mut self, parse_options: ParseOptions) -> Self {
        self.parse_options = parse_options;
        self
    }

    /// Returns every post, newest first.
    pub fn get_all_posts(&self) -> Result<Vec<Post>, PostServiceError> {
        let posts = self
            .list_post_files()?
            .iter()
            .map(|file_name| self.read_post(file_name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sort_by_date(posts))
    }

    /// Returns the post with the given slug, or `None` if there is no such post.
    pub fn get_single_post(&self, slug: &str) -> Result<Option<Post>, PostServiceError> {
        match self.existing_file_name(slug) {
            Some(file_name) => self.read_post(&file_name).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the metadata of every post, newest first, without keeping the
    /// article bodies.
    pub fn get_all_post_metadata(&self) -> Result<Vec<PostMetadata>, PostServiceError> {
        let posts = self
            .list_post_files()?
            .iter()
            .map(|file_name| self.read_post_metadata(file_name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sort_by_date(posts))
    }

    /// Returns the metadata of the post with the given slug, or `None` if
    /// there is no such post.
    pub fn get_single_post_metadata(
        &self,
        slug: &str,
    ) -> Result<Option<PostMetadata>, PostServiceError> {
        match self.existing_file_name(slug) {
            Some(file_name) => self.read_post_metadata(&file_name).map(Some),
            None => Ok(None),
        }
    }

    /// Searches post titles and tags for every whitespace-separated term of
    /// `raw_search` and returns the requested page of matches, newest first.
    pub fn search_posts(
        &self,
        raw_search: &str,
        language: &str,
        current_page: usize,
        items_per_page: usize,
    ) -> Result<PostPagination, PostServiceError> {
        debug!(
            search = raw_search,
            language, current_page, items_per_page, "searching posts"
        );

        let query = SearchQuery::new(raw_search, language);

        let matches = self
            .get_all_post_metadata()?
            .into_iter()
            .filter(|metadata| query.matches(metadata))
            .collect::<Vec<_>>();

        Ok(PostPagination::paginate(
            matches,
            current_page,
            items_per_page,
        ))
    }

    /// Renders an article body to HTML.
    pub fn parse(&self, article_body: &str) -> String {
        self.parser.parse(article_body, self.parse_options)
    }

    fn list_post_files(&self) -> Result<Vec<String>, PostServiceError> {
        self.file_system
            .list_files(&self.posts_path, POST_EXTENSION)
            .map_err(|err| PostServiceError::FileSystem(err.to_string()))
    }

    fn existing_file_name(&self, slug: &str) -> Option<String> {
        if !is_valid_slug(slug) {
            return None;
        }

        let file_name = file_name_for_slug(slug, POST_EXTENSION);

        self.file_system
            .file_exists(&self.posts_path, &file_name)
            .then_some(file_name)
    }

    fn read_file(&self, file_name: &str) -> Result<String, PostServiceError> {
        self.file_system
            .read_file(&self.posts_path, file_name)
            .map_err(|err| PostServiceError::FileSystem(err.to_string()))
    }

    fn read_post(&self, file_name: &str) -> Result<Post, PostServiceError> {
        let raw_file = self.read_file(file_name)?;
        let metadata = self.extract_metadata(file_name, &raw_file)?;
        let article_body = self.extractor.extract_content(&raw_file).to_string();

        Ok(Post {
            metadata,
            article_body,
        })
    }

    fn read_post_metadata(&self, file_name: &str) -> Result<PostMetadata, PostServiceError> {
        let raw_file = self.read_file(file_name)?;

        self.extract_metadata(file_name, &raw_file)
    }

    fn extract_metadata(
        &self,
        file_name: &str,
        raw_file: &str,
    ) -> Result<PostMetadata, PostServiceError> {
        let front_matter = self
            .extractor
            .extract_front_matter(raw_file)
            .map_err(|source| PostServiceError::FrontMatter {
                file_name: file_name.to_string(),
                source,
            })?;

        let slug = slug_from_file_name(file_name, POST_EXTENSION);

        Ok(PostMetadata::from_front_matter(slug, &front_matter))
    }
}
