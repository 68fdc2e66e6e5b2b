use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};
use url::form_urlencoded;

use crate::config::BlogConfig;
use crate::content::{FrontMatterExtractor, PostMetadata};
use crate::markdown::MarkdownParser;
use crate::service::PostService;
use crate::storage::FileSystem;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("async IO error: {0}")]
    AsyncIo(#[from] tokio::io::Error),
}

/// A JSON response: `{"data": ...}` on success, `{"error": ...}` otherwise.
#[derive(Debug, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    fn data(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status: StatusCode::OK,
                body: json!({ "data": data }),
            },
            Err(err) => Self::error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        }
    }

    fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    fn not_found() -> Self {
        Self::error(StatusCode::NOT_FOUND, "not found")
    }

    fn into_http(self) -> Response<BoxBody<Bytes, hyper::Error>> {
        let body = serde_json::to_vec(&self.body).unwrap_or_default();

        let mut response = Response::new(full(body));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        response
    }
}

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

#[derive(Debug, Default, PartialEq)]
struct SearchParams {
    search: String,
    language: Option<String>,
    page: Option<usize>,
    items_per_page: Option<usize>,
}

impl SearchParams {
    fn from_query(query: Option<&str>) -> Result<Self, String> {
        fn parse_number(name: &str, value: &str) -> Result<usize, String> {
            value
                .trim()
                .parse()
                .map_err(|_| format!("'{name}' must be a positive integer, got '{value}'"))
        }

        let mut params = Self::default();

        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "search" => params.search = value.trim().to_string(),
                "language" => params.language = Some(value.trim().to_string()),
                "page" => params.page = Some(parse_number("page", &value)?),
                "itemsPerPage" => {
                    params.items_per_page = Some(parse_number("itemsPerPage", &value)?)
                }
                _ => {}
            }
        }

        Ok(params)
    }
}

#[derive(Serialize)]
struct RenderedPost<'a> {
    metadata: &'a PostMetadata,
    html: String,
}

/// Serves a [`PostService`] as a JSON API.
///
/// Routes:
/// - `GET /api/searchPosts?search=&language=&page=&itemsPerPage=`
/// - `GET /api/posts`
/// - `GET /api/posts/{slug}`
pub struct ApiServer<F, E, P> {
    service: PostService<F, E, P>,
    default_language: String,
    default_items_per_page: usize,
}

impl<F, E, P> ApiServer<F, E, P>
where
    F: FileSystem,
    E: FrontMatterExtractor,
    P: MarkdownParser,
{
    pub fn new(service: PostService<F, E, P>, config: &BlogConfig) -> Self {
        Self {
            service,
            default_language: config.default_language.clone(),
            default_items_per_page: config.items_per_page,
        }
    }

    /// Answers a single request.
    pub fn respond(&self, method: &Method, path: &str, query: Option<&str>) -> ApiResponse {
        if *method != Method::GET {
            return ApiResponse::not_found();
        }

        let path = path.trim_end_matches('/');

        match path {
            "/api/searchPosts" => self.search_posts(query),
            "/api/posts" => self.list_posts(),
            _ => match path.strip_prefix("/api/posts/") {
                Some(slug) => match percent_decode_str(slug).decode_utf8() {
                    Ok(slug) => self.get_post(&slug),
                    Err(_) => ApiResponse::error(StatusCode::BAD_REQUEST, "slug is not valid UTF-8"),
                },
                None => ApiResponse::not_found(),
            },
        }
    }

    fn search_posts(&self, query: Option<&str>) -> ApiResponse {
        let params = match SearchParams::from_query(query) {
            Ok(params) => params,
            Err(message) => return ApiResponse::error(StatusCode::BAD_REQUEST, message),
        };

        let language = params
            .language
            .as_deref()
            .unwrap_or(&self.default_language);

        match self.service.search_posts(
            &params.search,
            language,
            params.page.unwrap_or(1),
            params.items_per_page.unwrap_or(self.default_items_per_page),
        ) {
            Ok(pagination) => ApiResponse::data(pagination),
            Err(err) => internal_error(err),
        }
    }

    fn list_posts(&self) -> ApiResponse {
        match self.service.get_all_post_metadata() {
            Ok(metadata) => ApiResponse::data(metadata),
            Err(err) => internal_error(err),
        }
    }

    fn get_post(&self, slug: &str) -> ApiResponse {
        match self.service.get_single_post(slug) {
            Ok(Some(post)) => ApiResponse::data(RenderedPost {
                metadata: &post.metadata,
                html: self.service.parse(&post.article_body),
            }),
            Ok(None) => ApiResponse::error(StatusCode::NOT_FOUND, "post not found"),
            Err(err) => internal_error(err),
        }
    }
}

fn internal_error(err: impl std::error::Error) -> ApiResponse {
    error!(%err, "failed to answer request");
    ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

impl<F, E, P> ApiServer<F, E, P>
where
    F: FileSystem + Send + Sync + 'static,
    E: FrontMatterExtractor + Send + Sync + 'static,
    P: MarkdownParser + Send + Sync + 'static,
{
    /// Listens on `address` until the process is stopped.
    pub async fn serve(self, address: SocketAddr) -> Result<(), ServeError> {
        let listener = TcpListener::bind(address).await?;
        info!(address = %listener.local_addr()?, "serving posts API");

        let server = Arc::new(self);

        loop {
            let (stream, remote) = listener.accept().await?;

            let io = TokioIo::new(stream);
            let server = server.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| server.clone().handle(req));

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!(%remote, %err, "error serving connection");
                }
            });
        }
    }

    async fn handle(
        self: Arc<Self>,
        req: Request<hyper::body::Incoming>,
    ) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Infallible> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(ToString::to_string);

        debug!(%method, path = %path, "handling request");

        // Post files are read with blocking IO.
        let response =
            tokio::task::spawn_blocking(move || self.respond(&method, &path, query.as_deref()))
                .await
                .unwrap_or_else(|err| {
                    ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                });

        Ok(response.into_http())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::content::MatterExtractor;
    use crate::markdown::{HighlightingParser, ParseOptions};
    use crate::storage::InMemoryFileSystem;

    fn make_server() -> ApiServer<InMemoryFileSystem, MatterExtractor, HighlightingParser> {
        let file_system = InMemoryFileSystem::default();
        let posts = [
            (
                "hola.md",
                indoc! {"
                    ---
                    title: Hola Rust
                    timestamp: 2022-05-01
                    tags: [rust]
                    ---
                    Hola **mundo**
                "},
            ),
            (
                "adios.md",
                indoc! {"
                    ---
                    title: Adiós
                    timestamp: 2022-04-01
                    tags: [despedidas]
                    ---
                    Adiós
                "},
            ),
            (
                "qué-es-rust.md",
                indoc! {"
                    ---
                    title: ¿Qué es Ferris?
                    timestamp: 2022-03-01
                    tags: [intro]
                    ---
                    Un lenguaje.
                "},
            ),
        ];
        for (name, contents) in posts {
            file_system
                .insert(Path::new("posts").join(name), contents)
                .unwrap();
        }

        let service = PostService::new("posts", file_system, MatterExtractor, HighlightingParser)
            .with_parse_options(ParseOptions { highlight: false });

        ApiServer::new(service, &BlogConfig::default())
    }

    #[test]
    fn test_search_posts() {
        let server = make_server();

        let response = server.respond(
            &Method::GET,
            "/api/searchPosts",
            Some("search=%20rust%20&language=es&page=1&itemsPerPage=10"),
        );

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body,
            json!({
                "data": {
                    "postsMetadata": [{
                        "slug": "hola",
                        "title": "Hola Rust",
                        "articleDate": "2022-05-01",
                        "tags": ["rust"]
                    }],
                    "currentPage": 1,
                    "itemsPerPage": 10,
                    "totalPages": 1,
                    "totalItems": 1
                }
            })
        );
    }

    #[test]
    fn test_search_posts_defaults() {
        let server = make_server();

        let response = server.respond(&Method::GET, "/api/searchPosts", None);

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["totalItems"], json!(3));
        assert_eq!(response.body["data"]["itemsPerPage"], json!(10));
        assert_eq!(response.body["data"]["currentPage"], json!(1));
    }

    #[test]
    fn test_search_posts_rejects_bad_numbers() {
        let server = make_server();

        let response = server.respond(&Method::GET, "/api/searchPosts", Some("page=two"));

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.body["error"].as_str().unwrap().contains("page"));
    }

    #[test]
    fn test_list_posts() {
        let server = make_server();

        let response = server.respond(&Method::GET, "/api/posts/", None);

        assert_eq!(response.status, StatusCode::OK);
        let slugs = response.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|post| post["slug"].as_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(slugs, vec!["hola", "adios", "qué-es-rust"]);
    }

    #[test]
    fn test_get_post() {
        let server = make_server();

        let response = server.respond(&Method::GET, "/api/posts/hola", None);

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["metadata"]["title"], json!("Hola Rust"));
        assert_eq!(
            response.body["data"]["html"],
            json!("<p>Hola <strong>mundo</strong></p>\n")
        );
    }

    #[test]
    fn test_get_post_with_encoded_slug() {
        let server = make_server();

        let response = server.respond(&Method::GET, "/api/posts/qu%C3%A9-es-rust", None);

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["metadata"]["slug"], json!("qué-es-rust"));
        assert_eq!(response.body["data"]["metadata"]["title"], json!("¿Qué es Ferris?"));

        let response = server.respond(&Method::GET, "/api/posts/qu%E9-es-rust", None);

        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let response = server.respond(&Method::GET, "/api/posts/..%2Fposts%2Fhola", None);

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_missing_post_is_not_found() {
        let server = make_server();

        let response = server.respond(&Method::GET, "/api/posts/nope", None);

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, json!({ "error": "post not found" }));
    }

    #[test]
    fn test_unknown_routes_are_not_found() {
        let server = make_server();

        for (method, path) in [
            (Method::GET, "/"),
            (Method::GET, "/api/other"),
            (Method::POST, "/api/posts"),
        ] {
            let response = server.respond(&method, path, None);
            assert_eq!(response.status, StatusCode::NOT_FOUND, "{method} {path}");
        }
    }

    #[test]
    fn test_search_params() {
        assert_eq!(
            SearchParams::from_query(Some("search=hola+mundo&itemsPerPage=5&ignored=1")),
            Ok(SearchParams {
                search: "hola mundo".to_string(),
                language: None,
                page: None,
                items_per_page: Some(5),
            })
        );
        assert_eq!(SearchParams::from_query(None), Ok(SearchParams::default()));
    }
}
