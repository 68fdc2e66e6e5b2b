use once_cell::sync::Lazy;
use pulldown_cmark::{self as md, CodeBlockKind, Event, Tag};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::warn;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Options that apply to a single [`MarkdownParser::parse`] call.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ParseOptions {
    /// Whether fenced and indented code blocks are syntax highlighted.
    pub highlight: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { highlight: true }
    }
}

/// Converts markdown into HTML.
pub trait MarkdownParser {
    fn parse(&self, markdown: &str, options: ParseOptions) -> String;
}

/// Renders markdown with `pulldown-cmark`, highlighting code blocks with
/// class-based `syntect` spans.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighlightingParser;

struct CodeBlock {
    language: Option<String>,
    code: String,
}

impl CodeBlock {
    fn new(kind: CodeBlockKind) -> Self {
        let language = match kind {
            CodeBlockKind::Fenced(info) => info
                .split(|c: char| c == ',' || c.is_whitespace())
                .next()
                .filter(|language| !language.is_empty())
                .map(ToString::to_string),
            CodeBlockKind::Indented => None,
        };

        Self {
            language,
            code: String::new(),
        }
    }
}

impl MarkdownParser for HighlightingParser {
    fn parse(&self, markdown: &str, options: ParseOptions) -> String {
        let mut md_options = md::Options::empty();
        md_options.insert(md::Options::ENABLE_TABLES);
        md_options.insert(md::Options::ENABLE_FOOTNOTES);
        md_options.insert(md::Options::ENABLE_STRIKETHROUGH);
        md_options.insert(md::Options::ENABLE_TASKLISTS);

        let parser = md::Parser::new_ext(markdown, md_options);

        let mut events = Vec::new();
        let mut code_block: Option<CodeBlock> = None;

        for event in parser {
            if code_block.is_some() {
                match event {
                    Event::Text(text) => {
                        if let Some(block) = code_block.as_mut() {
                            block.code.push_str(&text);
                        }
                    }
                    Event::End(Tag::CodeBlock(_)) => {
                        if let Some(block) = code_block.take() {
                            let html = highlight_code(block.language.as_deref(), &block.code);
                            events.push(Event::Html(html.into()));
                        }
                    }
                    _ => {}
                }

                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) if options.highlight => {
                    code_block = Some(CodeBlock::new(kind));
                }
                event => events.push(event),
            }
        }

        let mut html = String::with_capacity(markdown.len() * 3 / 2);
        md::html::push_html(&mut html, events.into_iter());

        html
    }
}

fn find_syntax(token: &str) -> Option<&'static SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    SYNTAX_SET
        .find_syntax_by_token(&lowercase)
        .or_else(|| SYNTAX_SET.find_syntax_by_name(token))
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(&lowercase))
}

/// Picks the declared language's syntax, or guesses one from the first line
/// of the code when no language is declared.
fn resolve_syntax(language: Option<&str>, code: &str) -> &'static SyntaxReference {
    let syntax = match language {
        Some(language) => {
            let syntax = find_syntax(language);
            if syntax.is_none() {
                warn!(language, "unknown code block language, using plain text");
            }
            syntax
        }
        None => SYNTAX_SET.find_syntax_by_first_line(code),
    };

    syntax.unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

fn language_class(language: Option<&str>, syntax: &SyntaxReference) -> String {
    let token = language
        .map(ToString::to_string)
        .or_else(|| syntax.file_extensions.first().cloned())
        .unwrap_or_else(|| "plaintext".to_string());

    token
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'))
        .collect()
}

fn highlight_code(language: Option<&str>, code: &str) -> String {
    let syntax = resolve_syntax(language, code);
    let class = language_class(language, syntax);

    let mut code_with_newline = code.to_string();
    if !code_with_newline.ends_with('\n') {
        code_with_newline.push('\n');
    }

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);

    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            warn!(%err, language = %class, "failed to highlight code block");

            let mut escaped = String::with_capacity(code.len());
            let _ = md::escape::escape_html(&mut escaped, code);

            return format!("<pre><code class=\"language-{class}\">{escaped}</code></pre>\n");
        }
    }

    format!(
        "<pre><code class=\"language-{class}\">{}</code></pre>\n",
        generator.finalize()
    )
}
