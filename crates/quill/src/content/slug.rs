/// Returns the slug of the post stored in `file_name`.
///
/// The `.{extension}` suffix is removed exactly once; anything else in the
/// file name is kept as-is.
pub fn slug_from_file_name<'a>(file_name: &'a str, extension: &str) -> &'a str {
    file_name
        .strip_suffix(extension)
        .and_then(|stem| stem.strip_suffix('.'))
        .unwrap_or(file_name)
}

/// Returns the name of the file that stores the post with the given slug.
pub fn file_name_for_slug(slug: &str, extension: &str) -> String {
    format!("{slug}.{extension}")
}

/// Whether `slug` can name a file directly inside the posts folder.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.starts_with('.') && !slug.contains(['/', '\\'])
}
