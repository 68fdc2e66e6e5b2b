use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use tracing::warn;

use crate::content::PostMetadata;
use crate::date::parse_article_date;

/// Sorts posts by date, in descending order (newest to oldest).
///
/// Posts with the same date are ordered by slug. Posts whose date is missing
/// or cannot be parsed come last, also ordered by slug.
pub fn sort_by_date<T>(posts: Vec<T>) -> Vec<T>
where
    T: AsRef<PostMetadata>,
{
    let (mut dated, mut undated): (Vec<_>, Vec<_>) = posts
        .into_iter()
        .map(|post| (article_date(post.as_ref()), post))
        .partition(|(date, _)| date.is_some());

    dated.sort_by(|(a_date, a), (b_date, b)| match b_date.cmp(a_date) {
        Ordering::Equal => a.as_ref().slug.cmp(&b.as_ref().slug),
        ord => ord,
    });
    undated.sort_by(|(_, a), (_, b)| a.as_ref().slug.cmp(&b.as_ref().slug));

    dated
        .into_iter()
        .chain(undated)
        .map(|(_, post)| post)
        .collect()
}

fn article_date(metadata: &PostMetadata) -> Option<DateTime<FixedOffset>> {
    let raw_date = metadata.article_date.as_deref()?;
    let date = parse_article_date(raw_date);

    if date.is_none() {
        warn!(slug = %metadata.slug, date = raw_date, "unparseable article date");
    }

    date
}
