use serde::{Deserialize, Serialize};

use crate::content::PostMetadata;

/// One page of search results plus the counts needed to render pagination
/// controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPagination {
    pub posts_metadata: Vec<PostMetadata>,
    pub current_page: usize,
    pub items_per_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl PostPagination {
    /// Cuts the page window `[(page - 1) * per_page, page * per_page)` out of
    /// `matches`. The totals describe all of `matches`, not just the window.
    ///
    /// Pages are 1-based; a page or page size below one is treated as one.
    pub fn paginate(matches: Vec<PostMetadata>, current_page: usize, items_per_page: usize) -> Self {
        let current_page = current_page.max(1);
        let items_per_page = items_per_page.max(1);

        let total_items = matches.len();
        let total_pages = total_items.div_ceil(items_per_page);

        let start = (current_page - 1).saturating_mul(items_per_page);
        let posts_metadata = matches
            .into_iter()
            .skip(start)
            .take(items_per_page)
            .collect();

        Self {
            posts_metadata,
            current_page,
            items_per_page,
            total_pages,
            total_items,
        }
    }
}
