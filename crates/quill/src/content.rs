mod front_matter;
mod post;
mod reading_metrics;
mod slug;
mod sorting;

pub use front_matter::*;
pub use post::*;
pub use reading_metrics::*;
pub use slug::*;
pub use sorting::*;
