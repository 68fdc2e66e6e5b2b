use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// The reading speed of an average adult in words per minute (WPM).
///
/// [Source](https://scholarwithin.com/average-reading-speed)
pub const AVERAGE_ADULT_WPM: usize = 238;

/// The number of words in an article body.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct WordCount(pub usize);

/// The number of minutes it would take to read an article body.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct ReadTime(pub usize);

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct ReadingMetrics {
    pub word_count: WordCount,
    pub read_time: ReadTime,
}

impl ReadingMetrics {
    /// Returns the [`ReadingMetrics`] for the given markdown, read at `wpm`
    /// words per minute. Partial minutes round up.
    pub fn for_content(content: &str, wpm: usize) -> Self {
        let word_count = content.unicode_words().count();
        let read_time = word_count.div_ceil(wpm.max(1));

        Self {
            word_count: WordCount(word_count),
            read_time: ReadTime(read_time),
        }
    }
}
