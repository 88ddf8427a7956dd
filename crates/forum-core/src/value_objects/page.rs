//! Topic pagination rule

/// Number of posts shown on one page of a topic
pub const POSTS_PER_PAGE: i64 = 50;

/// 1-based page of a post given how many posts precede it in its topic
///
/// Negative counts are treated as zero.
#[inline]
pub fn page_for_preceding(preceding: i64) -> u32 {
    (preceding.max(0) / POSTS_PER_PAGE + 1) as u32
}
