// ABOUTME: Simulated search-engine ranking used to fill keyword positions.
// ABOUTME: RankSimulator is the integration point; RandomRank draws positions 1..=10.

use rand::Rng;

/// Lowest position a simulated rank can take.
pub const MIN_POSITION: u32 = 1;
/// Highest position a simulated rank can take.
pub const MAX_POSITION: u32 = 10;

/// Supplies a search-engine position for a keyword.
///
/// Any `Fn(&str) -> u32` closure is a simulator, which keeps tests deterministic.
pub trait RankSimulator: Send + Sync {
    fn position_for(&self, keyword: &str) -> u32;
}

impl<F> RankSimulator for F
where
    F: Fn(&str) -> u32 + Send + Sync,
{
    fn position_for(&self, keyword: &str) -> u32 {
        self(keyword)
    }
}

/// Uniformly random positions between [`MIN_POSITION`] and [`MAX_POSITION`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRank;

impl RankSimulator for RandomRank {
    fn position_for(&self, _keyword: &str) -> u32 {
        rand::thread_rng().gen_range(MIN_POSITION..=MAX_POSITION)
    }
}
