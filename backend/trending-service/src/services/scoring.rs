use crate::config::TrendsConfig;
use crate::error::Result;
use crate::models::Status;
use crate::store::{RankedStore, RankedView};
use chrono::{DateTime, Utc};

/// Engagement a status is expected to get by default.
const EXPECTED_ENGAGEMENT: f64 = 1.0;

/// Turns engagement counts and age into a decayed trending score.
///
/// The raw curve is deliberately punitive: nothing below the absolute
/// threshold scores, and above it engagement counts quadratically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCalculator {
    threshold: f64,
    halflife_secs: f64,
}

impl ScoreCalculator {
    pub fn new(threshold: u32, halflife_secs: u64) -> Self {
        debug_assert!(halflife_secs > 0, "half-life must be positive");
        Self {
            threshold: threshold as f64,
            halflife_secs: halflife_secs as f64,
        }
    }

    pub fn from_config(config: &TrendsConfig) -> Self {
        Self::new(config.threshold, config.score_halflife_secs)
    }

    pub fn raw_score(&self, observed: f64) -> f64 {
        if observed < EXPECTED_ENGAGEMENT || observed < self.threshold {
            0.0
        } else {
            (observed - EXPECTED_ENGAGEMENT).powi(2) / EXPECTED_ENGAGEMENT
        }
    }

    /// `raw * 0.5^(age / halflife)`
    pub fn decay(raw: f64, age_secs: f64, halflife_secs: f64) -> f64 {
        raw * 0.5_f64.powf(age_secs / halflife_secs)
    }

    /// Score of `status` at `at`; age runs from creation, not first sighting.
    pub fn decayed_score(&self, status: &Status, at: DateTime<Utc>) -> f64 {
        let age_secs = (at - status.created_at).num_milliseconds() as f64 / 1000.0;
        Self::decay(
            self.raw_score(status.observed_engagement()),
            age_secs,
            self.halflife_secs,
        )
    }
}

/// Score of the member at 0-based `rank` in `view`.
///
/// When the view is shorter than `rank + 1` the lowest score is used, and
/// an empty view yields 0.
pub async fn score_at_rank(store: &dyn RankedStore, view: RankedView, rank: usize) -> Result<f64> {
    let members = store.top(view, Some(rank + 1)).await?;
    Ok(members.last().map(|(_, score)| *score).unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Visibility};
    use crate::store::{MemoryTrendStore, UsedBuckets};
    use chrono::Duration;

    const HALFLIFE: u64 = 8 * 3600;

    fn calculator() -> ScoreCalculator {
        ScoreCalculator::new(5, HALFLIFE)
    }

    fn status(created_at: DateTime<Utc>, reblogs: i64, favourites: i64) -> Status {
        Status {
            id: 1,
            account: Account {
                id: 1,
                username: "erin".to_string(),
                discoverable: true,
                silenced: false,
                requested_review_at: None,
            },
            created_at,
            visibility: Visibility::Public,
            spoiler_text: String::new(),
            sensitive: false,
            in_reply_to_id: None,
            reblogs_count: reblogs,
            favourites_count: favourites,
            trendable: true,
            reblog: None,
        }
    }

    #[test]
    fn test_raw_score_below_threshold_is_zero() {
        let calc = calculator();
        assert_eq!(calc.raw_score(0.0), 0.0);
        assert_eq!(calc.raw_score(4.0), 0.0);
        assert_eq!(calc.raw_score(4.99), 0.0);
    }

    #[test]
    fn test_raw_score_below_baseline_is_zero() {
        let calc = ScoreCalculator::new(0, HALFLIFE);
        assert_eq!(calc.raw_score(0.5), 0.0);
        assert_eq!(calc.raw_score(1.0), 0.0);
        assert_eq!(calc.raw_score(3.0), 4.0);
    }

    #[test]
    fn test_raw_score_is_quadratic() {
        let calc = calculator();
        assert_eq!(calc.raw_score(5.0), 16.0);
        assert_eq!(calc.raw_score(10.0), 81.0);
    }

    #[test]
    fn test_decay_halves_each_halflife() {
        let h = HALFLIFE as f64;
        assert_eq!(ScoreCalculator::decay(81.0, 0.0, h), 81.0);
        assert_eq!(ScoreCalculator::decay(81.0, h, h), 40.5);
        assert_eq!(ScoreCalculator::decay(10.0, 60.0, 60.0), 5.0);
    }

    #[test]
    fn test_decay_strictly_decreasing_in_age() {
        let h = HALFLIFE as f64;
        let mut previous = ScoreCalculator::decay(81.0, 0.0, h);
        for age in (1..48).map(|hours| hours as f64 * 3600.0) {
            let current = ScoreCalculator::decay(81.0, age, h);
            assert!(current < previous);
            previous = current;
        }
    }

    #[test]
    fn test_decayed_score_scenario() {
        let calc = calculator();
        let t0 = Utc::now();
        let item = status(t0, 4, 6);

        assert_eq!(calc.decayed_score(&item, t0), 81.0);
        assert_eq!(calc.decayed_score(&item, t0 + Duration::hours(8)), 40.5);
        assert_eq!(calc.decayed_score(&item, t0 + Duration::hours(16)), 20.25);
    }

    #[test]
    fn test_low_engagement_scores_zero_at_any_age() {
        let calc = calculator();
        let t0 = Utc::now();
        let item = status(t0, 1, 2);
        assert_eq!(calc.decayed_score(&item, t0), 0.0);
        assert_eq!(calc.decayed_score(&item, t0 + Duration::days(3)), 0.0);
    }

    #[tokio::test]
    async fn test_score_at_rank() {
        let store = MemoryTrendStore::new(UsedBuckets::new(3600, 3600));
        assert_eq!(score_at_rank(&store, RankedView::All, 2).await.unwrap(), 0.0);

        for (id, score) in [(1, 90.0), (2, 70.0), (3, 50.0), (4, 10.0)] {
            store.upsert(RankedView::All, id, score).await.unwrap();
        }
        assert_eq!(score_at_rank(&store, RankedView::All, 0).await.unwrap(), 90.0);
        assert_eq!(score_at_rank(&store, RankedView::All, 2).await.unwrap(), 50.0);
        assert_eq!(score_at_rank(&store, RankedView::All, 10).await.unwrap(), 10.0);
    }
}
