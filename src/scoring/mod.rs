//! The scoring model.
//!
//! Every derived value shown on the dashboard or fed into an insight prompt
//! comes from here: perception gaps, rounded averages, qualitative bands and
//! gap ranking. Views and the prompt builder never recompute these on their
//! own.

pub mod bands;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use bands::{gap_band, is_significant_gap, score_band, GapBand, ScoreBand, Tone};

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("score {0} is outside the range 0..=100")]
    OutOfRange(i64),
    #[error("dimension sequence is empty")]
    EmptyDimensions,
}

// ── Score ──────────────────────────────────────────────────────────

/// A single partner's score, guaranteed to lie in `0..=100`.
///
/// Deserializes from any JSON integer and rejects values outside the range,
/// so an out-of-range score never reaches the functions below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MAX: Score = Score(100);

    pub fn new(value: i64) -> Result<Self, ScoreError> {
        if (0..=i64::from(Self::MAX.0)).contains(&value) {
            Ok(Score(value as u8))
        } else {
            Err(ScoreError::OutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ScoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ── Pairwise operations ────────────────────────────────────────────

/// Absolute difference between two scores.
pub fn gap(a: Score, b: Score) -> u8 {
    a.0.abs_diff(b.0)
}

/// Mean of two scores, rounded half up (76.5 -> 77).
pub fn average(a: Score, b: Score) -> Score {
    let sum = u16::from(a.0) + u16::from(b.0);
    Score(((sum + 1) / 2) as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    UserHigher,
    PartnerHigher,
    Equal,
}

/// Which partner rated the area higher.
pub fn trend(user: Score, partner: Score) -> Trend {
    match user.cmp(&partner) {
        std::cmp::Ordering::Greater => Trend::UserHigher,
        std::cmp::Ordering::Less => Trend::PartnerHigher,
        std::cmp::Ordering::Equal => Trend::Equal,
    }
}

/// Anything scored by both partners: dimensions and sub-dimensions.
pub trait PairedScores {
    fn user_score(&self) -> Score;
    fn partner_score(&self) -> Score;

    fn perception_gap(&self) -> u8 {
        gap(self.user_score(), self.partner_score())
    }

    fn average_score(&self) -> Score {
        average(self.user_score(), self.partner_score())
    }

    fn has_significant_gap(&self) -> bool {
        is_significant_gap(self.perception_gap())
    }
}

// ── Sequence operations ────────────────────────────────────────────

/// The entry with the largest perception gap. On ties the earliest entry wins.
pub fn biggest_gap<T: PairedScores>(items: &[T]) -> Result<&T, ScoreError> {
    let mut iter = items.iter();
    let mut best = iter.next().ok_or(ScoreError::EmptyDimensions)?;
    for item in iter {
        if item.perception_gap() > best.perception_gap() {
            best = item;
        }
    }
    Ok(best)
}

/// All entries ordered by descending gap. Equal gaps keep their input order.
pub fn rank_by_gap<T: PairedScores>(items: &[T]) -> Result<Vec<&T>, ScoreError> {
    if items.is_empty() {
        return Err(ScoreError::EmptyDimensions);
    }
    let mut ranked: Vec<&T> = items.iter().collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.perception_gap().cmp(&a.perception_gap()));
    Ok(ranked)
}

/// Number of entries whose gap is at least [`bands::SIGNIFICANT_GAP`].
pub fn count_significant_gaps<T: PairedScores>(items: &[T]) -> usize {
    items.iter().filter(|item| item.has_significant_gap()).count()
}

/// Each partner's mean score across a sequence, rounded half up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartnerMeans {
    pub user: Score,
    pub partner: Score,
}

pub fn partner_means<T: PairedScores>(items: &[T]) -> Result<PartnerMeans, ScoreError> {
    if items.is_empty() {
        return Err(ScoreError::EmptyDimensions);
    }
    let n = items.len() as u64;
    let rounded_mean = |sum: u64| Score((((2 * sum) + n) / (2 * n)) as u8);
    let user_sum: u64 = items.iter().map(|i| u64::from(i.user_score().0)).sum();
    let partner_sum: u64 = items.iter().map(|i| u64::from(i.partner_score().0)).sum();
    Ok(PartnerMeans {
        user: rounded_mean(user_sum),
        partner: rounded_mean(partner_sum),
    })
}

/// A dimension is weak, and its warning text shown, while its average is
/// below the strong band.
pub fn needs_warning<T: PairedScores>(item: &T) -> bool {
    score_band(item.average_score()) != ScoreBand::Strong
}

/// The overall score is worth celebrating once it reaches the strong band.
pub fn is_celebration(overall: Score) -> bool {
    score_band(overall) == ScoreBand::Strong
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Entry {
        id: char,
        user: Score,
        partner: Score,
    }

    impl PairedScores for Entry {
        fn user_score(&self) -> Score {
            self.user
        }
        fn partner_score(&self) -> Score {
            self.partner
        }
    }

    fn s(v: i64) -> Score {
        Score::new(v).unwrap()
    }

    fn entry(id: char, user: i64, partner: i64) -> Entry {
        Entry {
            id,
            user: s(user),
            partner: s(partner),
        }
    }

    /// Gaps A=5, B=20, C=20, D=3.
    fn tied_entries() -> Vec<Entry> {
        vec![
            entry('A', 50, 55),
            entry('B', 80, 60),
            entry('C', 40, 60),
            entry('D', 70, 73),
        ]
    }

    #[test]
    fn score_rejects_out_of_range() {
        assert_eq!(Score::new(101), Err(ScoreError::OutOfRange(101)));
        assert_eq!(Score::new(-1), Err(ScoreError::OutOfRange(-1)));
        assert_eq!(Score::new(100).unwrap().value(), 100);
        assert_eq!(Score::new(0).unwrap().value(), 0);
    }

    #[test]
    fn score_deserialization_validates() {
        let ok: Score = serde_json::from_str("42").unwrap();
        assert_eq!(ok.value(), 42);
        assert!(serde_json::from_str::<Score>("101").is_err());
        assert!(serde_json::from_str::<Score>("-3").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "42");
    }

    #[test]
    fn gap_is_symmetric_and_total() {
        for a in (0..=100).step_by(7) {
            for b in (0..=100).step_by(11) {
                assert_eq!(gap(s(a), s(b)), gap(s(b), s(a)));
            }
            assert_eq!(gap(s(a), s(a)), 0);
        }
        assert_eq!(gap(s(0), s(100)), 100);
    }

    #[test]
    fn average_stays_between_inputs() {
        for a in 0..=100 {
            for b in (0..=100).step_by(3) {
                let avg = average(s(a), s(b)).value() as i64;
                assert!(avg >= a.min(b) && avg <= a.max(b), "avg({a},{b}) = {avg}");
            }
        }
    }

    #[test]
    fn average_rounds_half_up() {
        assert_eq!(average(s(78), s(75)).value(), 77);
        assert_eq!(average(s(71), s(74)).value(), 73);
        assert_eq!(average(s(58), s(78)).value(), 68);
        assert_eq!(average(s(0), s(1)).value(), 1);
        assert_eq!(average(s(100), s(100)).value(), 100);
    }

    #[test]
    fn trend_reports_higher_partner() {
        assert_eq!(trend(s(82), s(68)), Trend::UserHigher);
        assert_eq!(trend(s(58), s(78)), Trend::PartnerHigher);
        assert_eq!(trend(s(50), s(50)), Trend::Equal);
    }

    #[test]
    fn biggest_gap_prefers_first_of_tie() {
        let entries = tied_entries();
        assert_eq!(biggest_gap(&entries).unwrap().id, 'B');
    }

    #[test]
    fn rank_by_gap_is_stable() {
        let entries = tied_entries();
        let order: Vec<char> = rank_by_gap(&entries).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(order, vec!['B', 'C', 'A', 'D']);
    }

    #[test]
    fn empty_sequences_are_rejected() {
        let empty: Vec<Entry> = Vec::new();
        assert_eq!(biggest_gap(&empty).unwrap_err(), ScoreError::EmptyDimensions);
        assert_eq!(rank_by_gap(&empty).unwrap_err(), ScoreError::EmptyDimensions);
        assert_eq!(partner_means(&empty).unwrap_err(), ScoreError::EmptyDimensions);
        assert_eq!(count_significant_gaps(&empty), 0);
    }

    #[test]
    fn counts_gaps_of_ten_or_more() {
        let entries = vec![entry('A', 50, 60), entry('B', 50, 59), entry('C', 90, 70)];
        assert_eq!(count_significant_gaps(&entries), 2);
    }

    #[test]
    fn partner_means_round_half_up() {
        let entries = vec![entry('A', 70, 61), entry('B', 71, 60)];
        let means = partner_means(&entries).unwrap();
        assert_eq!(means.user.value(), 71); // 70.5
        assert_eq!(means.partner.value(), 61); // 60.5
    }

    #[test]
    fn warning_and_celebration_follow_strong_band() {
        assert!(needs_warning(&entry('A', 58, 78))); // avg 68
        assert!(!needs_warning(&entry('B', 69, 70))); // avg 70 (69.5 rounds up)
        assert!(is_celebration(s(72)));
        assert!(!is_celebration(s(69)));
    }
}
