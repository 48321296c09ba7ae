use serde::Serialize;

use super::Score;

// ── Canonical thresholds ───────────────────────────────────────────

/// Lowest score that counts as a relationship strength.
pub const STRONG_THRESHOLD: u8 = 70;
/// Lowest score that is still "developing" rather than a priority area.
pub const DEVELOPING_THRESHOLD: u8 = 40;

/// Largest gap at which partners are considered aligned.
pub const ALIGNED_MAX_GAP: u8 = 5;
/// Largest gap still reported as "notable" rather than "significant".
pub const NOTABLE_MAX_GAP: u8 = 10;

/// Gap at or above which a dimension counts towards the
/// "significant perception gaps" aggregate.
pub const SIGNIFICANT_GAP: u8 = 10;

// ── Tone ───────────────────────────────────────────────────────────

/// Semantic colour category. Views map these to concrete colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tone {
    Positive,
    Caution,
    Critical,
}

// ── Score bands ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreBand {
    Strong,
    Developing,
    NeedsAttention,
}

impl ScoreBand {
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Strong => "Strong",
            ScoreBand::Developing => "Developing",
            ScoreBand::NeedsAttention => "Needs Attention",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            ScoreBand::Strong => Tone::Positive,
            ScoreBand::Developing => Tone::Caution,
            ScoreBand::NeedsAttention => Tone::Critical,
        }
    }
}

/// Classify a score: `>= 70` strong, `40..70` developing, below 40 needs attention.
pub fn score_band(score: Score) -> ScoreBand {
    let value = score.value();
    if value >= STRONG_THRESHOLD {
        ScoreBand::Strong
    } else if value >= DEVELOPING_THRESHOLD {
        ScoreBand::Developing
    } else {
        ScoreBand::NeedsAttention
    }
}

// ── Gap bands ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GapBand {
    Aligned,
    Notable,
    Significant,
}

impl GapBand {
    pub fn label(self) -> &'static str {
        match self {
            GapBand::Aligned => "Aligned",
            GapBand::Notable => "Notable",
            GapBand::Significant => "Significant",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            GapBand::Aligned => Tone::Positive,
            GapBand::Notable => Tone::Caution,
            GapBand::Significant => Tone::Critical,
        }
    }
}

/// Classify a perception gap: `<= 5` aligned, `6..=10` notable, above 10 significant.
pub fn gap_band(gap: u8) -> GapBand {
    if gap <= ALIGNED_MAX_GAP {
        GapBand::Aligned
    } else if gap <= NOTABLE_MAX_GAP {
        GapBand::Notable
    } else {
        GapBand::Significant
    }
}

/// True when the gap is large enough to count as a significant perception gap.
///
/// Note this is `>= 10`, one point looser than [`GapBand::Significant`].
pub fn is_significant_gap(gap: u8) -> bool {
    gap >= SIGNIFICANT_GAP
}
