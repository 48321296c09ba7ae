use chrono::NaiveDate;

use super::{AssessmentError, AssessmentResult, CoupleNames, Dimension, SubDimension};
use crate::scoring::Score;

// ── Static definitions ─────────────────────────────────────────────

struct SubDimensionDef {
    name: &'static str,
    icon: &'static str,
    user: i64,
    partner: i64,
}

struct DimensionDef {
    id: u32,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    user: i64,
    partner: i64,
    warning: &'static str,
    subs: &'static [SubDimensionDef],
}

const OVERALL_SCORE: i64 = 72;
const ASSESSMENT_DATE: &str = "2026-01-15";

const fn sub(name: &'static str, icon: &'static str, user: i64, partner: i64) -> SubDimensionDef {
    SubDimensionDef {
        name,
        icon,
        user,
        partner,
    }
}

static DIMENSIONS: &[DimensionDef] = &[
    DimensionDef {
        id: 1,
        name: "Foundation",
        description: "Individual Wholeness",
        icon: "💕",
        user: 78,
        partner: 75,
        warning: "When foundation cracks: codependency, controlling behavior, emotional dysregulation. This layer must be addressed first.",
        subs: &[
            sub("Self-Regulation", "🧘", 80, 72),
            sub("Self-Worth & Security", "💎", 75, 78),
            sub("Personal Responsibility", "✅", 82, 74),
            sub("Health & Wellbeing", "🏥", 75, 76),
        ],
    },
    DimensionDef {
        id: 2,
        name: "Connection",
        description: "How Partners Relate",
        icon: "💬",
        user: 82,
        partner: 68,
        warning: "When connection breaks: feeling like roommates, lonely together, constant conflict, contempt.",
        subs: &[
            sub("Communication", "🗣️", 85, 65),
            sub("Emotional Intimacy", "❤️", 80, 70),
            sub("Physical Intimacy", "🔥", 81, 69),
        ],
    },
    DimensionDef {
        id: 3,
        name: "Operations",
        description: "Daily Partnership",
        icon: "⚙️",
        user: 71,
        partner: 74,
        warning: "When operations fail: resentment over inequality, 'I do everything,' financial conflicts.",
        subs: &[
            sub("Domestic Systems", "🏠", 68, 76),
            sub("Financial Systems", "💰", 72, 71),
            sub("Time Allocation", "⏰", 73, 75),
        ],
    },
    DimensionDef {
        id: 4,
        name: "Boundary",
        description: "Internal & External",
        icon: "🛡️",
        user: 58,
        partner: 78,
        warning: "When boundaries fail: intrusive in-laws, suffocation, parallel lives, external validation seeking.",
        subs: &[
            sub("Internal Boundaries", "🔒", 55, 80),
            sub("External Boundaries", "🌍", 61, 76),
        ],
    },
    DimensionDef {
        id: 5,
        name: "Alignment",
        description: "Shared Direction",
        icon: "🎯",
        user: 75,
        partner: 68,
        warning: "When alignment breaks: 'We want different things,' growing apart, fundamental incompatibilities.",
        subs: &[
            sub("Values Alignment", "⚖️", 78, 70),
            sub("Life Stage Transitions", "🔄", 72, 65),
            sub("Growth Trajectories", "📈", 75, 69),
        ],
    },
    DimensionDef {
        id: 6,
        name: "Repair",
        description: "Recovery Systems",
        icon: "🔧",
        user: 52,
        partner: 61,
        warning: "When repair fails: can't get past infidelity, bringing up old issues, resentment calcification.",
        subs: &[
            sub("Trust & Repair", "🤝", 50, 58),
            sub("Resilience Through Adversity", "💪", 54, 64),
        ],
    },
    DimensionDef {
        id: 7,
        name: "Meta",
        description: "The Relationship About the Relationship",
        icon: "🔮",
        user: 85,
        partner: 82,
        warning: "When meta fails: one person checked out, contempt, power imbalances, feeling unappreciated.",
        subs: &[
            sub("Commitment & Investment", "💍", 88, 85),
            sub("Power Dynamics", "⚖️", 82, 80),
            sub("Appreciation & Positivity", "✨", 85, 81),
        ],
    },
];

// ── Construction ───────────────────────────────────────────────────

fn build_dimension(def: &DimensionDef) -> Result<Dimension, AssessmentError> {
    let sub_dimensions = def
        .subs
        .iter()
        .map(|s| {
            Ok(SubDimension {
                name: s.name.to_string(),
                icon: s.icon.to_string(),
                user_score: Score::new(s.user)?,
                partner_score: Score::new(s.partner)?,
            })
        })
        .collect::<Result<Vec<_>, AssessmentError>>()?;

    Ok(Dimension {
        id: def.id,
        name: def.name.to_string(),
        description: def.description.to_string(),
        icon: def.icon.to_string(),
        user_score: Score::new(def.user)?,
        partner_score: Score::new(def.partner)?,
        warning_text: def.warning.to_string(),
        sub_dimensions,
    })
}

/// The compiled-in assessment the dashboard displays.
///
/// Validated on every call; the server builds it once at startup and refuses
/// to start if it is inconsistent.
pub fn sample_assessment() -> Result<AssessmentResult, AssessmentError> {
    let dimensions = DIMENSIONS
        .iter()
        .map(build_dimension)
        .collect::<Result<Vec<_>, _>>()?;

    let date = NaiveDate::parse_from_str(ASSESSMENT_DATE, "%Y-%m-%d")
        .map_err(|_| AssessmentError::InvalidDate(ASSESSMENT_DATE.to_string()))?;

    AssessmentResult::new(
        Score::new(OVERALL_SCORE)?,
        date,
        CoupleNames {
            user: "You".to_string(),
            partner: "Partner".to_string(),
        },
        dimensions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{biggest_gap, count_significant_gaps, rank_by_gap, PairedScores};

    #[test]
    fn sample_is_valid() {
        let assessment = sample_assessment().unwrap();
        assert_eq!(assessment.dimensions().len(), 7);
        assert_eq!(assessment.overall_score().value(), 72);
    }

    #[test]
    fn boundary_has_the_biggest_gap() {
        let assessment = sample_assessment().unwrap();
        let boundary = assessment.dimension(4).unwrap();
        let connection = assessment.dimension(2).unwrap();
        assert_eq!(boundary.perception_gap(), 20);
        assert_eq!(connection.perception_gap(), 14);
        assert_eq!(biggest_gap(assessment.dimensions()).unwrap().name, "Boundary");
    }

    #[test]
    fn two_dimensions_have_significant_gaps() {
        // Connection (14) and Boundary (20); Repair tops out at 9.
        let assessment = sample_assessment().unwrap();
        assert_eq!(count_significant_gaps(assessment.dimensions()), 2);
    }

    #[test]
    fn ranking_keeps_authored_order_for_ties() {
        let assessment = sample_assessment().unwrap();
        let names: Vec<&str> = rank_by_gap(assessment.dimensions())
            .unwrap()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Boundary", "Connection", "Repair", "Alignment", "Foundation", "Operations", "Meta"]
        );
    }
}
