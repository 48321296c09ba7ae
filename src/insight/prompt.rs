use std::fmt::Write;

use crate::assessment::Dimension;
use crate::scoring::{PairedScores, Score};

/// Background on the seven-dimension model, sent with every request.
const FRAMEWORK_CONTEXT: &str = r#"
# The Whole Relationship Model

The Whole Relationship Model assesses relationship health across seven dimensions. They are hierarchical: Foundation supports everything above it.

## Dimensions, from the ground up

1. Foundation (Individual Wholeness). Each partner's own regulation, self-worth, responsibility and wellbeing. When it cracks, personal struggles overflow into the relationship and become shared burdens.
2. Connection (How Partners Relate). Communication, emotional and physical intimacy. When it fails, partners feel like roommates and conversations turn transactional.
3. Operations (Daily Partnership). Domestic systems, finances, time. When it fails, chores and money become a constant source of friction.
4. Boundary (Internal and External). Personal space, family, work and outside pressures. When it fails, the couple becomes enmeshed or drifts into parallel lives.
5. Alignment (Shared Direction). Values, life stages, growth. When it fails, partners pull in different directions and grow apart.
6. Repair (Recovery Systems). Trust, forgiveness, resilience. When it fails, small hurts harden into lasting resentment.
7. Meta (The Relationship About the Relationship). Commitment, power dynamics, appreciation. When it fails, the couple stops reflecting and repeats the same cycles.

## Scores

- 70-100: Strong. A relationship strength.
- 40-69: Developing. Room to grow, not critical.
- 0-39: Needs Attention. A priority for focused work.

## Perception gaps

When partners score the same area differently, the difference is a perception gap. Gaps of 10 or more points mean the partners experience that area quite differently, which is itself worth talking about.
"#;

/// One summary line per dimension: both scores, gap and average.
fn dimension_summary(dimensions: &[Dimension]) -> String {
    let mut out = String::new();
    for d in dimensions {
        let _ = writeln!(
            out,
            "- {}: You={}, Partner={}, Gap={}, Avg={}",
            d.name,
            d.user_score,
            d.partner_score,
            d.perception_gap(),
            d.average_score(),
        );
    }
    out
}

fn sub_dimension_summary(dimension: &Dimension) -> String {
    let mut out = String::new();
    for s in &dimension.sub_dimensions {
        let _ = writeln!(
            out,
            "- {}: You={}, Partner={}, Gap={}",
            s.name,
            s.user_score,
            s.partner_score,
            s.perception_gap(),
        );
    }
    if out.is_empty() {
        out.push_str("- (no sub-dimensions recorded)\n");
    }
    out
}

/// Build the coaching prompt for one focus dimension.
pub fn build_prompt(focus: &Dimension, all: &[Dimension], overall: Score) -> String {
    let gap = focus.perception_gap();
    let average = focus.average_score();

    format!(
        r#"You are a compassionate relationship coach writing a short insight from a Whole Relationship Model assessment.
{context}
## Current assessment

**Overall relationship score:** {overall}/100

**All dimension scores:**
{summary}
**Focus dimension: {name}** ({description})
- Your score: {user}
- Partner's score: {partner}
- Perception gap: {gap} points
- Average score: {average}

**Sub-dimensions of {name}:**
{subs}
## Task

Write a personalized, supportive insight about the "{name}" dimension that:

1. Acknowledges the {gap}-point perception gap between the partners without judgment.
2. Names the sub-dimension with the largest gap and why it matters.
3. Offers one concrete suggestion for starting a conversation about this area.
4. Frames everything positively; awareness is where growth starts.
5. Stays warm; this is sensitive personal data.

Tone: a wise friend who happens to be a relationship therapist. Never preachy or clinical.
Length: 2-3 short paragraphs, roughly 100-150 words.
Write flowing prose with no bullet points or numbered lists. Do not start with "I" and do not mention being an AI."#,
        context = FRAMEWORK_CONTEXT,
        overall = overall,
        summary = dimension_summary(all),
        name = focus.name,
        description = focus.description,
        user = focus.user_score,
        partner = focus.partner_score,
        gap = gap,
        average = average,
        subs = sub_dimension_summary(focus),
    )
}
