use chrono::NaiveDate;
use serde::Serialize;

use crate::assessment::{AssessmentResult, CoupleNames, Dimension, DimensionId, SubDimension};
use crate::scoring::{
    self, gap_band, score_band, GapBand, PairedScores, PartnerMeans, Score, ScoreBand, ScoreError,
    Trend,
};

// ── Views ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubDimensionView {
    pub name: String,
    pub icon: String,
    pub user_score: Score,
    pub partner_score: Score,
    pub gap: u8,
    pub average: Score,
    pub average_band: ScoreBand,
    pub gap_band: GapBand,
    pub significant_gap: bool,
    pub trend: Trend,
}

impl SubDimensionView {
    fn build(sub: &SubDimension) -> Self {
        let average = sub.average_score();
        Self {
            name: sub.name.clone(),
            icon: sub.icon.clone(),
            user_score: sub.user_score,
            partner_score: sub.partner_score,
            gap: sub.perception_gap(),
            average,
            average_band: score_band(average),
            gap_band: gap_band(sub.perception_gap()),
            significant_gap: sub.has_significant_gap(),
            trend: scoring::trend(sub.user_score, sub.partner_score),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionView {
    pub id: DimensionId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub user_score: Score,
    pub partner_score: Score,
    pub gap: u8,
    pub average: Score,
    pub user_band: ScoreBand,
    pub partner_band: ScoreBand,
    pub average_band: ScoreBand,
    pub gap_band: GapBand,
    pub significant_gap: bool,
    pub trend: Trend,
    /// Present only while the dimension is weak.
    pub warning: Option<String>,
    /// Name of the sub-dimension where the partners disagree most.
    pub largest_sub_gap: Option<String>,
    pub sub_dimensions: Vec<SubDimensionView>,
}

impl DimensionView {
    fn build(dimension: &Dimension) -> Self {
        let average = dimension.average_score();
        let gap = dimension.perception_gap();
        let warning = (scoring::needs_warning(dimension) && !dimension.warning_text.is_empty())
            .then(|| dimension.warning_text.clone());
        let largest_sub_gap = scoring::biggest_gap(&dimension.sub_dimensions)
            .ok()
            .map(|sub| sub.name.clone());

        Self {
            id: dimension.id,
            name: dimension.name.clone(),
            description: dimension.description.clone(),
            icon: dimension.icon.clone(),
            user_score: dimension.user_score,
            partner_score: dimension.partner_score,
            gap,
            average,
            user_band: score_band(dimension.user_score),
            partner_band: score_band(dimension.partner_score),
            average_band: score_band(average),
            gap_band: gap_band(gap),
            significant_gap: dimension.has_significant_gap(),
            trend: scoring::trend(dimension.user_score, dimension.partner_score),
            warning,
            largest_sub_gap,
            sub_dimensions: dimension.sub_dimensions.iter().map(SubDimensionView::build).collect(),
        }
    }
}

/// Everything the dashboard renders, derived once from an assessment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub overall_score: Score,
    pub max_score: Score,
    pub overall_band: ScoreBand,
    pub celebrate: bool,
    pub assessment_date: NaiveDate,
    pub assessment_date_label: String,
    pub couple_names: CoupleNames,
    pub partner_means: PartnerMeans,
    /// Dimension with the biggest perception gap.
    pub highlight: DimensionId,
    /// Dimension ids by descending gap.
    pub ranking: Vec<DimensionId>,
    pub significant_gap_count: usize,
    pub dimensions: Vec<DimensionView>,
}

impl DashboardView {
    pub fn build(assessment: &AssessmentResult) -> Result<Self, ScoreError> {
        let dimensions = assessment.dimensions();
        let highlight = scoring::biggest_gap(dimensions)?.id;
        let ranking = scoring::rank_by_gap(dimensions)?
            .into_iter()
            .map(|d| d.id)
            .collect();
        let overall = assessment.overall_score();

        Ok(Self {
            overall_score: overall,
            max_score: assessment.max_score(),
            overall_band: score_band(overall),
            celebrate: scoring::is_celebration(overall),
            assessment_date: assessment.assessment_date(),
            assessment_date_label: assessment.formatted_date(),
            couple_names: assessment.couple_names().clone(),
            partner_means: scoring::partner_means(dimensions)?,
            highlight,
            ranking,
            significant_gap_count: scoring::count_significant_gaps(dimensions),
            dimensions: dimensions.iter().map(DimensionView::build).collect(),
        })
    }

    pub fn dimension(&self, id: DimensionId) -> Option<&DimensionView> {
        self.dimensions.iter().find(|d| d.id == id)
    }

    pub fn highlighted(&self) -> Option<&DimensionView> {
        self.dimension(self.highlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::data::sample_assessment;

    fn view() -> DashboardView {
        DashboardView::build(&sample_assessment().unwrap()).unwrap()
    }

    #[test]
    fn highlights_boundary() {
        let view = view();
        assert_eq!(view.highlight, 4);
        let boundary = view.highlighted().unwrap();
        assert_eq!(boundary.name, "Boundary");
        assert_eq!(boundary.gap, 20);
        assert_eq!(boundary.gap_band, GapBand::Significant);
        assert_eq!(boundary.trend, Trend::PartnerHigher);
        assert_eq!(boundary.largest_sub_gap.as_deref(), Some("Internal Boundaries"));
    }

    #[test]
    fn aggregates_match_hand_computed_values() {
        let view = view();
        assert_eq!(view.significant_gap_count, 2);
        assert_eq!(view.ranking, vec![4, 2, 6, 5, 1, 3, 7]);
        // user 501 / 7 = 71.6, partner 506 / 7 = 72.3
        assert_eq!(view.partner_means.user.value(), 72);
        assert_eq!(view.partner_means.partner.value(), 72);
        assert_eq!(view.overall_band, ScoreBand::Strong);
        assert!(view.celebrate);
        assert_eq!(view.assessment_date_label, "January 15, 2026");
    }

    #[test]
    fn warnings_only_on_weak_dimensions() {
        let view = view();
        let warned: Vec<&str> = view
            .dimensions
            .iter()
            .filter(|d| d.warning.is_some())
            .map(|d| d.name.as_str())
            .collect();
        // Boundary averages 68, Repair 57; every other dimension is strong.
        assert_eq!(warned, vec!["Boundary", "Repair"]);
    }

    #[test]
    fn connection_is_significant_but_notable_sub_dimensions_stay_notable() {
        let view = view();
        let connection = view.dimension(2).unwrap();
        assert!(connection.significant_gap);
        assert_eq!(connection.gap_band, GapBand::Significant);
        let intimacy = &connection.sub_dimensions[1];
        assert_eq!(intimacy.name, "Emotional Intimacy");
        assert_eq!(intimacy.gap, 10);
        assert!(intimacy.significant_gap);
        assert_eq!(intimacy.gap_band, GapBand::Notable);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(view()).unwrap();
        assert_eq!(json["significantGapCount"], 2);
        assert_eq!(json["highlight"], 4);
        assert_eq!(json["assessmentDate"], "2026-01-15");
        assert_eq!(json["dimensions"][3]["gapBand"], "significant");
        assert_eq!(json["dimensions"][5]["averageBand"], "developing");
    }
}
