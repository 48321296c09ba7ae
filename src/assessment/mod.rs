pub mod data;

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scoring::{PairedScores, Score, ScoreError};

pub type DimensionId = u32;

// ── Dimension kinds ────────────────────────────────────────────────

/// The seven dimensions of the model, in their hierarchical order.
/// Foundation underpins everything above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionKind {
    Foundation,
    Connection,
    Operations,
    Boundary,
    Alignment,
    Repair,
    Meta,
}

impl DimensionKind {
    pub const ALL: [DimensionKind; 7] = [
        DimensionKind::Foundation,
        DimensionKind::Connection,
        DimensionKind::Operations,
        DimensionKind::Boundary,
        DimensionKind::Alignment,
        DimensionKind::Repair,
        DimensionKind::Meta,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DimensionKind::Foundation => "Foundation",
            DimensionKind::Connection => "Connection",
            DimensionKind::Operations => "Operations",
            DimensionKind::Boundary => "Boundary",
            DimensionKind::Alignment => "Alignment",
            DimensionKind::Repair => "Repair",
            DimensionKind::Meta => "Meta",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

// ── Entities ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubDimension {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub user_score: Score,
    pub partner_score: Score,
}

/// One of the seven assessed areas.
///
/// `user_score` and `partner_score` are authored alongside the
/// sub-dimension scores, not rolled up from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub id: DimensionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub user_score: Score,
    pub partner_score: Score,
    #[serde(default)]
    pub warning_text: String,
    #[serde(default)]
    pub sub_dimensions: Vec<SubDimension>,
}

impl Dimension {
    pub fn kind(&self) -> Option<DimensionKind> {
        DimensionKind::from_name(&self.name)
    }
}

impl PairedScores for SubDimension {
    fn user_score(&self) -> Score {
        self.user_score
    }
    fn partner_score(&self) -> Score {
        self.partner_score
    }
}

impl PairedScores for Dimension {
    fn user_score(&self) -> Score {
        self.user_score
    }
    fn partner_score(&self) -> Score {
        self.partner_score
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoupleNames {
    pub user: String,
    pub partner: String,
}

/// A complete assessment. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    overall_score: Score,
    assessment_date: NaiveDate,
    couple_names: CoupleNames,
    dimensions: Vec<Dimension>,
}

// ── Validation ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error("expected {expected} dimensions, found {found}")]
    DimensionCount { expected: usize, found: usize },
    #[error("dimension #{position} should be {expected}, found {found:?}")]
    DimensionOrder {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("duplicate dimension id {0}")]
    DuplicateId(DimensionId),
    #[error("duplicate sub-dimension {sub:?} in {dimension}")]
    DuplicateSubDimension { dimension: String, sub: String },
    #[error("invalid assessment date {0:?}")]
    InvalidDate(String),
}

impl AssessmentResult {
    /// Build an assessment, checking the seven-dimension structure.
    ///
    /// The overall score is stored as given; it is not derived from the
    /// dimension scores.
    pub fn new(
        overall_score: Score,
        assessment_date: NaiveDate,
        couple_names: CoupleNames,
        dimensions: Vec<Dimension>,
    ) -> Result<Self, AssessmentError> {
        validate_dimensions(&dimensions)?;
        Ok(Self {
            overall_score,
            assessment_date,
            couple_names,
            dimensions,
        })
    }

    pub fn overall_score(&self) -> Score {
        self.overall_score
    }

    pub fn max_score(&self) -> Score {
        Score::MAX
    }

    pub fn assessment_date(&self) -> NaiveDate {
        self.assessment_date
    }

    pub fn couple_names(&self) -> &CoupleNames {
        &self.couple_names
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, id: DimensionId) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.id == id)
    }

    /// "January 15, 2026"
    pub fn formatted_date(&self) -> String {
        self.assessment_date.format("%B %-d, %Y").to_string()
    }
}

/// Checks count, canonical order, unique ids and unique sub-dimension names.
pub fn validate_dimensions(dimensions: &[Dimension]) -> Result<(), AssessmentError> {
    if dimensions.len() != DimensionKind::ALL.len() {
        return Err(AssessmentError::DimensionCount {
            expected: DimensionKind::ALL.len(),
            found: dimensions.len(),
        });
    }

    let mut ids = HashSet::new();
    for (position, (dimension, expected)) in dimensions.iter().zip(DimensionKind::ALL).enumerate() {
        if dimension.name != expected.name() {
            return Err(AssessmentError::DimensionOrder {
                position: position + 1,
                expected: expected.name(),
                found: dimension.name.clone(),
            });
        }
        if !ids.insert(dimension.id) {
            return Err(AssessmentError::DuplicateId(dimension.id));
        }

        let mut names = HashSet::new();
        for sub in &dimension.sub_dimensions {
            if !names.insert(sub.name.as_str()) {
                return Err(AssessmentError::DuplicateSubDimension {
                    dimension: dimension.name.clone(),
                    sub: sub.name.clone(),
                });
            }
        }
    }
    Ok(())
}
