//! Scoring model and insight service for the Whole Relationship assessment
//! dashboard.

pub mod assessment;
pub mod config;
pub mod dashboard;
pub mod insight;
pub mod network;
pub mod protocol;
pub mod scoring;
