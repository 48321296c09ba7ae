use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use whole_relationship::assessment::data::sample_assessment;
use whole_relationship::config::Config;
use whole_relationship::dashboard::DashboardView;
use whole_relationship::insight::InsightService;
use whole_relationship::network::http_api::{self, ApiState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let assessment = sample_assessment().context("assessment data failed validation")?;
    let dashboard = DashboardView::build(&assessment)?;
    info!(
        "Assessment loaded: overall {}, biggest gap in dimension {}, {} significant gaps",
        dashboard.overall_score, dashboard.highlight, dashboard.significant_gap_count,
    );

    let service = InsightService::new(config.insight.clone()).context("failed to build HTTP client")?;
    let state = Arc::new(ApiState {
        dashboard,
        generator: Arc::new(service),
    });

    let listener = http_api::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP API on {}", config.bind_addr))?;
    http_api::serve(listener, state).await;
    Ok(())
}
