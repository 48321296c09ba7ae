use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use super::{InsightError, InsightGenerator};
use crate::assessment::{Dimension, DimensionId};
use crate::scoring::Score;

/// What the insight dialog shows for the selected dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightState {
    Idle,
    Loading,
    Ready(String),
    /// Generation failed; the message is for logs, the view offers a retry.
    Unavailable(String),
}

/// A finished request, tagged with the dispatch that started it.
struct Completion {
    generation: u64,
    dimension_id: DimensionId,
    result: Result<String, InsightError>,
}

/// Insight state for one dialog.
///
/// Each request runs on its own task and is tagged with a dispatch
/// generation. Only the completion of the latest dispatch is applied, so a
/// slow response for a previous selection can never show up under a new one,
/// even when the same dimension has been selected again since.
pub struct InsightSession {
    generator: Arc<dyn InsightGenerator>,
    all_dimensions: Arc<Vec<Dimension>>,
    overall: Score,
    selected: Option<Dimension>,
    state: InsightState,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    generation: u64,
}

impl InsightSession {
    pub fn new(
        generator: Arc<dyn InsightGenerator>,
        all_dimensions: Arc<Vec<Dimension>>,
        overall: Score,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            generator,
            all_dimensions,
            overall,
            selected: None,
            state: InsightState::Idle,
            completion_tx,
            completion_rx,
            in_flight: 0,
            generation: 0,
        }
    }

    pub fn state(&self) -> &InsightState {
        &self.state
    }

    pub fn selected_id(&self) -> Option<DimensionId> {
        self.selected.as_ref().map(|d| d.id)
    }

    /// Focus a dimension and start fetching its insight.
    ///
    /// Re-selecting the current dimension while it is loading or already
    /// loaded does nothing.
    pub fn select(&mut self, dimension: Dimension) {
        if self.selected_id() == Some(dimension.id)
            && matches!(self.state, InsightState::Loading | InsightState::Ready(_))
        {
            return;
        }
        self.selected = Some(dimension);
        self.dispatch();
    }

    /// Fetch again for the current selection. Only meaningful after a failure.
    pub fn retry(&mut self) {
        if matches!(self.state, InsightState::Unavailable(_)) {
            self.dispatch();
        }
    }

    /// Close the dialog. Anything still in flight will be discarded.
    pub fn close(&mut self) {
        self.selected = None;
        self.state = InsightState::Idle;
        self.generation += 1;
    }

    fn dispatch(&mut self) {
        let Some(focus) = self.selected.clone() else {
            return;
        };
        self.state = InsightState::Loading;
        self.in_flight += 1;
        self.generation += 1;
        let generation = self.generation;

        let generator = Arc::clone(&self.generator);
        let all = Arc::clone(&self.all_dimensions);
        let overall = self.overall;
        let tx = self.completion_tx.clone();

        tokio::spawn(async move {
            let result = generator.generate(&focus, &all, overall).await;
            // The session may have been dropped; nothing to report to then.
            let _ = tx.send(Completion {
                generation,
                dimension_id: focus.id,
                result,
            });
        });
    }

    /// Apply a completion if it belongs to the latest dispatch.
    /// Returns whether it was applied.
    fn apply(&mut self, completion: Completion) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        if completion.generation != self.generation {
            debug!(
                "Discarding stale insight for dimension {} (request {}, latest {}, selected: {:?})",
                completion.dimension_id,
                completion.generation,
                self.generation,
                self.selected_id()
            );
            return false;
        }

        self.state = match completion.result {
            Ok(text) => InsightState::Ready(text),
            Err(e) => InsightState::Unavailable(e.to_string()),
        };
        true
    }

    /// Apply every completion that has already arrived, without waiting.
    /// Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next completion.
    ///
    /// `None` when nothing is in flight, otherwise whether the completion was
    /// applied (`false` means it was stale and dropped).
    pub async fn next_completion(&mut self) -> Option<bool> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.completion_rx.recv().await?;
        Some(self.apply(completion))
    }
}
