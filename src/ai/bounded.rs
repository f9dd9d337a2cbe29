//! Wall-clock bounded move selection.
//!
//! The picker runs on tokio's blocking pool while the caller waits up to the
//! configured timeout. On expiry the shared stop flag is raised, so the
//! worker unwinds at its next node instead of running on unobserved, and
//! the caller gets the first legal move instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::board::Position;
use crate::engine::movegen::legal_moves;
use crate::engine::types::Move;

use super::search::{MovePicker, picker_for};

/// How a bounded search ended. Every variant carries the move to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The picker finished in time.
    Completed(Option<Move>),
    /// The deadline passed; the move is the fallback.
    TimedOut(Option<Move>),
    /// The worker panicked; the move is the fallback.
    Failed(Option<Move>),
}

impl SearchOutcome {
    pub fn best_move(&self) -> Option<Move> {
        match *self {
            SearchOutcome::Completed(mv)
            | SearchOutcome::TimedOut(mv)
            | SearchOutcome::Failed(mv) => mv,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SearchOutcome::Completed(_))
    }
}

/// Raises the stop flag when dropped, so an abandoned `run` future still
/// stops its worker.
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// A picker paired with a deadline.
#[derive(Clone)]
pub struct BoundedSearch {
    picker: Arc<dyn MovePicker>,
    timeout: Duration,
}

impl BoundedSearch {
    pub fn new(picker: Arc<dyn MovePicker>, timeout: Duration) -> Self {
        Self { picker, timeout }
    }

    /// The picker and timeout the configuration selects.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(picker_for(config), config.search_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pick a move for the side to move within the timeout.
    ///
    /// Returns `Completed(None)` straight away when there is no legal move.
    pub async fn run(&self, position: &Position) -> SearchOutcome {
        let fallback = legal_moves(position, position.side_to_move).first().copied();
        if fallback.is_none() {
            return SearchOutcome::Completed(None);
        }

        let stop = StopOnDrop(Arc::new(AtomicBool::new(false)));
        let worker_stop = Arc::clone(&stop.0);
        let picker = Arc::clone(&self.picker);
        let snapshot = position.clone();

        debug!(
            picker = picker.name(),
            timeout_ms = self.timeout.as_millis() as u64,
            "bounded search started"
        );
        let handle = tokio::task::spawn_blocking(move || picker.pick(&snapshot, &worker_stop));

        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(mv)) => SearchOutcome::Completed(mv),
            Ok(Err(err)) => {
                warn!(error = %err, "search worker failed, using fallback move");
                SearchOutcome::Failed(fallback)
            }
            Err(_) => {
                drop(stop);
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    fallback = ?fallback.map(|m| m.to_string()),
                    "search timed out, using fallback move"
                );
                SearchOutcome::TimedOut(fallback)
            }
        }
    }
}

impl std::fmt::Debug for BoundedSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedSearch")
            .field("picker", &self.picker.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
