//! Controllers for the Visitors operator
//!
//! A reconciliation pass is a flat, ordered list of steps. Each step either
//! lets the pass continue or stops it with an [`Outcome`]; [`sequence`] runs
//! the list and stops at the first step that asks to.

mod assurance;
mod drift;
mod readiness;
mod status;
mod visitor_app;

pub use assurance::assure;
pub use drift::{endpoint_drift, handle_drift, workload_drift};
pub use readiness::{is_tier_ready, EXPECTED_READY_REPLICAS};
pub use status::update_tier_status;
pub use visitor_app::{ObjectKey, Reconciler, VisitorAppController};

use crate::error::{OperatorError, Result};
use futures::future::BoxFuture;
use kube::runtime::controller::Action;
use std::time::Duration;
use tracing::warn;

/// How a pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing more to do until something changes
    Done,
    /// Run the pass again after the delay
    RequeueAfter(Duration),
}

impl From<Outcome> for Action {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => Action::await_change(),
            Outcome::RequeueAfter(delay) => Action::requeue(delay),
        }
    }
}

/// Result of one step of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop(Outcome),
}

/// Run steps in order, returning the first `Stop` or the first error.
///
/// Steps are futures, so nothing runs until its turn: a step that is never
/// reached performs no calls.
pub async fn sequence(steps: Vec<BoxFuture<'_, Result<Step>>>) -> Result<Step> {
    for step in steps {
        if let Step::Stop(outcome) = step.await? {
            return Ok(Step::Stop(outcome));
        }
    }
    Ok(Step::Continue)
}

/// Requeue after a failed pass. Every error is treated as transient.
pub fn error_policy_backoff(error: &OperatorError, delay: Duration) -> Action {
    warn!(error = %error, "Requeueing in {:?}", delay);
    Action::requeue(delay)
}
