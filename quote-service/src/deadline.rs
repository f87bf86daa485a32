//! Per-stage time bounds.
//!
//! A [`Deadline`] is an optional instant after which work is abandoned. Stages derive
//! their own deadline from the caller's with [`Deadline::child`], so a stage never
//! outlives the request it runs for, and the stage budgets are never summed.

use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

/// Returned when the bound elapsed before the wrapped work finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed;

impl Deadline {
    pub fn unbounded() -> Self {
        Self { expires_at: None }
    }

    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + budget),
        }
    }

    /// Starts a new budget now, capped by this deadline.
    pub fn child(&self, budget: Duration) -> Self {
        let own = Instant::now() + budget;
        let expires_at = match self.expires_at {
            Some(parent) if parent < own => parent,
            _ => own,
        };
        Self {
            expires_at: Some(expires_at),
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(left) if left.is_zero())
    }

    /// Drives `fut` until it completes or the deadline passes. The future is dropped
    /// on expiry, and never polled if the deadline has already passed.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Elapsed>
    where
        F: Future,
    {
        if self.is_expired() {
            return Err(Elapsed);
        }
        match self.expires_at {
            Some(at) => time::timeout_at(at, fut).await.map_err(|_| Elapsed),
            None => Ok(fut.await),
        }
    }
}
