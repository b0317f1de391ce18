use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use crate::time::TimeBudget;

/// Per-episode stop signal shared by every worker and the timer.
///
/// The flag only ever goes false -> true, once. The token also carries the
/// episode's deadline and node ceiling, and owns the node accumulator all
/// workers count into.
#[derive(Debug)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    started: Instant,
    move_time: Option<Duration>,
    node_limit: Option<u64>,
    nodes: AtomicU64,
}

impl CancellationToken {
    pub fn new(budget: &TimeBudget) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            started: Instant::now(),
            move_time: budget.move_time_ms.map(Duration::from_millis),
            node_limit: budget.node_limit,
            nodes: AtomicU64::new(0),
        }
    }

    pub fn unbounded() -> Self { Self::new(&TimeBudget::default()) }

    /// Returns true only for the call that actually flipped the flag.
    pub fn cancel(&self) -> bool { !self.cancelled.swap(true, Ordering::AcqRel) }

    #[inline]
    pub fn is_cancelled(&self) -> bool { self.cancelled.load(Ordering::Acquire) }

    pub fn elapsed(&self) -> Duration { self.started.elapsed() }

    pub fn move_time(&self) -> Option<Duration> { self.move_time }

    pub fn node_limit(&self) -> Option<u64> { self.node_limit }

    pub fn time_exceeded(&self) -> bool {
        self.move_time.map_or(false, |t| self.elapsed() > t)
    }

    /// Counts one node into the shared accumulator. Under a node ceiling the
    /// increment is refused once the ceiling is reached, which also cancels
    /// the episode, so the total never exceeds the ceiling.
    #[inline]
    pub fn count_node(&self) -> bool {
        match self.node_limit {
            None => {
                self.nodes.fetch_add(1, Ordering::Relaxed);
                true
            }
            Some(limit) => {
                let counted = self
                    .nodes
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| (n < limit).then_some(n + 1))
                    .is_ok();
                if !counted { self.cancel(); }
                counted
            }
        }
    }

    pub fn nodes(&self) -> u64 { self.nodes.load(Ordering::Relaxed) }
}
