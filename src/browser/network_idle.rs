//! In-flight request accounting behind the `networkidle0/2` wait conditions.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;

/// Tracks requests between "will be sent" and "finished/failed" events and
/// decides when the page has been quiet long enough.
///
/// Events may arrive out of order: a completion seen before its start is
/// remembered so the late start does not count as in flight.
#[derive(Debug)]
pub struct InflightTracker {
    inflight: HashSet<String>,
    completed_early: HashSet<String>,
    max_inflight: usize,
    idle_window: Duration,
    quiet_since: Option<Instant>,
}

impl InflightTracker {
    pub fn new(max_inflight: usize, idle_window: Duration, now: Instant) -> Self {
        Self {
            inflight: HashSet::new(),
            completed_early: HashSet::new(),
            max_inflight,
            idle_window,
            quiet_since: Some(now),
        }
    }

    pub fn request_started(&mut self, request_id: impl Into<String>, now: Instant) {
        let request_id = request_id.into();
        if self.completed_early.remove(&request_id) {
            return;
        }
        self.inflight.insert(request_id);
        self.refresh(now);
    }

    pub fn request_done(&mut self, request_id: &str, now: Instant) {
        if !self.inflight.remove(request_id) {
            self.completed_early.insert(request_id.to_string());
        }
        self.refresh(now);
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// Instant at which the page counts as idle if nothing else happens.
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.quiet_since.map(|since| since + self.idle_window)
    }

    pub fn is_idle(&self, now: Instant) -> bool {
        self.idle_deadline().is_some_and(|deadline| now >= deadline)
    }

    fn refresh(&mut self, now: Instant) {
        if self.inflight.len() > self.max_inflight {
            self.quiet_since = None;
        } else if self.quiet_since.is_none() {
            self.quiet_since = Some(now);
        }
    }
}
