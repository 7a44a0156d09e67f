//! Liveness and stall detection for the control loop.
//!
//! Slow and stuck are told apart without wall-clock timeouts: a loop is
//! *stuck* when it keeps beating but no meaningful state change lands inside
//! the window opened by its last `stuck_threshold` heartbeats. Arbitrarily
//! slow but productive work never trips it.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Heartbeat, ProgressConfig, ProgressSnapshot, StateChange};

/// Per-session progress record with bounded history.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    config: ProgressConfig,
    heartbeats: VecDeque<Heartbeat>,
    state_changes: VecDeque<StateChange>,
}

impl ProgressTracker {
    pub fn new(config: ProgressConfig) -> DomainResult<Self> {
        if config.stuck_threshold == 0 {
            return Err(DomainError::Configuration(
                "stuck_threshold must be at least 1".to_string(),
            ));
        }
        if config.max_heartbeats < config.stuck_threshold {
            return Err(DomainError::Configuration(format!(
                "max_heartbeats ({}) must be at least stuck_threshold ({})",
                config.max_heartbeats, config.stuck_threshold
            )));
        }
        if config.max_state_changes == 0 {
            return Err(DomainError::Configuration(
                "max_state_changes must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            heartbeats: VecDeque::with_capacity(config.max_heartbeats),
            state_changes: VecDeque::with_capacity(config.max_state_changes),
            config,
        })
    }

    pub const fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Record liveness, evicting the oldest beat when full.
    pub fn heartbeat(&mut self, heartbeat: Heartbeat) {
        if self.heartbeats.len() == self.config.max_heartbeats {
            self.heartbeats.pop_front();
        }
        self.heartbeats.push_back(heartbeat);
    }

    /// Record a meaningful transition, evicting the oldest when full.
    pub fn state_change(&mut self, change: StateChange) {
        if self.state_changes.len() == self.config.max_state_changes {
            self.state_changes.pop_front();
        }
        self.state_changes.push_back(change);
    }

    /// Start of the window spanned by the most recent `stuck_threshold` heartbeats.
    fn window_start(&self) -> Option<DateTime<Utc>> {
        let threshold = self.config.stuck_threshold;
        if self.heartbeats.len() < threshold {
            return None;
        }
        self.heartbeats
            .get(self.heartbeats.len() - threshold)
            .map(|h| h.timestamp)
    }

    /// True once at least `stuck_threshold` heartbeats exist and no state
    /// change has been recorded since the oldest of them.
    pub fn is_stuck(&self) -> bool {
        let Some(start) = self.window_start() else {
            return false;
        };
        !self.state_changes.iter().any(|c| c.timestamp >= start)
    }

    /// Whether a heartbeat arrived within twice the heartbeat interval of `now`.
    pub fn is_alive_at(&self, now: DateTime<Utc>) -> bool {
        let grace = Duration::milliseconds(
            i64::try_from(self.config.heartbeat_interval_ms.saturating_mul(2)).unwrap_or(i64::MAX),
        );
        self.heartbeats
            .back()
            .is_some_and(|h| now - h.timestamp <= grace)
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive_at(Utc::now())
    }

    pub fn heartbeat_count(&self) -> usize {
        self.heartbeats.len()
    }

    pub fn state_change_count(&self) -> usize {
        self.state_changes.len()
    }

    /// The most recent `n` heartbeats and state changes, oldest first.
    pub fn recent(&self, n: usize) -> (Vec<Heartbeat>, Vec<StateChange>) {
        let beats = self.heartbeats.iter().rev().take(n).rev().cloned().collect();
        let changes = self.state_changes.iter().rev().take(n).rev().cloned().collect();
        (beats, changes)
    }

    pub fn status(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            heartbeats: self.heartbeats.iter().cloned().collect(),
            state_changes: self.state_changes.iter().cloned().collect(),
            alive: self.is_alive(),
            stuck: self.is_stuck(),
            last_heartbeat_at: self.heartbeats.back().map(|h| h.timestamp),
            last_state_change_at: self.state_changes.back().map(|c| c.timestamp),
        }
    }

    /// Forget all history, e.g. after a diagnostic triggered a change of course.
    pub fn reset(&mut self) {
        self.heartbeats.clear();
        self.state_changes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::StateChangeKind;

    fn tracker(threshold: usize) -> ProgressTracker {
        ProgressTracker::new(ProgressConfig {
            stuck_threshold: threshold,
            ..Default::default()
        })
        .unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_not_stuck_below_threshold() {
        let mut t = tracker(3);
        t.heartbeat(Heartbeat::new(1, "evaluate").at(at(0)));
        t.heartbeat(Heartbeat::new(2, "evaluate").at(at(1)));
        assert!(!t.is_stuck());
    }

    #[test]
    fn test_stuck_without_state_changes() {
        let mut t = tracker(3);
        for i in 0..3 {
            t.heartbeat(Heartbeat::new(i, "evaluate").at(at(i as i64)));
        }
        assert!(t.is_stuck());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stuck_queries_do_not_log() {
        let mut t = tracker(2);
        t.heartbeat(Heartbeat::new(1, "evaluate").at(at(0)));
        t.heartbeat(Heartbeat::new(2, "evaluate").at(at(1)));

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..5 {
                assert!(t.is_stuck());
                assert!(t.status().stuck);
            }
        });
        assert!(logs.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_state_change_inside_window_clears_stuck() {
        let mut t = tracker(3);
        t.heartbeat(Heartbeat::new(1, "evaluate").at(at(0)));
        t.heartbeat(Heartbeat::new(2, "evaluate").at(at(10)));
        t.state_change(StateChange::new(StateChangeKind::DecisionMade, "a").at(at(11)));
        t.heartbeat(Heartbeat::new(3, "evaluate").at(at(20)));
        assert!(!t.is_stuck());
    }

    #[test]
    fn test_state_change_before_window_does_not_count() {
        let mut t = tracker(3);
        t.state_change(StateChange::new(StateChangeKind::ToolInvocation, "x").at(at(0)));
        for i in 1..=4 {
            t.heartbeat(Heartbeat::new(i, "execute").at(at(i as i64 * 10)));
        }
        // window starts at the second heartbeat (t=20); the change at t=0 is outside it
        assert!(t.is_stuck());
    }

    #[test]
    fn test_ring_buffers_are_bounded() {
        let mut t = ProgressTracker::new(ProgressConfig {
            stuck_threshold: 2,
            max_heartbeats: 3,
            max_state_changes: 2,
            ..Default::default()
        })
        .unwrap();
        for i in 0..10 {
            t.heartbeat(Heartbeat::new(i, "evaluate").at(at(i as i64)));
            t.state_change(StateChange::new(StateChangeKind::PlanProduced, "p").at(at(i as i64)));
        }
        assert_eq!(t.heartbeat_count(), 3);
        assert_eq!(t.state_change_count(), 2);
        let snapshot = t.status();
        assert_eq!(snapshot.heartbeats[0].iteration, 7);
        assert_eq!(snapshot.last_heartbeat_at, Some(at(9)));
    }

    #[test]
    fn test_liveness_window() {
        let mut t = tracker(3);
        assert!(!t.is_alive_at(at(0)));
        t.heartbeat(Heartbeat::new(1, "evaluate").at(at(0)));
        // default interval 5s, so alive for 10s
        assert!(t.is_alive_at(at(10)));
        assert!(!t.is_alive_at(at(11)));
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let result = ProgressTracker::new(ProgressConfig {
            stuck_threshold: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_reset_clears_history() {
        let mut t = tracker(1);
        t.heartbeat(Heartbeat::new(1, "evaluate"));
        assert!(t.is_stuck());
        t.reset();
        assert!(!t.is_stuck());
        assert_eq!(t.heartbeat_count(), 0);
    }
}
