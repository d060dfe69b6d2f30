//! Persisted-size management for the chat store
//!
//! Runs before every persist. Two independent limits are enforced:
//!
//! - an aggregate byte ceiling over everything in storage, reclaimed by
//!   evicting whole sessions oldest first once the high-water mark is
//!   crossed, until the footprint drops under the low-water mark
//! - a per-session entry ceiling, enforced by dropping the oldest messages

use super::notification::{Notification, Notifier};
use crate::error::Result;
use crate::storage::{ChatMessage, ChatSession, KeyValueStore};
use serde::{Deserialize, Serialize};

/// Storage key of the session index
pub const SESSIONS_KEY: &str = "chatAppSessions";

/// Prefix of per-session history keys
pub const HISTORY_PREFIX: &str = "chatHistory_";

/// Storage key holding the history of `session_id`
pub fn history_key(session_id: &str) -> String {
    format!("{}{}", HISTORY_PREFIX, session_id)
}

/// Ceilings enforced by the [`CapacityManager`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityLimits {
    /// Aggregate persisted-size ceiling in bytes
    #[serde(default = "default_capacity_bytes")]
    pub capacity_bytes: usize,

    /// Fraction of the ceiling above which eviction starts
    #[serde(default = "default_high_water_ratio")]
    pub high_water_ratio: f64,

    /// Fraction of the ceiling eviction works down to
    #[serde(default = "default_low_water_ratio")]
    pub low_water_ratio: f64,

    /// Maximum messages kept per session
    #[serde(default = "default_max_history_entries")]
    pub max_history_entries: usize,
}

fn default_capacity_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_high_water_ratio() -> f64 {
    0.8
}

fn default_low_water_ratio() -> f64 {
    0.6
}

fn default_max_history_entries() -> usize {
    1000
}

impl Default for CapacityLimits {
    fn default() -> Self {
        Self {
            capacity_bytes: default_capacity_bytes(),
            high_water_ratio: default_high_water_ratio(),
            low_water_ratio: default_low_water_ratio(),
            max_history_entries: default_max_history_entries(),
        }
    }
}

impl CapacityLimits {
    pub fn high_water_bytes(&self) -> f64 {
        self.capacity_bytes as f64 * self.high_water_ratio
    }

    pub fn low_water_bytes(&self) -> f64 {
        self.capacity_bytes as f64 * self.low_water_ratio
    }
}

/// Outcome of an eviction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Ids of the evicted sessions, oldest first
    pub evicted: Vec<String>,
    /// Footprint measured before the pass
    pub footprint_before: usize,
    /// Footprint measured after the pass
    pub footprint_after: usize,
}

impl EvictionReport {
    pub fn triggered(&self) -> bool {
        !self.evicted.is_empty()
    }
}

/// Enforces the byte ceiling and per-session entry ceiling
#[derive(Debug, Clone, Default)]
pub struct CapacityManager {
    limits: CapacityLimits,
}

impl CapacityManager {
    pub fn new(limits: CapacityLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &CapacityLimits {
        &self.limits
    }

    /// Whether `footprint` is past the high-water mark
    pub fn over_high_water(&self, footprint: usize) -> bool {
        footprint as f64 > self.limits.high_water_bytes()
    }

    /// Evict old sessions until the footprint is under the low-water mark
    ///
    /// Sessions are taken oldest `timestamp` first; sessions named in
    /// `protected` (the active session, plus a session being switched to)
    /// are never touched. For each victim the index entry is rewritten before its
    /// history blob is removed, so storage never lists a session whose
    /// history is gone.
    ///
    /// Without `force` nothing happens unless the footprint is past the
    /// high-water mark. With `force` (used after the backend rejected a
    /// write) the high-water check is skipped and at least one session is
    /// evicted when any is evictable.
    ///
    /// # Errors
    ///
    /// Returns the first storage error encountered; sessions evicted before
    /// the failure stay evicted.
    pub fn enforce<S: KeyValueStore + ?Sized>(
        &self,
        storage: &mut S,
        sessions: &mut Vec<ChatSession>,
        protected: &[&str],
        force: bool,
        notifier: &dyn Notifier,
    ) -> Result<EvictionReport> {
        let footprint_before = storage.footprint()?;
        let mut report = EvictionReport {
            evicted: Vec::new(),
            footprint_before,
            footprint_after: footprint_before,
        };

        if !force && !self.over_high_water(footprint_before) {
            return Ok(report);
        }

        tracing::warn!(
            footprint = footprint_before,
            capacity = self.limits.capacity_bytes,
            force,
            "Storage nearing capacity, evicting old sessions"
        );

        let mut candidates: Vec<ChatSession> = sessions
            .iter()
            .filter(|s| !protected.contains(&s.id.as_str()))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let low_water = self.limits.low_water_bytes();
        let mut footprint = footprint_before;

        for victim in candidates {
            let must_free_one = force && report.evicted.is_empty();
            if (footprint as f64) < low_water && !must_free_one {
                break;
            }

            sessions.retain(|s| s.id != victim.id);
            storage.set(SESSIONS_KEY, &serde_json::to_string(sessions)?)?;
            storage.remove(&history_key(&victim.id))?;

            tracing::debug!(session_id = %victim.id, "Evicted session");
            report.evicted.push(victim.id);
            footprint = storage.footprint()?;
        }

        report.footprint_after = footprint;

        if report.triggered() {
            tracing::info!(
                "Removed {} chat sessions to free space ({} -> {} bytes)",
                report.evicted.len(),
                report.footprint_before,
                report.footprint_after
            );
            notifier.notify(Notification::info(format!(
                "Removed {} old chats to free up storage space",
                report.evicted.len()
            )));
        }

        Ok(report)
    }

    /// Drop the oldest messages beyond the entry ceiling
    ///
    /// Returns how many messages were removed.
    pub fn truncate_history(&self, history: &mut Vec<ChatMessage>, notifier: &dyn Notifier) -> usize {
        let max = self.limits.max_history_entries;
        if history.len() <= max {
            return 0;
        }

        let excess = history.len() - max;
        history.drain(..excess);

        tracing::info!("Removed {} old messages from history", excess);
        notifier.notify(Notification::info(format!(
            "Removed {} old messages to keep history within {} entries",
            excess, max
        )));
        excess
    }
}
