//! Session timing policy.

use super::record::SessionRecord;
use shared_types::Timestamp;
use std::time::Duration;

/// Idle expiry, proactive regeneration and retirement horizon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionPolicy {
    /// A session unseen for longer than this is treated as absent.
    pub idle_ttl: Duration,
    /// Identifier is rotated once it is older than this.
    pub regeneration_interval: Duration,
    /// Retirement markers older than this are dropped by the purge pass.
    pub retired_ttl: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(3600),
            regeneration_interval: Duration::from_secs(1800),
            retired_ttl: Duration::from_secs(30 * 24 * 3600),
        }
    }
}

impl SessionPolicy {
    pub fn is_expired(&self, record: &SessionRecord, now: Timestamp) -> bool {
        now.saturating_sub(record.last_seen_at) > millis(self.idle_ttl)
    }

    pub fn regeneration_due(&self, record: &SessionRecord, now: Timestamp) -> bool {
        now.saturating_sub(record.last_regenerated_at) > millis(self.regeneration_interval)
    }

    pub fn retirement_lapsed(&self, retired_at: Timestamp, now: Timestamp) -> bool {
        now.saturating_sub(retired_at) > millis(self.retired_ttl)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
