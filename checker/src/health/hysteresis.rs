//! Notification gate for status changes
//!
//! A status change reaches the owner only after it has been observed in a row
//! often enough: `confirm_bad_checks` times for a node going down,
//! `confirm_good_checks` times for a recovery. A node that never had a status
//! surfaced counts as healthy.

use chrono::{DateTime, Utc};

use super::types::{HealthVerdict, NodeState};
use crate::config::HysteresisConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: NodeState,
    /// The new status crossed its threshold and must be reported
    pub notify: bool,
}

pub fn apply(
    previous: &NodeState,
    verdict: &HealthVerdict,
    thresholds: &HysteresisConfig,
    checked_at: DateTime<Utc>,
) -> Transition {
    let ok = verdict.is_ok();
    let previous_ok = previous.last_verdict.as_ref().map(HealthVerdict::is_ok);

    let consecutive_same_count = if previous_ok == Some(ok) {
        previous.consecutive_same_count.saturating_add(1)
    } else {
        0
    };

    let threshold = if ok {
        thresholds.confirm_good_checks
    } else {
        thresholds.confirm_bad_checks
    };
    let surfaced_ok = previous.last_notified_ok.unwrap_or(true);
    let notify = ok != surfaced_ok && consecutive_same_count + 1 >= threshold;

    let last_notified_ok = match previous.last_notified_ok {
        _ if notify => Some(ok),
        None if ok => Some(true),
        current => current,
    };

    Transition {
        state: NodeState {
            last_checked_at: Some(checked_at),
            last_verdict: Some(verdict.clone()),
            last_notified_ok,
            consecutive_same_count,
        },
        notify,
    }
}
