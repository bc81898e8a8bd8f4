//! Central repository for timeouts, limits and defaults
//!
//! Constants are grouped by the subsystem that consumes them. Values that an
//! operator may want to tune are mirrored in [`crate::config::Config`] and only
//! serve as defaults there.

use std::time::Duration;

/// Interactive session timing defaults
pub mod session {
    use super::Duration;

    /// SSH port used for session transport
    pub const SSH_PORT: u16 = 22;

    /// Upper bound for establishing and authenticating a connection
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Read timeout of the pseudo-terminal channel
    pub const CHANNEL_TIMEOUT: Duration = Duration::from_secs(20);

    /// Fixed delay after a command is sent, before readiness polling starts
    pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

    /// Interval between readiness polls
    pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

    /// Maximum time to wait for output to become ready
    pub const MAX_COMMAND_WAIT: Duration = Duration::from_secs(10);

    /// Extra delay after readiness, lets slower daemons finish writing
    pub const AFTER_COMMAND_WAIT: Duration = Duration::from_secs(1);

    /// Byte cap for the final read of the channel buffer
    pub const READ_LIMIT_BYTES: usize = 9999;

    /// Command used to escalate privileges
    pub const ESCALATE_COMMAND: &str = "sudo su";

    /// Terminal type requested for the pseudo-terminal
    pub const PTY_TERM: &str = "xterm";
}

/// HTTP probe defaults
pub mod http {
    use super::Duration;

    /// Timeout for a node metrics request
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Timeout for advisory third-party lookups
    pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

    /// Highest status code still treated as a usable reply
    pub const MAX_OK_STATUS: u16 = 300;

    /// Webhook delivery timeout
    pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Verdict formatting
pub mod verdict {
    /// Diagnostics longer than this are cut before reaching the user
    pub const MAX_ERROR_LEN: usize = 80;
}

/// Sync thresholds used by parsers
pub mod thresholds {
    /// Maximum tolerated distance between node and reference ledger versions
    pub const APTOS_MAX_LEDGER_DIVERGENCE: u64 = 10;

    /// Minimum number of active and candidate rolls for a staking node
    pub const MASSA_MIN_ROLLS: i64 = 1;
}

/// Default configuration values
pub mod defaults {
    /// Address of the command API
    pub const HOST: &str = "0.0.0.0";

    /// Port of the command API
    pub const PORT: u16 = 8095;

    /// SQLite database location
    pub const DATABASE_PATH: &str = "data/nodes.db";

    /// Time zone used to render cached check times
    pub const TIMEZONE: &str = "UTC";

    /// Periodic check, every 5 minutes (sec min hour day month dow)
    pub const CHECK_SCHEDULE: &str = "0 */5 * * * *";

    /// Daily cached status report at 09:00
    pub const DAILY_REPORT_SCHEDULE: &str = "0 0 9 * * *";

    /// Consecutive failed checks required before a node is reported as down
    pub const CONFIRM_BAD_CHECKS: u32 = 2;

    /// Consecutive healthy checks required before a node is reported as recovered
    pub const CONFIRM_GOOD_CHECKS: u32 = 3;

    /// Reference ledger used to cross-check aptos nodes
    pub const APTOS_LEDGER_URL: &str = "https://fullnode.devnet.aptoslabs.com/";
}

/// Nodes.guru project catalogue tracking
pub mod projects {
    /// Catalogue page carrying the embedded project list
    pub const CATALOGUE_URL: &str = "https://nodes.guru/";

    /// Opening tag of the embedded page data
    pub const DATA_START: &str = r#"<script id="__NEXT_DATA__" type="application/json">"#;

    pub const DATA_END: &str = "</script>";

    /// JSON pointer to the project groups inside the page data
    pub const PROJECTS_POINTER: &str = "/props/pageProps/projects";

    /// Every 15 minutes
    pub const TRACK_SCHEDULE: &str = "0 */15 * * * *";

    pub const CHANGED_HEADER: &str = "Nodes.guru projects changed!";
}

/// Rendered text fragments shared by the aggregator and the command surface
pub mod text {
    pub const NO_NODES: &str = "No node exists";
    pub const CHANGED_HEADER: &str = "Nodes status changed!";
    pub const METRICS_PREFIX: &str = "All metrics:";
    pub const CREDENTIAL_MASK: &str = "***";
}
