pub mod channel;
pub mod sanitize;
pub mod session;

pub use channel::SshConnector;
pub use sanitize::{sanitize_bytes, sanitize_lines};
pub use session::{
    run_session, SessionDriver, SessionPhase, SessionSettings, SessionTarget, ShellChannel,
    ShellConnector,
};
