pub mod agent;
pub mod questions;

pub use agent::{cmd_logs, cmd_start, cmd_status, cmd_stop, StartArgs};
pub use questions::cmd_questions;
