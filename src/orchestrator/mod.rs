//! 会话编排层

pub mod session_runner;

pub use session_runner::{SessionReport, SessionRunner};
