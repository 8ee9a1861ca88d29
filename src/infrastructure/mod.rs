//! 基础设施层

pub mod media;

pub use media::{record_cycle, CaptureSession, MediaCapture, MediaError, Recording};
