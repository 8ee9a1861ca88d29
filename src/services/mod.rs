//! 服务层：计时、预取、监考

pub mod prefetch;
pub mod proctor;
pub mod timer;

pub use prefetch::PrefetchSlot;
pub use proctor::{visibility_channel, ProctorMonitor, VisibilityEvent};
pub use timer::MasterTimer;
