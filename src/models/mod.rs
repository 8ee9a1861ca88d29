//! 数据模型层

pub mod question;
pub mod results;
pub mod session;

pub use question::{AptitudeQuestion, CodingProblem};
pub use results::{AllRoundResults, AptitudeResult, ChatMessage, CodingResult, CodingStatus};
pub use session::{CodingLanguage, EndReason, Phase, SessionState};
