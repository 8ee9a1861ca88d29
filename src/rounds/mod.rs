//! 回合处理器
//!
//! 每个正式回合是一个独立的处理器：内部持有自己的主计时器，把
//! 考生输入、网络请求和倒计时放进同一个 select 竞争。回合返回
//! [`RoundOutcome`] 告诉编排器继续推进还是结束整场考试。

use std::sync::Arc;

use async_trait::async_trait;

use crate::candidate::CandidatePort;
use crate::clients::BackendApi;
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::MediaCapture;
use crate::models::{EndReason, Phase, SessionState};

pub mod aptitude;
pub mod coding;
pub mod communication;
pub mod interview;

pub use aptitude::AptitudeRound;
pub use coding::CodingRound;
pub use communication::CommunicationRound;
pub use interview::InterviewRound;

/// 回合结束后的走向
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// 进入下一回合
    Advance,
    /// 结束整场考试
    EndTest(EndReason),
}

/// 回合执行上下文
///
/// 编排器按回合借出各组件；session 在回合内原地累积结果。
pub struct RoundCtx<'a, A, C, M> {
    pub api: &'a Arc<A>,
    pub candidate: &'a mut C,
    pub media: &'a M,
    pub config: &'a Config,
    pub session: &'a mut SessionState,
}

/// 回合处理器
#[async_trait]
pub trait Round<A, C, M>
where
    A: BackendApi,
    C: CandidatePort,
    M: MediaCapture + Sync,
    M::Session: 'static,
{
    fn phase(&self) -> Phase;

    async fn run(&mut self, ctx: &mut RoundCtx<'_, A, C, M>) -> AppResult<RoundOutcome>;
}

/// 沟通回合过场说明
pub const COMMUNICATION_BRIEFING: &str = "You will be given a topic to speak on. You get 15 seconds to prepare and 60 seconds to speak. Your camera and microphone will be used.";

/// 编程回合过场说明
pub const CODING_BRIEFING: &str = "You will solve 2 coding problems in the built-in editor. Run your code against the provided test cases before time runs out.";

/// 面试回合过场说明
pub const INTERVIEW_BRIEFING: &str = "A live AI interview with 6 questions. Answer out loud; your camera and microphone will be used. Skipping this round ends the test.";
