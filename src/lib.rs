//! Prepmate 模拟考试会话引擎
//!
//! 四回合模拟面试的完整编排：行测 → 沟通 → 编程 → AI 面试，
//! 最后汇总所有回合结果生成综合报告。题目、判题、语音反馈和
//! 面试对话全部由远端后端提供。
//!
//! ## 架构设计
//!
//! - **基础设施层** ([`infrastructure`]): 媒体采集抽象与统一录制周期
//! - **客户端层** ([`clients`]): 后端 HTTP 接口封装与错误信封检查
//! - **服务层** ([`services`]): 主计时器、题目预取槽、切屏监考
//! - **回合层** ([`rounds`]): 四个回合各自的状态机
//! - **编排层** ([`orchestrator`]): 会话推进、监考竞争、报告生成
//!
//! 考生交互通过 [`candidate::CandidatePort`] 解耦，宿主环境
//! （浏览器壳、控制台、测试脚本）各自实现。

pub mod candidate;
pub mod clients;
pub mod config;
pub mod console;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod rounds;
pub mod services;
pub mod utils;

pub use candidate::{AptitudeReply, CandidatePort, CodingReply, IntroReply};
pub use clients::{ApiClient, BackendApi, InterviewEndpoint, InterviewTurn};
pub use config::Config;
pub use console::{ConsoleCandidate, NoDeviceCapture};
pub use error::{AppError, AppResult};
pub use infrastructure::{CaptureSession, MediaCapture, MediaError, Recording};
pub use models::{
    AllRoundResults, CodingLanguage, EndReason, Phase, SessionState,
};
pub use orchestrator::{SessionReport, SessionRunner};
pub use services::{visibility_channel, ProctorMonitor, VisibilityEvent};
