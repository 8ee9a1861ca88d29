//! 考生交互端口
//!
//! 会话编排器不直接接触任何界面；考生的所有输入输出都经过
//! [`CandidatePort`]。控制台实现见 [`crate::console`]，测试用
//! 脚本化实现驱动整场会话。

use async_trait::async_trait;

use crate::models::{AptitudeQuestion, CodingProblem, Phase};

/// 过场界面的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroReply {
    /// 开始本回合
    Start,
    /// 跳过（沟通/编程回合跳到下一回合；面试回合结束整场考试）
    Skip,
}

/// 行测回合的单题操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AptitudeReply {
    /// 选择一个选项
    Answer(String),
    /// 放弃剩余题目
    SkipRound,
}

/// 编程回合的操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodingReply {
    /// 提交当前代码运行
    Run(String),
    /// 放弃剩余题目
    SkipRound,
}

/// 考生端口
///
/// 等待输入的方法都是可取消的：回合用 select 把它们和主计时器
/// 放在一起竞争，计时器先到点就丢弃未完成的等待。
#[async_trait]
pub trait CandidatePort: Send {
    /// 等待考生确认开始整场考试
    async fn confirm_begin(&mut self);

    /// 展示回合过场说明，等待开始或跳过
    async fn begin_round(&mut self, phase: Phase, briefing: &str) -> IntroReply;

    /// 展示一道行测题，等待作答
    async fn aptitude_answer(
        &mut self,
        index: usize,
        total: usize,
        question: &AptitudeQuestion,
    ) -> AptitudeReply;

    /// 展示一道编程题，等待提交或跳过
    async fn coding_action(
        &mut self,
        index: usize,
        total: usize,
        problem: &CodingProblem,
    ) -> CodingReply;

    /// 展示运行结果后，等待考生进入下一题（最后一题时仅作确认）
    async fn coding_continue(&mut self, finished_last: bool);

    /// 录音中，等待考生主动停止
    async fn wait_stop_recording(&mut self);

    /// 展示一条提示文案
    fn show_message(&mut self, text: &str);

    /// 展示代码运行逐用例结果
    fn show_run_results(&mut self, lines: &[String], all_passed: bool);

    /// 在面试聊天窗口追加一条消息
    fn chat_message(&mut self, role: &str, content: &str);
}
