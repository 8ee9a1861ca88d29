//! 面试回合
//!
//! 六轮对话、20 分钟倒计时。每轮按固定脚本选择 HR / 简历 /
//! 管理面接口，并把上一轮录下的回答随请求一起提交；对话历史
//! 由服务端维护，响应里的完整历史覆盖本地副本。单轮请求失败
//! 消耗该轮次，面试继续。

use async_trait::async_trait;
use tracing::{info, warn};

use crate::candidate::CandidatePort;
use crate::clients::{BackendApi, InterviewEndpoint};
use crate::error::AppResult;
use crate::infrastructure::{record_cycle, MediaCapture};
use crate::models::{ChatMessage, Phase};
use crate::rounds::{Round, RoundCtx, RoundOutcome};
use crate::services::MasterTimer;

/// 第 N 轮的接口与面试官指令
///
/// 有简历时第 2、3 轮走简历面，否则退回 HR 面的通用问题。
fn turn_script(turn: u32, has_resume: bool) -> (InterviewEndpoint, &'static str) {
    match (turn, has_resume) {
        (1, _) => (
            InterviewEndpoint::Hr,
            "Start the interview with 'Tell me about yourself.'",
        ),
        (2, true) => (
            InterviewEndpoint::Resume,
            "Ask a specific question about my resume.",
        ),
        (2, false) => (
            InterviewEndpoint::Hr,
            "Ask me about my greatest strength or weakness.",
        ),
        (3, true) => (
            InterviewEndpoint::Resume,
            "Ask a follow-up question based on my last answer about my resume.",
        ),
        (3, false) => (
            InterviewEndpoint::Hr,
            "Ask me a follow-up about my last answer.",
        ),
        (4, _) => (
            InterviewEndpoint::Managerial,
            "Ask me a common managerial or behavioral question (e.g., conflict, teamwork, leadership).",
        ),
        (5, _) => (
            InterviewEndpoint::Managerial,
            "Ask me a follow-up question based on my last answer.",
        ),
        _ => (
            InterviewEndpoint::Hr,
            "Ask me if I have any questions for you, then say 'This concludes our interview.'",
        ),
    }
}

pub struct InterviewRound;

#[async_trait]
impl<A, C, M> Round<A, C, M> for InterviewRound
where
    A: BackendApi,
    C: CandidatePort,
    M: MediaCapture + Sync,
    M::Session: 'static,
{
    fn phase(&self) -> Phase {
        Phase::Interview
    }

    async fn run(&mut self, ctx: &mut RoundCtx<'_, A, C, M>) -> AppResult<RoundOutcome> {
        let total = ctx.config.interview_turn_count;
        let has_resume = ctx.session.resume_text.is_some();
        let mut timer = MasterTimer::start(ctx.config.round_duration(Phase::Interview));

        let mut history: Vec<ChatMessage> = Vec::new();
        let mut answer: Option<(Vec<u8>, Vec<String>)> = None;
        let mut turn = 0u32;
        let mut complete = false;

        while turn < total && !complete {
            // 轮次先消耗：本轮请求失败不重试，面试照常往下走
            turn += 1;
            let (endpoint, instruction) = turn_script(turn, has_resume);

            let mut payload = history.clone();
            payload.push(ChatMessage::new("system", instruction));
            let resume_text = if endpoint == InterviewEndpoint::Resume {
                ctx.session.resume_text.as_deref()
            } else {
                None
            };

            let result = tokio::select! {
                _ = timer.expired() => break,
                result = ctx.api.interview_turn(endpoint, &payload, resume_text, answer.take()) => result,
            };
            let reply = match result {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("❌ 面试第 {} 轮请求失败: {}", turn, e);
                    let text = match e.server_message() {
                        Some(message) => format!("⚠️ Error: {}", message),
                        None => {
                            "⚠️ Server not responding. Make sure backend is running.".to_string()
                        }
                    };
                    ctx.candidate.chat_message("ai", &text);
                    continue;
                }
            };

            if let Some(transcript) = &reply.user_transcript {
                ctx.candidate.chat_message("user", transcript);
            }
            if let Some(response) = &reply.ai_response {
                ctx.candidate.chat_message("ai", response);
            }
            history = reply.updated_history;
            ctx.session.results.interview = history.clone();
            complete = reply.session_complete || turn >= total;
            if complete {
                break;
            }

            // 录下考生对本轮问题的回答，随下一轮请求提交
            answer = match ctx.media.acquire().await {
                Ok(capture) => {
                    let stop_signal = async {
                        tokio::select! {
                            _ = ctx.candidate.wait_stop_recording() => {}
                            _ = timer.expired() => {}
                        }
                    };
                    let recording = record_cycle(
                        capture,
                        None,
                        ctx.config.expression_sample_interval(),
                        stop_signal,
                    )
                    .await;
                    if recording.is_empty() {
                        None
                    } else {
                        Some((recording.audio_webm, recording.expressions))
                    }
                }
                Err(e) => {
                    warn!("❌ 媒体设备获取失败: {}", e);
                    ctx.candidate
                        .show_message("⚠️ Mic/Cam permission denied. Cannot proceed with round.");
                    None
                }
            };
            if timer.is_expired() {
                break;
            }
        }

        info!("📊 面试回合结束: {} 轮, {} 条对话", turn, history.len());
        ctx.session.results.interview = history;
        Ok(RoundOutcome::Advance)
    }
}
