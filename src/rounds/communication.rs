//! 沟通回合
//!
//! 单话题即兴发言：15 秒准备、最多 60 秒录音，整个回合 2 分钟
//! 封顶。录音结束后把音频和逐秒表情一起提交换取反馈；这一步
//! 不受主计时器打断，超时触发的停止同样会走完提交。
//! 话题获取失败或设备权限被拒都不终止考试，提示后顺延进入
//! 下一回合。

use async_trait::async_trait;
use tracing::{info, warn};

use crate::candidate::CandidatePort;
use crate::clients::BackendApi;
use crate::error::AppResult;
use crate::infrastructure::{record_cycle, MediaCapture};
use crate::models::Phase;
use crate::rounds::{Round, RoundCtx, RoundOutcome};
use crate::services::MasterTimer;

pub struct CommunicationRound;

#[async_trait]
impl<A, C, M> Round<A, C, M> for CommunicationRound
where
    A: BackendApi,
    C: CandidatePort,
    M: MediaCapture + Sync,
    M::Session: 'static,
{
    fn phase(&self) -> Phase {
        Phase::Communication
    }

    async fn run(&mut self, ctx: &mut RoundCtx<'_, A, C, M>) -> AppResult<RoundOutcome> {
        let mut timer = MasterTimer::start(ctx.config.round_duration(Phase::Communication));

        let topic = tokio::select! {
            _ = timer.expired() => return Ok(RoundOutcome::Advance),
            result = ctx.api.communication_topic() => result,
        };
        let topic = match topic {
            Ok(topic) => topic,
            Err(e) => {
                warn!("❌ 话题获取失败: {}", e);
                let text = match e.server_message() {
                    Some(message) => format!("⚠️ Error fetching topic: {}", message),
                    None => "⚠️ Error fetching topic: Server not responding.".to_string(),
                };
                ctx.candidate.show_message(&text);
                tokio::time::sleep(ctx.config.error_advance_delay()).await;
                return Ok(RoundOutcome::Advance);
            }
        };
        info!("🔍 沟通话题: {}", topic);
        ctx.candidate.show_message(&topic);

        // 准备时间也受主计时器约束
        tokio::select! {
            _ = timer.expired() => {}
            _ = tokio::time::sleep(ctx.config.prep_duration()) => {}
        }

        let capture = match ctx.media.acquire().await {
            Ok(capture) => capture,
            Err(e) => {
                warn!("❌ 媒体设备获取失败: {}", e);
                ctx.candidate
                    .show_message("⚠️ Mic/Cam permission denied. Cannot proceed with round.");
                tokio::time::sleep(ctx.config.error_advance_delay()).await;
                return Ok(RoundOutcome::Advance);
            }
        };

        let recording = if timer.is_expired() {
            Default::default()
        } else {
            let stop_signal = async {
                tokio::select! {
                    _ = ctx.candidate.wait_stop_recording() => {}
                    _ = timer.expired() => {}
                }
            };
            record_cycle(
                capture,
                Some(ctx.config.speak_duration()),
                ctx.config.expression_sample_interval(),
                stop_signal,
            )
            .await
        };

        // 提交不受计时器打断
        let feedback = if recording.is_empty() {
            "No audio recorded.".to_string()
        } else {
            match ctx
                .api
                .communication_feedback(&topic, recording.audio_webm, &recording.expressions)
                .await
            {
                Ok(feedback) => feedback,
                Err(e) => {
                    warn!("❌ 沟通反馈提交失败: {}", e);
                    match e.server_message() {
                        Some(message) => format!("Error: {}", message),
                        None => "Error: Server not responding.".to_string(),
                    }
                }
            }
        };
        ctx.candidate.show_message(&feedback);
        ctx.session.results.communication = Some(feedback);

        Ok(RoundOutcome::Advance)
    }
}
