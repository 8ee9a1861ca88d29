//! 行测回合
//!
//! 20 道单选题、30 分钟倒计时。考生作答当前题时后台预取下一题；
//! 预取未就绪就显示加载提示等待。题目加载失败直接结束考试，
//! 超时或跳过则把当前题记为未作答后正常收尾。

use std::task::Poll;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::candidate::{AptitudeReply, CandidatePort};
use crate::clients::BackendApi;
use crate::error::AppResult;
use crate::infrastructure::MediaCapture;
use crate::models::{AptitudeQuestion, AptitudeResult, EndReason, Phase};
use crate::rounds::{Round, RoundCtx, RoundOutcome};
use crate::services::{MasterTimer, PrefetchSlot};

/// 行测题目主题，原型固定为混合题型
const APTITUDE_TOPIC: &str = "Mix";

pub struct AptitudeRound;

impl AptitudeRound {
    fn spawn_prefetch<A: BackendApi>(
        slot: &mut PrefetchSlot<AptitudeQuestion>,
        api: &std::sync::Arc<A>,
    ) {
        let api = api.clone();
        slot.begin(async move { api.aptitude_question(APTITUDE_TOPIC).await });
    }

    /// 收尾：补记未作答的当前题（调用方保证尚未记录），然后请求文字反馈
    async fn finish<A, C, M>(ctx: &mut RoundCtx<'_, A, C, M>, pending: Option<&AptitudeQuestion>)
    where
        A: BackendApi,
        C: CandidatePort,
        M: MediaCapture + Sync,
    {
        if let Some(question) = pending {
            ctx.session.results.aptitude.push(AptitudeResult::record(
                &question.question,
                None,
                &question.correct_answer,
            ));
        }

        let accuracy = ctx.session.results.aptitude_accuracy();
        info!(
            "📊 行测回合结束: {}/{} 题, 正确率 {}%",
            ctx.session.results.aptitude.len(),
            ctx.config.aptitude_question_count,
            accuracy
        );

        // 反馈是锦上添花，失败不影响推进
        match ctx.api.aptitude_feedback(&ctx.session.results.aptitude).await {
            Ok(feedback) => ctx.candidate.show_message(&feedback),
            Err(e) => warn!("⚠️ 行测反馈获取失败: {}", e),
        }
    }
}

#[async_trait]
impl<A, C, M> Round<A, C, M> for AptitudeRound
where
    A: BackendApi,
    C: CandidatePort,
    M: MediaCapture + Sync,
    M::Session: 'static,
{
    fn phase(&self) -> Phase {
        Phase::Aptitude
    }

    async fn run(&mut self, ctx: &mut RoundCtx<'_, A, C, M>) -> AppResult<RoundOutcome> {
        let total = ctx.config.aptitude_question_count;
        let mut timer = MasterTimer::start(ctx.config.round_duration(Phase::Aptitude));

        // 首题同步拉取，失败无法开考
        let mut current = match ctx.api.aptitude_question(APTITUDE_TOPIC).await {
            Ok(question) => question,
            Err(e) => {
                warn!("❌ 首题加载失败: {}", e);
                ctx.candidate.show_message("⚠️ Server not responding.");
                return Ok(RoundOutcome::EndTest(EndReason::AptitudeLoadFailed));
            }
        };

        let mut slot: PrefetchSlot<AptitudeQuestion> = PrefetchSlot::new();
        let mut index = 0usize;

        'round: loop {
            let reply = {
                let answer = ctx.candidate.aptitude_answer(index, total, &current);
                tokio::pin!(answer);
                // 先 poll 一次让题目展示出来，下一题的预取在展示之后才发出
                let first = futures::poll!(answer.as_mut());
                if index + 1 < total {
                    Self::spawn_prefetch(&mut slot, ctx.api);
                }
                match first {
                    Poll::Ready(reply) => reply,
                    Poll::Pending => tokio::select! {
                        _ = timer.expired() => break 'round,
                        reply = &mut answer => reply,
                    },
                }
            };

            match reply {
                AptitudeReply::Answer(choice) => {
                    ctx.session.results.aptitude.push(AptitudeResult::record(
                        &current.question,
                        Some(choice),
                        &current.correct_answer,
                    ));
                }
                AptitudeReply::SkipRound => break 'round,
            }

            if index + 1 >= total {
                Self::finish(ctx, None).await;
                return Ok(RoundOutcome::Advance);
            }

            // 取下一题：预取命中则无缝切换，否则显示加载提示
            let next = match slot.try_take() {
                Some(result) => result,
                None => {
                    ctx.candidate.show_message("Loading next question...");
                    tokio::select! {
                        _ = timer.expired() => break 'round,
                        result = slot.take() => result,
                    }
                }
            };
            current = match next {
                Ok(question) => question,
                Err(e) => {
                    warn!("❌ 行测题加载失败: {}", e);
                    ctx.candidate.show_message("⚠️ Server not responding.");
                    return Ok(RoundOutcome::EndTest(EndReason::AptitudeLoadFailed));
                }
            };
            index += 1;
        }

        // 超时或跳过：当前题若尚未记录则补记未作答，已作答的不重复记录
        let pending = if ctx.session.results.aptitude.len() <= index {
            Some(&current)
        } else {
            None
        };
        Self::finish(ctx, pending).await;
        Ok(RoundOutcome::Advance)
    }
}
