//! 编程回合
//!
//! 两道编程题、45 分钟倒计时。第一题是基础题，第二题偏数据结构
//! 与算法，作答期间后台预取第二题。判题由远端沙箱执行，逐用例
//! 返回结果行；全部 PASSED 才记为通过，失败也记录在案并允许
//! 继续下一题。超时时把当前题连同编辑器里的代码记为未完成。

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::candidate::{CandidatePort, CodingReply};
use crate::clients::BackendApi;
use crate::error::AppResult;
use crate::infrastructure::MediaCapture;
use crate::models::{CodingProblem, CodingResult, CodingStatus, Phase};
use crate::rounds::{Round, RoundCtx, RoundOutcome};
use crate::services::{MasterTimer, PrefetchSlot};

/// 两道题的主题，顺序固定
const CODING_TOPICS: [&str; 2] = ["Basic", "Mix (DSA)"];

pub struct CodingRound;

/// 判定一次运行是否全部通过
///
/// 判题服务逐用例输出一行，通过的行带 PASSED 标记。
fn all_cases_passed(lines: &[String]) -> bool {
    match Regex::new(r"\bPASSED\b") {
        Ok(re) => lines.iter().all(|line| re.is_match(line)),
        Err(_) => lines.iter().all(|line| line.contains("PASSED")),
    }
}

impl CodingRound {
    fn record(
        ctx: &mut RoundCtx<'_, impl BackendApi, impl CandidatePort, impl MediaCapture + Sync>,
        problem: &CodingProblem,
        user_code: &str,
        status: CodingStatus,
    ) {
        ctx.session.results.coding.push(CodingResult {
            question: problem.question_title.clone(),
            user_code: user_code.to_string(),
            status,
        });
    }
}

#[async_trait]
impl<A, C, M> Round<A, C, M> for CodingRound
where
    A: BackendApi,
    C: CandidatePort,
    M: MediaCapture + Sync,
    M::Session: 'static,
{
    fn phase(&self) -> Phase {
        Phase::Coding
    }

    async fn run(&mut self, ctx: &mut RoundCtx<'_, A, C, M>) -> AppResult<RoundOutcome> {
        let total = ctx.config.coding_problem_count.min(CODING_TOPICS.len());
        let language = ctx.session.coding_language;
        info!("🔍 编程回合: {} 题, 语言 {}", total, language.display_name());
        let mut timer = MasterTimer::start(ctx.config.round_duration(Phase::Coding));

        let first = tokio::select! {
            _ = timer.expired() => return Ok(RoundOutcome::Advance),
            result = ctx.api.technical_question(CODING_TOPICS[0], language) => result,
        };
        let mut current = match first {
            Ok(problem) => problem,
            Err(e) => {
                warn!("❌ 编程题加载失败: {}", e);
                ctx.candidate
                    .show_message("Failed to load coding question. Advancing to next round.");
                tokio::time::sleep(ctx.config.error_advance_delay()).await;
                return Ok(RoundOutcome::Advance);
            }
        };

        // 第一题作答期间预取第二题
        let mut slot: PrefetchSlot<CodingProblem> = PrefetchSlot::new();
        if total > 1 {
            let api = ctx.api.clone();
            slot.begin(async move { api.technical_question(CODING_TOPICS[1], language).await });
        }

        let mut index = 0usize;
        let mut current_code = current.starter_code.clone();
        let timed_out = 'round: loop {
            // 单题循环：运行失败允许改完重交
            let recorded = loop {
                let reply = tokio::select! {
                    _ = timer.expired() => break 'round true,
                    reply = ctx.candidate.coding_action(index, total, &current) => reply,
                };
                let code = match reply {
                    CodingReply::Run(code) => code,
                    CodingReply::SkipRound => break 'round false,
                };
                current_code = code.clone();

                let run = tokio::select! {
                    _ = timer.expired() => break 'round true,
                    result = ctx.api.run_code(&code, language, &current.test_cases) => result,
                };
                match run {
                    Ok(lines) => {
                        let passed = all_cases_passed(&lines);
                        ctx.candidate.show_run_results(&lines, passed);
                        let (status, text) = if passed {
                            (CodingStatus::Passed, "All test cases passed!")
                        } else {
                            (
                                CodingStatus::Failed,
                                "Some test cases failed. Your attempt has been recorded.",
                            )
                        };
                        ctx.candidate.show_message(text);
                        Self::record(ctx, &current, &code, status);
                        break status;
                    }
                    Err(e) => {
                        warn!("❌ 代码运行失败: {}", e);
                        let text = match e.server_message() {
                            Some(message) => format!("⚠️ {}", message),
                            None => {
                                "⚠️ Server not responding. Make sure backend is running."
                                    .to_string()
                            }
                        };
                        ctx.candidate.show_message(&text);
                    }
                }
            };
            info!("✓ 编程题 {}/{} 已记录: {:?}", index + 1, total, recorded);

            let finished_last = index + 1 >= total;
            tokio::select! {
                _ = timer.expired() => break 'round true,
                _ = ctx.candidate.coding_continue(finished_last) => {}
            }
            if finished_last {
                return Ok(RoundOutcome::Advance);
            }

            let next = match slot.try_take() {
                Some(result) => result,
                None => {
                    ctx.candidate
                        .show_message(&format!("Loading problem {} of {}...", index + 2, total));
                    tokio::select! {
                        _ = timer.expired() => break 'round true,
                        result = slot.take() => result,
                    }
                }
            };
            current = match next {
                Ok(problem) => problem,
                Err(e) => {
                    warn!("❌ 编程题加载失败: {}", e);
                    ctx.candidate
                        .show_message("Failed to load coding question. Advancing to next round.");
                    tokio::time::sleep(ctx.config.error_advance_delay()).await;
                    return Ok(RoundOutcome::Advance);
                }
            };
            index += 1;
            current_code = current.starter_code.clone();
        };

        // 超时或跳过：当前题连同编辑器内容记为未完成
        if ctx.session.results.coding.len() <= index {
            Self::record(ctx, &current, &current_code, CodingStatus::Incomplete);
        }
        if timed_out {
            info!("⏱️ 编程回合超时收尾");
        }
        Ok(RoundOutcome::Advance)
    }
}
