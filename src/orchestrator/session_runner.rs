//! 会话编排器
//!
//! 按固定顺序推进：准备（简历）→ 确认开始 → 行测 → 沟通 →
//! 编程 → 面试 → 最终报告。每个正式回合和监考器 select 竞争，
//! 切屏达到上限时整场考试立即结束并带着已有结果去生成报告。

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::candidate::{CandidatePort, IntroReply};
use crate::clients::BackendApi;
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::MediaCapture;
use crate::models::{CodingLanguage, EndReason, Phase, SessionState};
use crate::rounds::{
    AptitudeRound, CodingRound, CommunicationRound, InterviewRound, Round, RoundCtx,
    RoundOutcome, CODING_BRIEFING, COMMUNICATION_BRIEFING, INTERVIEW_BRIEFING,
};
use crate::services::ProctorMonitor;
use crate::utils::logging;

/// 一场会话的最终产物
#[derive(Debug)]
pub struct SessionReport {
    /// 结束原因
    pub reason: EndReason,
    /// 最终报告文本（生成失败时为 None）
    pub report: Option<String>,
    /// 结束时的完整会话状态
    pub state: SessionState,
}

/// 会话编排器
pub struct SessionRunner<A, C, M> {
    api: Arc<A>,
    candidate: C,
    media: M,
    proctor: ProctorMonitor,
    config: Config,
    session: SessionState,
}

impl<A, C, M> SessionRunner<A, C, M>
where
    A: BackendApi,
    C: CandidatePort,
    M: MediaCapture + Sync,
    M::Session: 'static,
{
    pub fn new(api: A, candidate: C, media: M, proctor: ProctorMonitor, config: Config) -> Self {
        let language = CodingLanguage::parse_or_default(&config.coding_language);
        Self {
            api: Arc::new(api),
            candidate,
            media,
            proctor,
            config,
            session: SessionState::new(language),
        }
    }

    /// 运行整场会话直到报告生成
    pub async fn run(mut self) -> AppResult<SessionReport> {
        if !self.config.output_log_file.is_empty() {
            if let Err(e) = logging::init_log_file(&self.config.output_log_file) {
                warn!("⚠️ 日志文件初始化失败: {}", e);
            }
        }
        logging::log_session_start(&self.config);

        self.setup().await;

        self.session.phase = Phase::Ready;
        self.candidate.confirm_begin().await;

        let reason = self.run_rounds().await?;
        let report = self.finish_report(&reason).await;

        logging::log_session_summary(&self.session, &reason, report.is_some());
        Ok(SessionReport {
            reason,
            report,
            state: self.session,
        })
    }

    /// 准备阶段：可选的简历上传
    ///
    /// 读取或上传失败都不拦路，继续无简历流程（面试回合改走
    /// HR 面通用问题）。
    async fn setup(&mut self) {
        self.session.phase = Phase::Setup;
        let Some(path) = self.config.resume_path.clone() else {
            self.candidate.show_message("Resume skipped.");
            return;
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("⚠️ 简历读取失败 ({}): {}", path, e);
                self.candidate.show_message("Resume skipped.");
                return;
            }
        };
        let file_name = Path::new(&path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resume.pdf")
            .to_string();

        match self.api.upload_resume(&file_name, bytes).await {
            Ok(text) => {
                info!("✓ 简历解析成功: {} 字符", text.chars().count());
                self.session.resume_text = Some(text);
                self.candidate.show_message("✅ Resume Uploaded!");
            }
            Err(e) => {
                warn!("❌ 简历上传失败: {}", e);
                let text = match e.server_message() {
                    Some(message) => format!("⚠️ {}", message),
                    None => "⚠️ Server not responding.".to_string(),
                };
                self.candidate.show_message(&text);
            }
        }
    }

    /// 执行一个正式回合，与监考器竞争
    async fn conduct<R>(&mut self, mut round: R) -> AppResult<Option<EndReason>>
    where
        R: Round<A, C, M>,
    {
        self.session.phase = round.phase();
        info!("========== {} ==========", self.session.phase.name());
        // 过场期间积压的可见性事件不算警告
        self.proctor.arm();

        let outcome = {
            let mut ctx = RoundCtx {
                api: &self.api,
                candidate: &mut self.candidate,
                media: &self.media,
                config: &self.config,
                session: &mut self.session,
            };
            tokio::select! {
                reason = self.proctor.breached() => RoundOutcome::EndTest(reason),
                result = round.run(&mut ctx) => result?,
            }
        };
        self.session.warnings = self.proctor.warnings();

        match outcome {
            RoundOutcome::Advance => Ok(None),
            RoundOutcome::EndTest(reason) => Ok(Some(reason)),
        }
    }

    /// 四个回合的固定顺序
    async fn run_rounds(&mut self) -> AppResult<EndReason> {
        if let Some(reason) = self.conduct(AptitudeRound).await? {
            return Ok(reason);
        }

        self.session.phase = Phase::CommunicationIntro;
        match self
            .candidate
            .begin_round(Phase::CommunicationIntro, COMMUNICATION_BRIEFING)
            .await
        {
            IntroReply::Start => {
                if let Some(reason) = self.conduct(CommunicationRound).await? {
                    return Ok(reason);
                }
            }
            IntroReply::Skip => info!("沟通回合被跳过"),
        }

        self.session.phase = Phase::CodingIntro;
        match self
            .candidate
            .begin_round(Phase::CodingIntro, CODING_BRIEFING)
            .await
        {
            IntroReply::Start => {
                if let Some(reason) = self.conduct(CodingRound).await? {
                    return Ok(reason);
                }
            }
            IntroReply::Skip => info!("编程回合被跳过"),
        }

        self.session.phase = Phase::InterviewIntro;
        match self
            .candidate
            .begin_round(Phase::InterviewIntro, INTERVIEW_BRIEFING)
            .await
        {
            IntroReply::Start => {
                if let Some(reason) = self.conduct(InterviewRound).await? {
                    return Ok(reason);
                }
            }
            // 面试是最后一关，跳过等于放弃整场考试
            IntroReply::Skip => return Ok(EndReason::Skipped),
        }

        Ok(EndReason::Completed)
    }

    /// 汇总所有回合结果生成最终报告
    async fn finish_report(&mut self, reason: &EndReason) -> Option<String> {
        self.session.phase = Phase::Report;
        self.candidate.show_message(&format!(
            "Test Ended. {}\n\nGenerating your comprehensive report... This may take a moment.",
            reason
        ));

        match self.api.final_report(&self.session.results).await {
            Ok(report) => {
                info!("✅ 最终报告生成成功: {} 字符", report.chars().count());
                self.candidate.show_message(&report);
                Some(report)
            }
            Err(e) => {
                warn!("❌ 最终报告生成失败: {}", e);
                let text = match e.server_message() {
                    Some(message) => format!("Error generating report: {}", message),
                    None => "Error generating report: Could not connect to the server.".to_string(),
                };
                self.candidate.show_message(&text);
                None
            }
        }
    }
}
