//! 整场会话集成测试
//!
//! 用脚本化的考生、假后端和假媒体设备驱动完整流程，
//! 时钟全部走暂停模式，虚拟时间自动推进。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use prepmate_session::candidate::{AptitudeReply, CandidatePort, CodingReply, IntroReply};
use prepmate_session::clients::{BackendApi, InterviewEndpoint, InterviewTurn};
use prepmate_session::error::{AppError, AppResult};
use prepmate_session::infrastructure::{CaptureSession, MediaCapture, MediaError};
use prepmate_session::models::{
    AllRoundResults, AptitudeQuestion, AptitudeResult, ChatMessage, CodingLanguage,
    CodingProblem, CodingStatus, EndReason, Phase,
};
use prepmate_session::services::{visibility_channel, VisibilityEvent};
use prepmate_session::{Config, SessionRunner};

// ========== 假后端 ==========

#[derive(Default)]
struct ApiLog {
    aptitude_calls: AtomicUsize,
    aptitude_fail: AtomicBool,
    /// 第 N 次行测题请求永远不返回（0 表示不启用）
    aptitude_hang_call: AtomicUsize,
    run_code_lines: Mutex<Vec<String>>,
    feedback_results: Mutex<Option<Vec<AptitudeResult>>>,
    report_payload: Mutex<Option<AllRoundResults>>,
    interview_endpoints: Mutex<Vec<InterviewEndpoint>>,
    /// 展示与请求的交错顺序（show:Qn / fetch:n）
    events: Mutex<Vec<String>>,
}

#[derive(Clone)]
struct FakeApi {
    log: Arc<ApiLog>,
}

impl FakeApi {
    fn new() -> Self {
        let log = ApiLog::default();
        *log.run_code_lines.lock().unwrap() = vec!["Test 1: PASSED".to_string()];
        Self { log: Arc::new(log) }
    }
}

#[async_trait]
impl BackendApi for FakeApi {
    async fn aptitude_question(&self, _topic: &str) -> AppResult<AptitudeQuestion> {
        if self.log.aptitude_fail.load(Ordering::SeqCst) {
            return Err(AppError::api_error("/aptitude-question", "llm unavailable"));
        }
        let n = self.log.aptitude_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.events.lock().unwrap().push(format!("fetch:{}", n));
        if self.log.aptitude_hang_call.load(Ordering::SeqCst) == n {
            std::future::pending::<()>().await;
        }
        Ok(AptitudeQuestion {
            question: format!("Q{}", n),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: "A".to_string(),
        })
    }

    async fn aptitude_feedback(&self, results: &[AptitudeResult]) -> AppResult<String> {
        *self.log.feedback_results.lock().unwrap() = Some(results.to_vec());
        Ok("Solid fundamentals.".to_string())
    }

    async fn communication_topic(&self) -> AppResult<String> {
        Ok("Remote work".to_string())
    }

    async fn communication_feedback(
        &self,
        _topic: &str,
        audio_webm: Vec<u8>,
        _expressions: &[String],
    ) -> AppResult<String> {
        assert!(!audio_webm.is_empty(), "不应提交空音频");
        Ok("Good pacing.".to_string())
    }

    async fn technical_question(
        &self,
        topic: &str,
        _language: CodingLanguage,
    ) -> AppResult<CodingProblem> {
        Ok(CodingProblem {
            question_title: topic.to_string(),
            problem_statement: "Do the thing.".to_string(),
            starter_code: String::new(),
            test_cases: Value::Null,
        })
    }

    async fn run_code(
        &self,
        _user_code: &str,
        _language: CodingLanguage,
        _test_cases: &Value,
    ) -> AppResult<Vec<String>> {
        Ok(self.log.run_code_lines.lock().unwrap().clone())
    }

    async fn upload_resume(&self, _file_name: &str, _pdf: Vec<u8>) -> AppResult<String> {
        Ok("PARSED RESUME TEXT".to_string())
    }

    async fn interview_turn(
        &self,
        endpoint: InterviewEndpoint,
        history: &[ChatMessage],
        resume_text: Option<&str>,
        answer: Option<(Vec<u8>, Vec<String>)>,
    ) -> AppResult<InterviewTurn> {
        if endpoint == InterviewEndpoint::Resume {
            assert!(resume_text.is_some(), "简历面必须带简历文本");
        }
        let mut endpoints = self.log.interview_endpoints.lock().unwrap();
        endpoints.push(endpoint);
        let n = endpoints.len();
        drop(endpoints);

        let mut updated: Vec<ChatMessage> = history.to_vec();
        let user_transcript = answer.map(|_| "my answer".to_string());
        if let Some(transcript) = &user_transcript {
            updated.push(ChatMessage::new("user", transcript.clone()));
        }
        let ai_response = format!("Interview question {}", n);
        updated.push(ChatMessage::new("ai", ai_response.clone()));
        Ok(InterviewTurn {
            user_transcript,
            ai_response: Some(ai_response),
            updated_history: updated,
            session_complete: false,
        })
    }

    async fn final_report(&self, results: &AllRoundResults) -> AppResult<String> {
        *self.log.report_payload.lock().unwrap() = Some(results.clone());
        Ok("FINAL REPORT".to_string())
    }
}

// ========== 脚本化考生 ==========

struct ScriptedCandidate {
    correct: usize,
    answered: usize,
    hang_on_aptitude: bool,
    hang_on_coding: bool,
    hidden_events: usize,
    visibility_tx: Option<mpsc::UnboundedSender<VisibilityEvent>>,
    events_sent: bool,
    messages: Arc<Mutex<Vec<String>>>,
    chat: Arc<Mutex<Vec<(String, String)>>>,
    /// 与假后端共享的事件日志，记录题目展示时刻
    api_log: Option<Arc<ApiLog>>,
}

impl ScriptedCandidate {
    fn new(correct: usize) -> Self {
        Self {
            correct,
            answered: 0,
            hang_on_aptitude: false,
            hang_on_coding: false,
            hidden_events: 0,
            visibility_tx: None,
            events_sent: false,
            messages: Arc::new(Mutex::new(Vec::new())),
            chat: Arc::new(Mutex::new(Vec::new())),
            api_log: None,
        }
    }
}

#[async_trait]
impl CandidatePort for ScriptedCandidate {
    async fn confirm_begin(&mut self) {}

    async fn begin_round(&mut self, _phase: Phase, _briefing: &str) -> IntroReply {
        IntroReply::Start
    }

    async fn aptitude_answer(
        &mut self,
        _index: usize,
        _total: usize,
        question: &AptitudeQuestion,
    ) -> AptitudeReply {
        if let Some(log) = &self.api_log {
            log.events
                .lock()
                .unwrap()
                .push(format!("show:{}", question.question));
        }
        if !self.events_sent && self.hidden_events > 0 {
            self.events_sent = true;
            if let Some(tx) = &self.visibility_tx {
                for _ in 0..self.hidden_events {
                    let _ = tx.send(VisibilityEvent::Hidden);
                    let _ = tx.send(VisibilityEvent::Visible);
                }
            }
        }
        // 让出一次调度，保证监考器看到刚投递的事件
        tokio::task::yield_now().await;
        if self.hang_on_aptitude {
            std::future::pending::<()>().await;
        }
        self.answered += 1;
        if self.answered <= self.correct {
            AptitudeReply::Answer(question.correct_answer.clone())
        } else {
            AptitudeReply::Answer("WRONG".to_string())
        }
    }

    async fn coding_action(
        &mut self,
        _index: usize,
        _total: usize,
        _problem: &CodingProblem,
    ) -> CodingReply {
        if self.hang_on_coding {
            std::future::pending::<()>().await;
        }
        CodingReply::Run("print(42)".to_string())
    }

    async fn coding_continue(&mut self, _finished_last: bool) {}

    async fn wait_stop_recording(&mut self) {}

    fn show_message(&mut self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }

    fn show_run_results(&mut self, _lines: &[String], _all_passed: bool) {}

    fn chat_message(&mut self, role: &str, content: &str) {
        self.chat
            .lock()
            .unwrap()
            .push((role.to_string(), content.to_string()));
    }
}

// ========== 假媒体设备 ==========

struct FakeMedia;
struct FakeSession;

#[async_trait]
impl CaptureSession for FakeSession {
    fn start_recorder(&mut self) {}

    async fn sample_expression(&mut self) -> Option<String> {
        Some("neutral".to_string())
    }

    async fn stop(self) -> Vec<u8> {
        vec![9; 16]
    }
}

#[async_trait]
impl MediaCapture for FakeMedia {
    type Session = FakeSession;

    async fn acquire(&self) -> Result<FakeSession, MediaError> {
        Ok(FakeSession)
    }
}

fn test_config() -> Config {
    Config {
        output_log_file: String::new(),
        ..Config::default()
    }
}

// ========== 测试 ==========

#[tokio::test(start_paused = true)]
async fn test_full_session_completes() {
    let api = FakeApi::new();
    let log = api.log.clone();
    let candidate = ScriptedCandidate::new(15);
    let (_tx, proctor) = visibility_channel(3);

    let runner = SessionRunner::new(api, candidate, FakeMedia, proctor, test_config());
    let report = runner.run().await.expect("会话不应出错");

    assert_eq!(report.reason, EndReason::Completed);
    assert_eq!(report.report.as_deref(), Some("FINAL REPORT"));

    let results = &report.state.results;
    assert_eq!(results.aptitude.len(), 20);
    assert_eq!(results.aptitude_accuracy(), 75);
    assert_eq!(results.communication.as_deref(), Some("Good pacing."));
    assert_eq!(results.coding.len(), 2);
    assert!(results
        .coding
        .iter()
        .all(|r| r.status == CodingStatus::Passed));
    assert!(!results.interview.is_empty());

    // 每题恰好拉取一次，不多取
    assert_eq!(log.aptitude_calls.load(Ordering::SeqCst), 20);
    // 行测反馈收到全部 20 条记录
    let feedback = log.feedback_results.lock().unwrap();
    assert_eq!(feedback.as_ref().map(|r| r.len()), Some(20));
    // 无简历时第 2、3 轮退回 HR 面
    let endpoints = log.interview_endpoints.lock().unwrap();
    assert_eq!(
        *endpoints,
        vec![
            InterviewEndpoint::Hr,
            InterviewEndpoint::Hr,
            InterviewEndpoint::Hr,
            InterviewEndpoint::Managerial,
            InterviewEndpoint::Managerial,
            InterviewEndpoint::Hr,
        ]
    );
    // 报告载荷是完整的回合汇总
    let payload = log.report_payload.lock().unwrap();
    assert_eq!(payload.as_ref().map(|r| r.aptitude.len()), Some(20));
}

#[tokio::test(start_paused = true)]
async fn test_resume_routes_interview_to_resume_endpoints() {
    let resume_path = std::env::temp_dir().join("prepmate_test_resume.pdf");
    std::fs::write(&resume_path, b"%PDF-1.4 fake").expect("写入临时简历失败");

    let api = FakeApi::new();
    let log = api.log.clone();
    let candidate = ScriptedCandidate::new(20);
    let messages = candidate.messages.clone();
    let (_tx, proctor) = visibility_channel(3);
    let config = Config {
        resume_path: Some(resume_path.to_string_lossy().into_owned()),
        ..test_config()
    };

    let runner = SessionRunner::new(api, candidate, FakeMedia, proctor, config);
    let report = runner.run().await.expect("会话不应出错");

    assert_eq!(report.reason, EndReason::Completed);
    assert_eq!(report.state.resume_text.as_deref(), Some("PARSED RESUME TEXT"));
    assert!(messages
        .lock()
        .unwrap()
        .iter()
        .any(|m| m == "✅ Resume Uploaded!"));

    let endpoints = log.interview_endpoints.lock().unwrap();
    assert_eq!(
        *endpoints,
        vec![
            InterviewEndpoint::Hr,
            InterviewEndpoint::Resume,
            InterviewEndpoint::Resume,
            InterviewEndpoint::Managerial,
            InterviewEndpoint::Managerial,
            InterviewEndpoint::Hr,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_three_tab_switches_end_test() {
    let api = FakeApi::new();
    let mut candidate = ScriptedCandidate::new(20);
    candidate.hang_on_aptitude = true;
    candidate.hidden_events = 3;
    let (tx, proctor) = visibility_channel(3);
    candidate.visibility_tx = Some(tx);

    let runner = SessionRunner::new(api, candidate, FakeMedia, proctor, test_config());
    let report = runner.run().await.expect("会话不应出错");

    assert_eq!(report.reason, EndReason::TabSwitchLimit);
    assert_eq!(report.state.warnings, 3);
    // 强制结束也要带着已有结果生成报告
    assert_eq!(report.report.as_deref(), Some("FINAL REPORT"));
}

#[tokio::test(start_paused = true)]
async fn test_two_tab_switches_only_warn() {
    let api = FakeApi::new();
    let mut candidate = ScriptedCandidate::new(20);
    candidate.hidden_events = 2;
    let (tx, proctor) = visibility_channel(3);
    candidate.visibility_tx = Some(tx);

    let runner = SessionRunner::new(api, candidate, FakeMedia, proctor, test_config());
    let report = runner.run().await.expect("会话不应出错");

    assert_eq!(report.reason, EndReason::Completed);
    assert_eq!(report.state.warnings, 2);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_records_unfinished_work() {
    let api = FakeApi::new();
    let mut candidate = ScriptedCandidate::new(20);
    candidate.hang_on_aptitude = true;
    candidate.hang_on_coding = true;
    let (_tx, proctor) = visibility_channel(3);

    let runner = SessionRunner::new(api, candidate, FakeMedia, proctor, test_config());
    let report = runner.run().await.expect("会话不应出错");

    // 超时不是违规，四个回合依次走完
    assert_eq!(report.reason, EndReason::Completed);

    let results = &report.state.results;
    // 行测超时：当前题记未作答
    assert_eq!(results.aptitude.len(), 1);
    assert_eq!(results.aptitude[0].user_answer, None);
    assert!(!results.aptitude[0].is_correct);
    // 编程超时：当前题记未完成
    assert_eq!(results.coding.len(), 1);
    assert_eq!(results.coding[0].status, CodingStatus::Incomplete);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_while_loading_does_not_duplicate_record() {
    let api = FakeApi::new();
    // 第 2 题永远加载不出来，回合只能等到超时
    api.log.aptitude_hang_call.store(2, Ordering::SeqCst);
    let log = api.log.clone();
    let candidate = ScriptedCandidate::new(20);
    let (_tx, proctor) = visibility_channel(3);

    let runner = SessionRunner::new(api, candidate, FakeMedia, proctor, test_config());
    let report = runner.run().await.expect("会话不应出错");

    assert_eq!(report.reason, EndReason::Completed);
    // 第 1 题已作答，超时收尾不得把它再记一次
    let aptitude = &report.state.results.aptitude;
    assert_eq!(aptitude.len(), 1);
    assert_eq!(aptitude[0].question, "Q1");
    assert_eq!(aptitude[0].user_answer.as_deref(), Some("A"));
    assert!(aptitude[0].is_correct);
    // 反馈载荷与结果记录一致
    let feedback = log.feedback_results.lock().unwrap();
    assert_eq!(feedback.as_ref().map(|r| r.len()), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_prefetch_issued_after_question_displayed() {
    let api = FakeApi::new();
    let log = api.log.clone();
    let mut candidate = ScriptedCandidate::new(20);
    candidate.api_log = Some(log.clone());
    let (_tx, proctor) = visibility_channel(3);

    let runner = SessionRunner::new(api, candidate, FakeMedia, proctor, test_config());
    let report = runner.run().await.expect("会话不应出错");
    assert_eq!(report.reason, EndReason::Completed);

    // 第 n+1 题的预取必须发生在第 n 题展示之后
    let events = log.events.lock().unwrap();
    for n in 2..=20usize {
        let fetch_pos = events
            .iter()
            .position(|e| e == &format!("fetch:{}", n))
            .expect("缺少请求记录");
        let show_pos = events
            .iter()
            .position(|e| e == &format!("show:Q{}", n - 1))
            .expect("缺少展示记录");
        assert!(
            fetch_pos > show_pos,
            "第 {} 题的预取先于第 {} 题的展示",
            n,
            n - 1
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_aptitude_load_failure_ends_test() {
    let api = FakeApi::new();
    api.log.aptitude_fail.store(true, Ordering::SeqCst);
    let candidate = ScriptedCandidate::new(20);
    let messages = candidate.messages.clone();
    let (_tx, proctor) = visibility_channel(3);

    let runner = SessionRunner::new(api, candidate, FakeMedia, proctor, test_config());
    let report = runner.run().await.expect("会话不应出错");

    assert_eq!(report.reason, EndReason::AptitudeLoadFailed);
    assert!(report.state.results.aptitude.is_empty());
    assert!(messages
        .lock()
        .unwrap()
        .iter()
        .any(|m| m == "⚠️ Server not responding."));
    // 结束后仍然生成报告
    assert_eq!(report.report.as_deref(), Some("FINAL REPORT"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_coding_attempt_still_advances() {
    let api = FakeApi::new();
    *api.log.run_code_lines.lock().unwrap() =
        vec!["Test 1: FAILED (expected 3, got 4)".to_string()];
    let candidate = ScriptedCandidate::new(20);
    let messages = candidate.messages.clone();
    let (_tx, proctor) = visibility_channel(3);

    let runner = SessionRunner::new(api, candidate, FakeMedia, proctor, test_config());
    let report = runner.run().await.expect("会话不应出错");

    assert_eq!(report.reason, EndReason::Completed);
    let results = &report.state.results;
    assert_eq!(results.coding.len(), 2);
    assert!(results
        .coding
        .iter()
        .all(|r| r.status == CodingStatus::Failed));
    assert!(messages
        .lock()
        .unwrap()
        .iter()
        .any(|m| m == "Some test cases failed. Your attempt has been recorded."));
}
