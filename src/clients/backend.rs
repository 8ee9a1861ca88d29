//! 后端 API 客户端
//!
//! 所有题目获取、代码判题、语音反馈、面试对话和最终报告都由同一个
//! 远端服务提供。每个接口要么返回业务载荷，要么返回 `{"error": "..."}`；
//! 客户端统一把后者转成 [`ApiError::BadResponse`]，原文留给上层展示。

use async_trait::async_trait;
use reqwest::multipart;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    AllRoundResults, AptitudeQuestion, ChatMessage, CodingLanguage, CodingProblem,
};

/// 面试回合的三个对话接口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewEndpoint {
    /// HR 面（开场、优缺点、收尾）
    Hr,
    /// 简历面（需要 resume_text）
    Resume,
    /// 管理面（行为问题）
    Managerial,
}

impl InterviewEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            InterviewEndpoint::Hr => "/hr-conversation",
            InterviewEndpoint::Resume => "/resume-conversation",
            InterviewEndpoint::Managerial => "/managerial-conversation",
        }
    }
}

/// 面试单轮响应
#[derive(Debug, Clone, Default)]
pub struct InterviewTurn {
    /// 考生回答的转写文本（无音频时为 None）
    pub user_transcript: Option<String>,
    /// 面试官的回复
    pub ai_response: Option<String>,
    /// 服务端维护的完整对话历史，覆盖本地副本
    pub updated_history: Vec<ChatMessage>,
    /// 服务端判定面试已结束
    pub session_complete: bool,
}

/// 后端接口抽象
///
/// 会话编排器只依赖这个 trait，测试用脚本化的假实现替换真实 HTTP 客户端。
#[async_trait]
pub trait BackendApi: Send + Sync + 'static {
    /// 获取一道行测题
    async fn aptitude_question(&self, topic: &str) -> AppResult<AptitudeQuestion>;

    /// 提交行测结果，换取文字反馈
    async fn aptitude_feedback(&self, results: &[crate::models::AptitudeResult])
        -> AppResult<String>;

    /// 获取沟通回合话题
    async fn communication_topic(&self) -> AppResult<String>;

    /// 提交沟通回合录音与表情序列，换取反馈
    async fn communication_feedback(
        &self,
        topic: &str,
        audio_webm: Vec<u8>,
        expressions: &[String],
    ) -> AppResult<String>;

    /// 获取一道编程题
    async fn technical_question(
        &self,
        topic: &str,
        language: CodingLanguage,
    ) -> AppResult<CodingProblem>;

    /// 远端执行考生代码，返回逐用例结果行
    async fn run_code(
        &self,
        user_code: &str,
        language: CodingLanguage,
        test_cases: &Value,
    ) -> AppResult<Vec<String>>;

    /// 上传简历 PDF，返回解析出的文本
    async fn upload_resume(&self, file_name: &str, pdf: Vec<u8>) -> AppResult<String>;

    /// 面试单轮对话
    async fn interview_turn(
        &self,
        endpoint: InterviewEndpoint,
        history: &[ChatMessage],
        resume_text: Option<&str>,
        answer: Option<(Vec<u8>, Vec<String>)>,
    ) -> AppResult<InterviewTurn>;

    /// 提交全部回合结果，生成最终报告
    async fn final_report(&self, results: &AllRoundResults) -> AppResult<String>;
}

/// 真实 HTTP 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// 发送 JSON POST 请求并检查错误信封
    async fn post_json(&self, endpoint: &str, body: Value) -> AppResult<Value> {
        debug!("📤 POST {}", endpoint);
        let response = self
            .http
            .post(self.url(endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let value: Value = response
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        check_envelope(endpoint, value)
    }

    /// 发送 multipart POST 请求并检查错误信封
    async fn post_multipart(&self, endpoint: &str, form: multipart::Form) -> AppResult<Value> {
        debug!("📤 POST {} (multipart)", endpoint);
        let response = self
            .http
            .post(self.url(endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let value: Value = response
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        check_envelope(endpoint, value)
    }

    /// 从响应里取出必填的字符串字段
    fn required_str(endpoint: &str, value: &Value, field: &str) -> AppResult<String> {
        value
            .get(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::Api(crate::error::ApiError::EmptyResponse {
                    endpoint: endpoint.to_string(),
                })
            })
    }

    fn audio_part(audio_webm: Vec<u8>) -> AppResult<multipart::Part> {
        multipart::Part::bytes(audio_webm)
            .file_name("answer.webm")
            .mime_str("audio/webm")
            .map_err(|e| AppError::api_request_failed("audio_file", e))
    }
}

/// 检查 `{"error": "..."}` 错误信封
///
/// 后端约定：任何接口出错时在 200 响应里带 error 字段。
fn check_envelope(endpoint: &str, value: Value) -> AppResult<Value> {
    if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
        warn!("⚠️ 服务端返回业务错误 ({}): {}", endpoint, message);
        return Err(AppError::api_error(endpoint, message));
    }
    Ok(value)
}

#[async_trait]
impl BackendApi for ApiClient {
    async fn aptitude_question(&self, topic: &str) -> AppResult<AptitudeQuestion> {
        let value = self
            .post_json("/aptitude-question", json!({ "topic": topic }))
            .await?;
        let question: AptitudeQuestion = serde_json::from_value(value)?;
        debug!("✓ 行测题获取成功: {} 个选项", question.options.len());
        Ok(question)
    }

    async fn aptitude_feedback(
        &self,
        results: &[crate::models::AptitudeResult],
    ) -> AppResult<String> {
        let value = self
            .post_json(
                "/aptitude-feedback",
                json!({ "results": serde_json::to_value(results)? }),
            )
            .await?;
        Self::required_str("/aptitude-feedback", &value, "feedback")
    }

    async fn communication_topic(&self) -> AppResult<String> {
        let endpoint = "/communication-topic";
        debug!("📤 GET {}", endpoint);
        let response = self
            .http
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        let value = check_envelope(endpoint, value)?;
        Self::required_str(endpoint, &value, "topic")
    }

    async fn communication_feedback(
        &self,
        topic: &str,
        audio_webm: Vec<u8>,
        expressions: &[String],
    ) -> AppResult<String> {
        let endpoint = "/communication-feedback";
        let form = multipart::Form::new()
            .part("audio_file", Self::audio_part(audio_webm)?)
            .text("question", topic.to_string())
            .text("expressions", serde_json::to_string(expressions)?);
        let value = self.post_multipart(endpoint, form).await?;
        Self::required_str(endpoint, &value, "feedback")
    }

    async fn technical_question(
        &self,
        topic: &str,
        language: CodingLanguage,
    ) -> AppResult<CodingProblem> {
        let value = self
            .post_json(
                "/technical-question",
                json!({ "topic": topic, "language": language.api_name() }),
            )
            .await?;
        let problem: CodingProblem = serde_json::from_value(value)?;
        info!("✓ 编程题获取成功: {}", problem.question_title);
        Ok(problem)
    }

    async fn run_code(
        &self,
        user_code: &str,
        language: CodingLanguage,
        test_cases: &Value,
    ) -> AppResult<Vec<String>> {
        let value = self
            .post_json(
                "/run-code",
                json!({
                    "user_code": user_code,
                    "language": language.api_name(),
                    "test_cases": test_cases,
                }),
            )
            .await?;
        let lines: Vec<String> = value
            .get("results")
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?
            .unwrap_or_default();
        Ok(lines)
    }

    async fn upload_resume(&self, file_name: &str, pdf: Vec<u8>) -> AppResult<String> {
        let endpoint = "/upload-practice-resume";
        let part = multipart::Part::bytes(pdf)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        let form = multipart::Form::new().part("resume_file", part);
        let value = self.post_multipart(endpoint, form).await?;
        Self::required_str(endpoint, &value, "resume_text")
    }

    async fn interview_turn(
        &self,
        endpoint: InterviewEndpoint,
        history: &[ChatMessage],
        resume_text: Option<&str>,
        answer: Option<(Vec<u8>, Vec<String>)>,
    ) -> AppResult<InterviewTurn> {
        let path = endpoint.path();
        let mut form = multipart::Form::new()
            .text("conversation_history", serde_json::to_string(history)?);
        if let Some(text) = resume_text {
            form = form.text("resume_text", text.to_string());
        }
        if let Some((audio_webm, expressions)) = answer {
            form = form
                .part("audio_file", Self::audio_part(audio_webm)?)
                .text("expressions", serde_json::to_string(&expressions)?);
        }

        let value = self.post_multipart(path, form).await?;

        let updated_history: Vec<ChatMessage> = value
            .get("updated_history")
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?
            .unwrap_or_default();
        Ok(InterviewTurn {
            user_transcript: value
                .get("user_transcript")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            ai_response: value
                .get("ai_response")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            updated_history,
            session_complete: value
                .get("session_complete")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        })
    }

    async fn final_report(&self, results: &AllRoundResults) -> AppResult<String> {
        let endpoint = "/generate-final-report";
        info!("📊 提交全部回合结果生成最终报告...");
        let value = self
            .post_json(
                endpoint,
                json!({ "all_round_results": serde_json::to_value(results)? }),
            )
            .await?;
        Self::required_str(endpoint, &value, "report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_envelope_extracts_error() {
        let err = check_envelope("/run-code", json!({ "error": "Code timed out" }))
            .expect_err("应当识别错误信封");
        assert_eq!(err.server_message(), Some("Code timed out"));
    }

    #[test]
    fn test_check_envelope_passes_payload() {
        let value = check_envelope("/communication-topic", json!({ "topic": "Remote work" }))
            .expect("正常载荷不应报错");
        assert_eq!(value["topic"], "Remote work");
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new("http://localhost:5000/");
        assert_eq!(client.url("/run-code"), "http://localhost:5000/run-code");
    }

    /// 需要真实后端，默认跳过
    #[tokio::test]
    #[ignore]
    async fn test_live_aptitude_question() {
        let client = ApiClient::new("https://prepmate-backend-x77z.onrender.com");
        let question = client.aptitude_question("Mix").await.expect("获取行测题失败");
        assert!(!question.question.is_empty());
        assert!(question.options.len() >= 2);
    }
}
