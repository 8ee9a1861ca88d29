//! 回合结果记录
//!
//! 字段名与后端 /generate-final-report 接口的 all_round_results
//! 载荷一一对应，整体序列化后直接提交。

use serde::{Deserialize, Serialize};

/// 行测回合单题结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AptitudeResult {
    pub question: String,
    /// 超时未作答时为 None（序列化为 null）
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

impl AptitudeResult {
    /// 按"所选答案与正确答案严格相等"判定
    pub fn record(question: &str, user_answer: Option<String>, correct_answer: &str) -> Self {
        let is_correct = user_answer.as_deref() == Some(correct_answer);
        Self {
            question: question.to_string(),
            user_answer,
            correct_answer: correct_answer.to_string(),
            is_correct,
        }
    }
}

/// 编程题提交状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodingStatus {
    Passed,
    Failed,
    /// 回合提前结束时当前题记为未完成
    Incomplete,
}

/// 编程回合单题结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingResult {
    pub question: String,
    pub user_code: String,
    pub status: CodingStatus,
}

/// 面试对话消息（role 为 system / user / ai）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// 全部回合结果汇总
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllRoundResults {
    pub aptitude: Vec<AptitudeResult>,
    /// 沟通回合产出单条反馈文本或错误文案
    pub communication: Option<String>,
    pub coding: Vec<CodingResult>,
    /// 面试回合产出完整对话记录
    pub interview: Vec<ChatMessage>,
}

impl AllRoundResults {
    /// 行测正确率（四舍五入到整数百分比；无记录时为 0）
    pub fn aptitude_accuracy(&self) -> u32 {
        if self.aptitude.is_empty() {
            return 0;
        }
        let correct = self.aptitude.iter().filter(|r| r.is_correct).count();
        ((correct as f64 / self.aptitude.len() as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_correct_follows_equality() {
        let r = AptitudeResult::record("1+1=?", Some("2".to_string()), "2");
        assert!(r.is_correct);
        let r = AptitudeResult::record("1+1=?", Some("3".to_string()), "2");
        assert!(!r.is_correct);
        // 未作答永远判错
        let r = AptitudeResult::record("1+1=?", None, "2");
        assert!(!r.is_correct);
    }

    #[test]
    fn test_accuracy_rounding() {
        let mut results = AllRoundResults::default();
        for i in 0..20 {
            results.aptitude.push(AptitudeResult::record(
                "q",
                Some(if i < 15 { "a" } else { "b" }.to_string()),
                "a",
            ));
        }
        assert_eq!(results.aptitude_accuracy(), 75);
    }

    #[test]
    fn test_accuracy_empty_is_zero() {
        assert_eq!(AllRoundResults::default().aptitude_accuracy(), 0);
    }

    #[test]
    fn test_payload_shape() {
        let mut results = AllRoundResults::default();
        results.aptitude.push(AptitudeResult::record("q", None, "a"));
        results.coding.push(CodingResult {
            question: "Two Sum".to_string(),
            user_code: "pass".to_string(),
            status: CodingStatus::Failed,
        });
        results.interview.push(ChatMessage::new("ai", "Tell me about yourself."));

        let value = serde_json::to_value(&results).expect("序列化失败");
        assert!(value["aptitude"][0]["user_answer"].is_null());
        assert_eq!(value["aptitude"][0]["is_correct"], false);
        assert_eq!(value["coding"][0]["status"], "Failed");
        assert!(value["communication"].is_null());
        assert_eq!(value["interview"][0]["role"], "ai");
    }
}
