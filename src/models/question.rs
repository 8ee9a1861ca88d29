//! 后端题目载荷模型

use serde::{Deserialize, Serialize};

/// 行测题（/aptitude-question 响应）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AptitudeQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// 编程题（/technical-question 响应）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingProblem {
    pub question_title: String,
    pub problem_statement: String,
    /// 起始代码可能缺失，缺失时按空串处理
    #[serde(default)]
    pub starter_code: String,
    /// 测试用例原样回传给 /run-code，结构由后端约定
    #[serde(default)]
    pub test_cases: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coding_problem_missing_starter_code() {
        let p: CodingProblem = serde_json::from_str(
            r#"{"question_title": "Two Sum", "problem_statement": "..."}"#,
        )
        .expect("解析失败");
        assert_eq!(p.starter_code, "");
        assert!(p.test_cases.is_null());
    }
}
