//! 会话状态模型
//!
//! 原型实现用一个全局可变的 testState 对象加上小数编号
//! （1.5 表示回合间过场）来表示会话进度；这里改为由编排器
//! 独占持有的结构体和显式的阶段枚举。

use std::fmt::Display;

use crate::models::results::AllRoundResults;

/// 会话阶段
///
/// 转移严格向前；唯一的例外是 end_test，从任意考试中阶段
/// 直接跳到 Report。
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Phase {
    Setup,
    Ready,
    Aptitude,
    CommunicationIntro,
    Communication,
    CodingIntro,
    Coding,
    InterviewIntro,
    Interview,
    Report,
}

impl Phase {
    /// 获取阶段显示名称
    pub fn name(self) -> &'static str {
        match self {
            Phase::Setup => "Setup",
            Phase::Ready => "Ready",
            Phase::Aptitude => "Aptitude Test",
            Phase::CommunicationIntro => "Next Round: Communication",
            Phase::Communication => "Communication Test",
            Phase::CodingIntro => "Next Round: Coding",
            Phase::Coding => "Coding Test",
            Phase::InterviewIntro => "Next Round: Live Interview",
            Phase::Interview => "Live Interview",
            Phase::Report => "Report",
        }
    }

    /// 是否处于四个正式回合之一
    ///
    /// 监考只在正式回合内计数，过场界面不算。
    pub fn is_main_round(self) -> bool {
        matches!(
            self,
            Phase::Aptitude | Phase::Communication | Phase::Coding | Phase::Interview
        )
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 编程语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CodingLanguage {
    Python,
    Java,
}

impl CodingLanguage {
    /// 后端接口使用的语言标识
    pub fn api_name(self) -> &'static str {
        match self {
            CodingLanguage::Python => "python",
            CodingLanguage::Java => "java",
        }
    }

    /// 编辑器标签显示名称
    pub fn display_name(self) -> &'static str {
        match self {
            CodingLanguage::Python => "Python 3",
            CodingLanguage::Java => "Java",
        }
    }

    /// 从字符串解析语言，无法识别时回退 Python
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "java" => CodingLanguage::Java,
            _ => CodingLanguage::Python,
        }
    }
}

impl Display for CodingLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// 会话结束原因
///
/// Display 输出即展示给用户的原文案。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// 四个回合全部完成
    Completed,
    /// 切屏 3 次被强制结束
    TabSwitchLimit,
    /// 用户主动跳过剩余内容
    Skipped,
    /// 行测题目加载失败
    AptitudeLoadFailed,
}

impl Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            EndReason::Completed => "You have completed all rounds.",
            EndReason::TabSwitchLimit => "Test ended due to switching tabs 3 times.",
            EndReason::Skipped => "Test skipped.",
            EndReason::AptitudeLoadFailed => "Failed to load aptitude question.",
        };
        write!(f, "{}", text)
    }
}

/// 会话状态
///
/// 会话开始时创建一次，由各回合处理器顺序地原地修改，
/// 结束时整体交给最终报告接口。不做任何持久化。
#[derive(Debug, Clone)]
pub struct SessionState {
    /// 简历文本（上传并解析成功后填入）
    pub resume_text: Option<String>,
    /// 编程回合语言
    pub coding_language: CodingLanguage,
    /// 当前阶段
    pub phase: Phase,
    /// 切屏警告次数（0-3）
    pub warnings: u8,
    /// 各回合结果汇总
    pub results: AllRoundResults,
}

impl SessionState {
    pub fn new(coding_language: CodingLanguage) -> Self {
        Self {
            resume_text: None,
            coding_language,
            phase: Phase::Setup,
            warnings: 0,
            results: AllRoundResults::default(),
        }
    }
}
