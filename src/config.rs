use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::session::Phase;

/// 程序配置文件
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// 远端后端基地址
    pub api_base_url: String,
    /// 编程回合语言（python / java）
    pub coding_language: String,
    /// 简历 PDF 路径（可选，不提供则跳过简历环节）
    pub resume_path: Option<String>,
    /// 行测回合题目数量
    pub aptitude_question_count: usize,
    /// 行测回合总时长（秒）
    pub aptitude_duration_secs: u64,
    /// 沟通回合总时长（秒）
    pub communication_duration_secs: u64,
    /// 编程回合总时长（秒）
    pub coding_duration_secs: u64,
    /// 面试回合总时长（秒）
    pub interview_duration_secs: u64,
    /// 沟通回合准备时间（秒）
    pub prep_duration_secs: u64,
    /// 沟通回合发言上限（秒）
    pub speak_duration_secs: u64,
    /// 表情采样间隔（秒）
    pub expression_sample_secs: u64,
    /// 编程回合题目数量
    pub coding_problem_count: usize,
    /// 面试回合轮次数量
    pub interview_turn_count: u32,
    /// 切屏警告上限（达到即强制结束）
    pub warning_limit: u8,
    /// 出错后自动进入下一回合的延迟（秒）
    pub error_advance_delay_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件（空字符串表示不写文件）
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://prepmate-backend-x77z.onrender.com".to_string(),
            coding_language: "python".to_string(),
            resume_path: None,
            aptitude_question_count: 20,
            aptitude_duration_secs: 30 * 60,
            communication_duration_secs: 2 * 60,
            coding_duration_secs: 45 * 60,
            interview_duration_secs: 20 * 60,
            prep_duration_secs: 15,
            speak_duration_secs: 60,
            expression_sample_secs: 1,
            coding_problem_count: 2,
            interview_turn_count: 6,
            warning_limit: 3,
            error_advance_delay_secs: 3,
            verbose_logging: false,
            output_log_file: "session_log.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            coding_language: std::env::var("CODING_LANGUAGE").unwrap_or(default.coding_language),
            resume_path: std::env::var("RESUME_PATH").ok().or(default.resume_path),
            aptitude_question_count: std::env::var("APTITUDE_QUESTION_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.aptitude_question_count),
            aptitude_duration_secs: std::env::var("APTITUDE_DURATION_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.aptitude_duration_secs),
            communication_duration_secs: std::env::var("COMMUNICATION_DURATION_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.communication_duration_secs),
            coding_duration_secs: std::env::var("CODING_DURATION_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.coding_duration_secs),
            interview_duration_secs: std::env::var("INTERVIEW_DURATION_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.interview_duration_secs),
            prep_duration_secs: std::env::var("PREP_DURATION_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.prep_duration_secs),
            speak_duration_secs: std::env::var("SPEAK_DURATION_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.speak_duration_secs),
            expression_sample_secs: std::env::var("EXPRESSION_SAMPLE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.expression_sample_secs),
            coding_problem_count: std::env::var("CODING_PROBLEM_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.coding_problem_count),
            interview_turn_count: std::env::var("INTERVIEW_TURN_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.interview_turn_count),
            warning_limit: std::env::var("WARNING_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.warning_limit),
            error_advance_delay_secs: std::env::var("ERROR_ADVANCE_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.error_advance_delay_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 从 TOML 文件加载配置
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let config: Config = toml::from_str(&text).map_err(|e| {
            AppError::Config(ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        Ok(config)
    }

    /// 加载配置：优先读取 prepmate.toml，不存在则回退到环境变量
    pub fn load() -> Self {
        let path = Path::new("prepmate.toml");
        if path.exists() {
            match Self::from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("⚠️ 配置文件加载失败，回退到环境变量: {}", e);
                }
            }
        }
        Self::from_env()
    }

    /// 回合对应的主计时器时长
    pub fn round_duration(&self, phase: Phase) -> Duration {
        let secs = match phase {
            Phase::Aptitude => self.aptitude_duration_secs,
            Phase::Communication => self.communication_duration_secs,
            Phase::Coding => self.coding_duration_secs,
            Phase::Interview => self.interview_duration_secs,
            // 过场界面没有主计时器
            _ => 0,
        };
        Duration::from_secs(secs)
    }

    pub fn prep_duration(&self) -> Duration {
        Duration::from_secs(self.prep_duration_secs)
    }

    pub fn speak_duration(&self) -> Duration {
        Duration::from_secs(self.speak_duration_secs)
    }

    pub fn expression_sample_interval(&self) -> Duration {
        Duration::from_secs(self.expression_sample_secs)
    }

    pub fn error_advance_delay(&self) -> Duration {
        Duration::from_secs(self.error_advance_delay_secs)
    }
}
