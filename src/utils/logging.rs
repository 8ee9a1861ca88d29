//! 日志工具

use std::io::Write;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{EndReason, SessionState};

/// 初始化 tracing 日志
///
/// 详细模式默认 debug 级别（含每次请求的 📤 日志），否则 info；
/// RUST_LOG 环境变量优先。
pub fn init(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// 初始化会话日志文件，写入带时间戳的头部
pub fn init_log_file(path: &str) -> AppResult<()> {
    let mut file = std::fs::File::create(path)
        .map_err(|e| AppError::file_read_failed(path, e))?;
    writeln!(file, "{}", "=".repeat(60))?;
    writeln!(file, "Prepmate 模拟考试会话日志")?;
    writeln!(
        file,
        "开始时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(file, "{}", "=".repeat(60))?;
    Ok(())
}

/// 打印会话启动横幅
pub fn log_session_start(config: &Config) {
    tracing::info!("{}", "=".repeat(60));
    tracing::info!("🚀 模拟考试会话启动");
    tracing::info!("  后端地址: {}", config.api_base_url);
    tracing::info!("  编程语言: {}", config.coding_language);
    tracing::info!(
        "  简历: {}",
        config.resume_path.as_deref().unwrap_or("(未提供)")
    );
    tracing::info!(
        "  回合时长: 行测 {}s / 沟通 {}s / 编程 {}s / 面试 {}s",
        config.aptitude_duration_secs,
        config.communication_duration_secs,
        config.coding_duration_secs,
        config.interview_duration_secs
    );
    tracing::info!("{}", "=".repeat(60));
}

/// 打印会话结束汇总
pub fn log_session_summary(session: &SessionState, reason: &EndReason, report_ok: bool) {
    let results = &session.results;
    tracing::info!("{}", "=".repeat(60));
    tracing::info!("📊 会话结束: {}", reason);
    tracing::info!(
        "  行测: {} 题, 正确率 {}%",
        results.aptitude.len(),
        results.aptitude_accuracy()
    );
    tracing::info!(
        "  沟通: {}",
        results
            .communication
            .as_deref()
            .map(|f| truncate_text(f, 50))
            .unwrap_or_else(|| "(未完成)".to_string())
    );
    tracing::info!("  编程: {} 题", results.coding.len());
    tracing::info!("  面试: {} 条对话", results.interview.len());
    tracing::info!("  切屏警告: {} 次", session.warnings);
    if report_ok {
        tracing::info!("✅ 最终报告已生成");
    } else {
        tracing::info!("❌ 最终报告生成失败");
    }
    tracing::info!("{}", "=".repeat(60));
}

/// 按字符数截断文本，超长时追加省略号
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}
