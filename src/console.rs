//! 控制台考生端
//!
//! 开发调试用的最小实现：标准输入驱动全部交互。没有媒体设备，
//! 搭配 [`NoDeviceCapture`] 使用，沟通和面试回合走权限被拒的
//! 降级路径。

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::candidate::{AptitudeReply, CandidatePort, CodingReply, IntroReply};
use crate::infrastructure::{CaptureSession, MediaCapture, MediaError};
use crate::models::{AptitudeQuestion, CodingProblem, Phase};

/// 标准输入输出考生端
pub struct ConsoleCandidate {
    input: Lines<BufReader<Stdin>>,
}

impl ConsoleCandidate {
    pub fn new() -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn read_line(&mut self) -> String {
        loop {
            match self.input.next_line().await {
                Ok(Some(line)) => return line.trim().to_string(),
                // 标准输入关闭后不再有输入，挂起等主计时器收尾
                _ => std::future::pending::<()>().await,
            }
        }
    }
}

impl Default for ConsoleCandidate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandidatePort for ConsoleCandidate {
    async fn confirm_begin(&mut self) {
        println!("按回车开始考试...");
        self.read_line().await;
    }

    async fn begin_round(&mut self, phase: Phase, briefing: &str) -> IntroReply {
        println!("\n=== {} ===", phase.name());
        println!("{}", briefing);
        println!("回车开始，输入 skip 跳过:");
        if self.read_line().await.eq_ignore_ascii_case("skip") {
            IntroReply::Skip
        } else {
            IntroReply::Start
        }
    }

    async fn aptitude_answer(
        &mut self,
        index: usize,
        total: usize,
        question: &AptitudeQuestion,
    ) -> AptitudeReply {
        println!("\nQuestion {} of {}", index + 1, total);
        println!("{}", question.question);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        loop {
            println!("输入选项编号，或 skip 跳过回合:");
            let line = self.read_line().await;
            if line.eq_ignore_ascii_case("skip") {
                return AptitudeReply::SkipRound;
            }
            if let Ok(n) = line.parse::<usize>() {
                if n >= 1 && n <= question.options.len() {
                    return AptitudeReply::Answer(question.options[n - 1].clone());
                }
            }
        }
    }

    async fn coding_action(
        &mut self,
        index: usize,
        total: usize,
        problem: &CodingProblem,
    ) -> CodingReply {
        println!("\nProblem {} of {}: {}", index + 1, total, problem.question_title);
        println!("{}", problem.problem_statement);
        if !problem.starter_code.is_empty() {
            println!("--- starter code ---\n{}", problem.starter_code);
        }
        println!("输入代码，单独一行 EOF 结束；首行输入 skip 跳过回合:");
        let mut lines: Vec<String> = Vec::new();
        loop {
            let line = self.read_line().await;
            if lines.is_empty() && line.eq_ignore_ascii_case("skip") {
                return CodingReply::SkipRound;
            }
            if line == "EOF" {
                return CodingReply::Run(lines.join("\n"));
            }
            lines.push(line);
        }
    }

    async fn coding_continue(&mut self, finished_last: bool) {
        if finished_last {
            println!("回车结束编程回合...");
        } else {
            println!("回车进入下一题...");
        }
        self.read_line().await;
    }

    async fn wait_stop_recording(&mut self) {
        println!("录音中，回车停止...");
        self.read_line().await;
    }

    fn show_message(&mut self, text: &str) {
        println!("{}", text);
    }

    fn show_run_results(&mut self, lines: &[String], all_passed: bool) {
        for line in lines {
            println!("{}", line);
        }
        println!("=> {}", if all_passed { "PASSED" } else { "FAILED" });
    }

    fn chat_message(&mut self, role: &str, content: &str) {
        println!("[{}] {}", role, content);
    }
}

/// 无媒体设备环境
///
/// acquire 永远失败，让回合走权限被拒的降级路径。
pub struct NoDeviceCapture;

#[async_trait]
impl MediaCapture for NoDeviceCapture {
    type Session = NullSession;

    async fn acquire(&self) -> Result<NullSession, MediaError> {
        Err(MediaError::NoDevice)
    }
}

pub struct NullSession;

#[async_trait]
impl CaptureSession for NullSession {
    fn start_recorder(&mut self) {}

    async fn sample_expression(&mut self) -> Option<String> {
        None
    }

    async fn stop(self) -> Vec<u8> {
        Vec::new()
    }
}
