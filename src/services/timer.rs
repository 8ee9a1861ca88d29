//! 回合主计时器
//!
//! 每个正式回合只有一个倒计时；回合内所有等待（作答、录音、
//! 网络请求）都和它 select 竞争。到点后只打断当前等待，回合
//! 收尾逻辑（记录未完成题目、提交已有录音）仍正常执行。

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep_until, Instant, Sleep};
use tracing::info;

/// 主计时器
///
/// 内部持有固定截止时刻的 Sleep，`expired` 可以在多处 select
/// 里反复 await 而不会重置倒计时。
pub struct MasterTimer {
    deadline: Pin<Box<Sleep>>,
}

impl MasterTimer {
    /// 从现在起倒计时
    pub fn start(duration: Duration) -> Self {
        info!("⏱️ 主计时器启动: {} 秒", duration.as_secs());
        Self {
            deadline: Box::pin(sleep_until(Instant::now() + duration)),
        }
    }

    /// 等待到点；已到点则立即完成
    pub async fn expired(&mut self) {
        self.deadline.as_mut().await;
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.deadline() <= Instant::now()
    }
}
