//! 媒体采集 - 基础设施层
//!
//! 摄像头/麦克风是稀缺资源，本层只暴露能力：获取一次采集会话，
//! 录音、按固定间隔采样表情标签、统一停止。
//!
//! ## 统一拆除约定
//!
//! 录音器、表情采样循环、媒体轨道三者必须一起停止——任何路径
//! 都不允许只停其中一个。`record_cycle` 把三者的生命周期收拢在
//! 一个函数里；若外层在录制中途取消（回合被主计时器打断后丢弃
//! future），实现方必须在 Drop 中释放设备。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// 媒体采集错误
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("未检测到可用的摄像头/麦克风设备")]
    NoDevice,
    #[error("摄像头/麦克风权限被拒绝")]
    PermissionDenied,
    #[error("采集设备故障: {0}")]
    Device(String),
}

/// 一次完整录制的产物：音频数据加逐秒表情标签序列
#[derive(Debug, Clone, Default)]
pub struct Recording {
    /// webm 音频字节流
    pub audio_webm: Vec<u8>,
    /// 采样到的主导表情标签（happy / neutral / ...）
    pub expressions: Vec<String>,
}

impl Recording {
    pub fn is_empty(&self) -> bool {
        self.audio_webm.is_empty()
    }
}

/// 媒体采集设备
///
/// 每次录制重新 acquire；权限拒绝在这里暴露，由回合决定降级策略。
#[async_trait]
pub trait MediaCapture: Send + Sync {
    type Session: CaptureSession;

    async fn acquire(&self) -> Result<Self::Session, MediaError>;
}

/// 进行中的采集会话
///
/// 约定：实现必须在 Drop 时释放摄像头/麦克风，以覆盖录制中途
/// 被取消的路径。
#[async_trait]
pub trait CaptureSession: Send {
    /// 启动录音器
    fn start_recorder(&mut self);

    /// 对当前画面采样一次主导表情，无人脸时返回 None
    async fn sample_expression(&mut self) -> Option<String>;

    /// 停止录音器与媒体轨道，返回累积的音频
    async fn stop(self) -> Vec<u8>;
}

/// 执行一个完整的录制周期
///
/// 启动录音器和表情采样循环，直到出现下面任意一种情况再把
/// 三者一起停掉：
/// - `stop_signal` 完成（用户主动停止或主计时器到点）
/// - 达到 `limit`（沟通回合的 60 秒发言上限；面试回合无上限传 None）
pub async fn record_cycle<S>(
    mut session: S,
    limit: Option<Duration>,
    sample_every: Duration,
    stop_signal: impl std::future::Future<Output = ()>,
) -> Recording
where
    S: CaptureSession,
{
    session.start_recorder();

    let mut expressions = Vec::new();
    let mut ticker = tokio::time::interval(sample_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval 的第一跳是立即的，录制从第 1 秒才开始采样
    ticker.tick().await;

    let cap = tokio::time::sleep(limit.unwrap_or(Duration::MAX));
    tokio::pin!(cap);
    tokio::pin!(stop_signal);

    loop {
        // 固定优先级：同一时刻到点时停止信号和上限先于采样
        tokio::select! {
            biased;
            _ = &mut stop_signal => break,
            _ = &mut cap, if limit.is_some() => break,
            _ = ticker.tick() => {
                if let Some(label) = session.sample_expression().await {
                    expressions.push(label);
                }
            }
        }
    }

    let audio_webm = session.stop().await;
    debug!(
        "录制结束: 音频 {} 字节, 表情样本 {} 条",
        audio_webm.len(),
        expressions.len()
    );

    Recording {
        audio_webm,
        expressions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 固定返回同一表情的测试采集会话
    struct FixedSession {
        stopped: bool,
    }

    #[async_trait]
    impl CaptureSession for FixedSession {
        fn start_recorder(&mut self) {}

        async fn sample_expression(&mut self) -> Option<String> {
            Some("neutral".to_string())
        }

        async fn stop(mut self) -> Vec<u8> {
            self.stopped = true;
            vec![1, 2, 3]
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_cycle_samples_until_limit() {
        let session = FixedSession { stopped: false };
        let recording = record_cycle(
            session,
            Some(Duration::from_secs(5)),
            Duration::from_secs(1),
            std::future::pending(),
        )
        .await;

        assert_eq!(recording.audio_webm, vec![1, 2, 3]);
        // 5 秒上限、每秒一采样；到点那一秒上限优先，不再采样
        assert_eq!(recording.expressions.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_cycle_stop_signal_wins() {
        let session = FixedSession { stopped: false };
        let recording = record_cycle(
            session,
            Some(Duration::from_secs(60)),
            Duration::from_secs(1),
            tokio::time::sleep(Duration::from_secs(2)),
        )
        .await;

        assert!(!recording.is_empty());
        // 第 2 秒停止信号优先于采样，只留第 1 秒的样本
        assert_eq!(recording.expressions.len(), 1);
    }
}
