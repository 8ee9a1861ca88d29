//! 切屏监考
//!
//! 宿主环境（浏览器壳、桌面端）把窗口可见性变化投递到通道；
//! 监考器在正式回合内累计隐藏事件，第三次直接结束考试。
//! 过场界面不计数：回合开始时 `arm` 清掉积压事件。

use tokio::sync::mpsc;
use tracing::warn;

use crate::models::EndReason;

/// 窗口可见性事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityEvent {
    /// 考试页面被切走
    Hidden,
    /// 切回考试页面
    Visible,
}

/// 创建可见性事件通道与监考器
pub fn visibility_channel(limit: u8) -> (mpsc::UnboundedSender<VisibilityEvent>, ProctorMonitor) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        tx,
        ProctorMonitor {
            rx,
            warnings: 0,
            limit,
        },
    )
}

/// 监考器
///
/// 警告次数跨回合累计，一场会话只建一个。
pub struct ProctorMonitor {
    rx: mpsc::UnboundedReceiver<VisibilityEvent>,
    warnings: u8,
    limit: u8,
}

impl ProctorMonitor {
    /// 回合开始前丢弃过场期间积压的事件
    pub fn arm(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }

    pub fn warnings(&self) -> u8 {
        self.warnings
    }

    /// 等待警告次数达到上限
    ///
    /// 和回合主体 select 竞争：本 future 先完成意味着考试被强制
    /// 结束。通道关闭（宿主无可见性事件源）时永远挂起。
    pub async fn breached(&mut self) -> EndReason {
        loop {
            match self.rx.recv().await {
                Some(VisibilityEvent::Hidden) => {
                    self.warnings += 1;
                    warn!(
                        "⚠️ Warning {}: You have left the test tab. The test will end after 3 warnings.",
                        self.warnings
                    );
                    if self.warnings >= self.limit {
                        return EndReason::TabSwitchLimit;
                    }
                }
                Some(VisibilityEvent::Visible) => {}
                None => std::future::pending::<()>().await,
            }
        }
    }
}
