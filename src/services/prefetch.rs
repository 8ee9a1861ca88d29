//! 预取槽
//!
//! 行测和编程回合都在考生作答当前题时后台拉取下一题。原型实现
//! 用 isFetching 布尔旗标加轮询等待；这里改成持有后台任务句柄的
//! 槽位，取结果时要么立即命中，要么 await 到任务完成。

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{AppError, AppResult};

enum SlotState<T> {
    /// 没有在途任务
    Idle,
    /// 后台任务已启动（取结果时可能已完成）
    InFlight(JoinHandle<AppResult<T>>),
}

/// 单槽预取
pub struct PrefetchSlot<T: Send + 'static> {
    state: SlotState<T>,
}

impl<T: Send + 'static> PrefetchSlot<T> {
    pub fn new() -> Self {
        Self {
            state: SlotState::Idle,
        }
    }

    /// 启动一次后台预取；槽位已占用时忽略本次请求
    pub fn begin<F>(&mut self, fut: F)
    where
        F: std::future::Future<Output = AppResult<T>> + Send + 'static,
    {
        match self.state {
            SlotState::Idle => {
                self.state = SlotState::InFlight(tokio::spawn(fut));
            }
            _ => {
                debug!("预取槽已占用，忽略重复预取");
            }
        }
    }

    /// 非阻塞取结果；任务未完成或槽位为空时返回 None
    pub fn try_take(&mut self) -> Option<AppResult<T>> {
        match std::mem::replace(&mut self.state, SlotState::Idle) {
            SlotState::Idle => None,
            SlotState::InFlight(mut handle) => match (&mut handle).now_or_never() {
                Some(joined) => Some(flatten(joined)),
                None => {
                    self.state = SlotState::InFlight(handle);
                    None
                }
            },
        }
    }

    /// 等待并取出结果；槽位为空是调用方的时序错误
    pub async fn take(&mut self) -> AppResult<T> {
        match std::mem::replace(&mut self.state, SlotState::Idle) {
            SlotState::Idle => Err(AppError::Other("预取槽为空".to_string())),
            SlotState::InFlight(handle) => flatten(handle.await),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SlotState::Idle)
    }
}

impl<T: Send + 'static> Default for PrefetchSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Drop for PrefetchSlot<T> {
    fn drop(&mut self) {
        if let SlotState::InFlight(handle) = &self.state {
            handle.abort();
        }
    }
}

fn flatten<T>(joined: Result<AppResult<T>, tokio::task::JoinError>) -> AppResult<T> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(AppError::Other(format!("预取任务异常终止: {}", e))),
    }
}
