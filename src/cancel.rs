use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, watch::Watch};

use crate::error::{ConfigError, Error};

/// 同一个取消标志上可以同时挂起等待的任务数。
pub const CANCEL_WAITERS: usize = 4;

/// 协作式取消标志。
///
/// 可以放在 `static` 中，由事件处理器或其他任务置位。
/// 正在等待的一方会被立即唤醒并以 [`Error::Cancelled`](crate::Error::Cancelled) 返回。
/// 同样适合作为主循环的“继续运行”标志。
pub struct CancelToken {
    cancelled: AtomicBool,
    watch: Watch<CriticalSectionRawMutex, bool, CANCEL_WAITERS>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            watch: Watch::new(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.watch.sender().send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// 清除取消状态，以便复用同一个标志。
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
        self.watch.sender().send(false);
    }

    /// 挂起直到标志被置位。
    ///
    /// 同时等待的任务超过 [`CANCEL_WAITERS`] 时返回 [`ConfigError::ChannelExhausted`]。
    pub async fn cancelled(&self) -> Result<(), Error> {
        let mut receiver = self
            .watch
            .receiver()
            .ok_or(ConfigError::ChannelExhausted)?;
        receiver.get_and(|cancelled| *cancelled).await;
        Ok(())
    }
}
