use embassy_time::Duration;

use crate::error::ConfigError;

/// 输入监视器的时间参数。
///
/// 这个结构体允许用户调整消抖窗口和采样节奏。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorConfig {
    /// 消抖持续时间。
    ///
    /// 一次跳变被上报后，此时间段内同一线路上的任何后续变化都将被忽略，
    /// 以防止物理按键的机械抖动产生误报。窗口只会因新的上报而重新开始。
    pub debounce: Duration,

    /// 轮询采样的间隔。
    ///
    /// 必须不超过消抖窗口的一半，否则可能漏掉跳变。
    pub poll_interval: Duration,
}

impl MonitorConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// 检查轮询间隔是否满足采样要求。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_interval = Duration::from_ticks(self.debounce.as_ticks() / 2);
        if self.poll_interval.as_ticks() == 0 || self.poll_interval > max_interval {
            return Err(ConfigError::PollInterval);
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    /// 提供一套合理的默认配置。
    ///
    /// - 消抖: 100ms
    /// - 轮询间隔: 10ms
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
        }
    }
}
