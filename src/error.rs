use core::fmt;

use embedded_hal::digital::ErrorKind;

use crate::line::LineId;

/// 配置阶段的错误，调用方可以修正后重试。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// 该线路已经配置过，需要先 `unconfigure`。
    AlreadyConfigured(LineId),
    /// 平台不认识这个线路标识。
    InvalidLine(LineId),
    /// 线路表已满。
    TableFull,
    /// 分发器的处理器槽位已满。
    HandlersFull,
    /// 事件通道的订阅者或发布者数量已用尽。
    ChannelExhausted,
    /// 轮询间隔为零，或超过了消抖窗口的一半。
    PollInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::AlreadyConfigured(line) => write!(f, "{line} is already configured"),
            ConfigError::InvalidLine(line) => write!(f, "{line} is not a valid input line"),
            ConfigError::TableFull => f.write_str("no free line slots left"),
            ConfigError::HandlersFull => f.write_str("no free handler slots left"),
            ConfigError::ChannelExhausted => f.write_str("edge channel has no free subscriber or publisher"),
            ConfigError::PollInterval => {
                f.write_str("poll interval must be non-zero and at most half the debounce window")
            }
        }
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Config(ConfigError),
    /// 对未配置的线路进行操作。这是调用方的编程错误，不应重试。
    NotConfigured(LineId),
    /// 阻塞等待在超时前没有等到期望的边沿。
    Timeout,
    /// 阻塞等待被 `CancelToken` 取消。
    Cancelled,
    /// 底层引脚读取失败。
    Pin(ErrorKind),
}

impl Error {
    /// 是否为可以由调用方恢复的运行时状况。
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::NotConfigured(_))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(err) => write!(f, "configuration error: {err}"),
            Error::NotConfigured(line) => write!(f, "{line} is not configured"),
            Error::Timeout => f.write_str("timed out waiting for edge"),
            Error::Cancelled => f.write_str("wait was cancelled"),
            Error::Pin(kind) => write!(f, "pin error: {kind}"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl core::error::Error for Error {}
