#![no_std]

#[macro_use]
mod fmt;

pub mod cancel;
pub mod config;
pub mod debounce;
pub mod display;
pub mod error;
pub mod events;
pub mod gpio;
pub mod hold;
pub mod line;
pub mod monitor;
pub mod wait;

pub use cancel::CancelToken;
pub use config::*;
pub use error::{ConfigError, Error};
pub use events::{EdgeDriver, EdgeHandler, EdgeSubscriptions};
pub use line::{Button, Edge, EdgeEvent, Level, LineId, Pull, Trigger};
pub use monitor::InputMonitor;

use embedded_hal::digital::ErrorType;

/// 一个trait，抽象了提供数字输入线路的平台服务（GPIO控制器、扩展芯片、模拟器等）。
///
/// 监视器只在配置时解析一次线路标识，之后都通过内部索引访问。
pub trait LineSource: ErrorType {
    /// 把线路标识解析为内部索引；平台不认识的标识返回 `None`。
    fn resolve(&self, line: LineId) -> Option<usize>;

    /// 读取线路的瞬时电平。`index` 一定来自 [`resolve`](Self::resolve)。
    fn level(&mut self, index: usize) -> Result<Level, Self::Error>;

    /// 设置线路的上下拉。不支持运行时设置的平台保持默认实现即可。
    fn set_pull(&mut self, _index: usize, _pull: Pull) -> Result<(), Self::Error> {
        Ok(())
    }
}
