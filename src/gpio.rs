use embassy_time::{with_deadline, Duration, Instant, Timer};
use embedded_hal::digital::{Error as _, ErrorType, InputPin};
use embedded_hal_async::digital::Wait;

use crate::{
    cancel::CancelToken,
    debounce::LineTracker,
    error::Error,
    line::{EdgeEvent, Level, LineId, Pull, Trigger},
    wait::{cancellable, deadline_after},
    LineSource,
};

/// 一组由GPIO输入引脚组成的线路来源。
///
/// 每个引脚与一个线路标识（通常就是引脚编号）绑定。
/// 上下拉由HAL在创建引脚时设置，例如 `Input::new(pin, Pull::Up)`；
/// 这里沿用 [`LineSource::set_pull`] 的空实现，配置时传入的上下拉只用于判断静止电平。
pub struct GpioLines<P: InputPin, const N: usize> {
    pins: [(LineId, P); N],
}

impl<P: InputPin, const N: usize> GpioLines<P, N> {
    /// 创建一组GPIO线路。
    ///
    /// # 参数
    /// * `pins`: `(引脚编号, 引脚)` 数组。编号重复时只有第一个生效。
    pub fn new(pins: [(u8, P); N]) -> Self {
        Self {
            pins: pins.map(|(id, pin)| (LineId(id), pin)),
        }
    }

    /// 取回底层引脚。
    pub fn release(self) -> [(LineId, P); N] {
        self.pins
    }
}

impl<P: InputPin, const N: usize> ErrorType for GpioLines<P, N> {
    type Error = P::Error;
}

impl<P: InputPin, const N: usize> LineSource for GpioLines<P, N> {
    fn resolve(&self, line: LineId) -> Option<usize> {
        self.pins.iter().position(|(id, _)| *id == line)
    }

    fn level(&mut self, index: usize) -> Result<Level, Self::Error> {
        self.pins[index].1.is_high().map(Level::from_high)
    }
}

/// 一个由引脚中断驱动的单条线路。
///
/// 不做轮询，依赖 `Wait` 提供的电平通知；
/// 抖动窗口内被忽略的跳变会在窗口结束后重新读取确认。
pub struct InterruptLine<P: InputPin + Wait> {
    pin: P,
    tracker: LineTracker,
}

impl<P: InputPin + Wait> InterruptLine<P> {
    /// 创建一条中断驱动的线路，并读取当前电平作为初始稳定电平。
    pub fn new(line: LineId, mut pin: P, pull: Pull, debounce: Duration) -> Result<Self, Error> {
        let initial = read_pin(&mut pin)?;
        debug!("{} configured for interrupts", line);
        Ok(Self {
            pin,
            tracker: LineTracker::new(line, pull, initial, debounce, Instant::now()),
        })
    }

    pub fn line(&self) -> LineId {
        self.tracker.line()
    }

    pub fn pull(&self) -> Pull {
        self.tracker.pull()
    }

    /// 读取瞬时电平，不经过消抖。
    pub fn level(&mut self) -> Result<Level, Error> {
        read_pin(&mut self.pin)
    }

    /// 消抖后的按下状态。
    pub fn is_pressed(&self) -> bool {
        self.tracker.is_pressed()
    }

    /// 等待下一次经过消抖确认的跳变。
    pub async fn next_edge(&mut self) -> Result<EdgeEvent, Error> {
        loop {
            let raw = read_pin(&mut self.pin)?;
            if let Some(event) = self.tracker.update(raw, Instant::now()) {
                return Ok(event);
            }

            if raw != self.tracker.level() {
                if let Some(end) = self.tracker.window_end() {
                    Timer::at(end).await;
                }
                continue;
            }

            let waited = match self.tracker.level() {
                Level::High => self.pin.wait_for_low().await,
                Level::Low => self.pin.wait_for_high().await,
            };
            waited.map_err(|e| Error::Pin(e.kind()))?;
        }
    }

    /// 等待指定方向的跳变；`timeout` 为 `None` 时无限等待，只能通过 `cancel` 打断。
    pub async fn wait_for_edge(
        &mut self,
        trigger: Trigger,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<EdgeEvent, Error> {
        let deadline = deadline_after(timeout);
        cancellable(cancel, async {
            match deadline {
                Some(deadline) => with_deadline(deadline, self.matching_edge(trigger))
                    .await
                    .unwrap_or(Err(Error::Timeout)),
                None => self.matching_edge(trigger).await,
            }
        })
        .await
    }

    async fn matching_edge(&mut self, trigger: Trigger) -> Result<EdgeEvent, Error> {
        loop {
            let event = self.next_edge().await?;
            if trigger.matches(event.edge) {
                return Ok(event);
            }
        }
    }

    /// 取回底层引脚。
    pub fn release(self) -> P {
        self.pin
    }
}

fn read_pin<P: InputPin>(pin: &mut P) -> Result<Level, Error> {
    pin.is_high()
        .map(Level::from_high)
        .map_err(|e| Error::Pin(e.kind()))
}
