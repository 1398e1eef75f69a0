use embassy_time::{Duration, Instant};

use crate::{
    cancel::CancelToken,
    config::MonitorConfig,
    debounce::LineTracker,
    error::{ConfigError, Error},
    hold::HoldDetector,
    line::{Button, EdgeEvent, Level, LineId, LineSet, Pull, Trigger},
    wait::{cancellable, deadline_after, poll_until},
    LineSource,
};

#[derive(Debug, Clone, Copy)]
struct Slot {
    index: usize,
    tracker: LineTracker,
}

/// 数字输入监视器。
///
/// 持有线路来源，最多同时监视 `N` 条线路，负责消抖与边沿判定。
/// 阻塞式的 [`wait_for_edge`](Self::wait_for_edge) 与 [`measure_hold`](Self::measure_hold)
/// 只挂起调用它的任务；需要事件推送时，把它交给 [`EdgeDriver`](crate::events::EdgeDriver)。
pub struct InputMonitor<S: LineSource, const N: usize> {
    source: S,
    config: MonitorConfig,
    slots: [Option<Slot>; N],
}

impl<S: LineSource, const N: usize> InputMonitor<S, N> {
    pub fn new(source: S, config: MonitorConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            source,
            config,
            slots: [None; N],
        })
    }

    /// 把一条线路注册为数字输入。
    ///
    /// 先通过 [`LineSource::set_pull`] 把上下拉交给平台，再读取当前电平作为消抖器的初始稳定电平。
    /// [`GpioLines`](crate::gpio::GpioLines) 不支持运行时设置上下拉，此时 `pull`
    /// 只决定哪个电平算作静止，实际的上下拉需要在创建引脚时配置。
    pub fn configure(&mut self, line: LineId, pull: Pull) -> Result<(), Error> {
        if self.find(line).is_some() {
            return Err(ConfigError::AlreadyConfigured(line).into());
        }
        let index = self
            .source
            .resolve(line)
            .ok_or(ConfigError::InvalidLine(line))?;
        let free = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(ConfigError::TableFull)?;

        self.source.set_pull(index, pull).map_err(pin_error)?;
        let initial = self.source.level(index).map_err(pin_error)?;
        self.slots[free] = Some(Slot {
            index,
            tracker: LineTracker::new(line, pull, initial, self.config.debounce, Instant::now()),
        });
        debug!("{} configured as input, pull {:?}, level {:?}", line, pull, initial);
        Ok(())
    }

    /// 依次配置一组按钮使用的线路。遇到第一个错误即停止。
    pub fn configure_buttons(&mut self, buttons: &[Button], pull: Pull) -> Result<(), Error> {
        buttons
            .iter()
            .try_for_each(|button| self.configure(button.line, pull))
    }

    pub fn unconfigure(&mut self, line: LineId) -> Result<(), Error> {
        let pos = self.find(line).ok_or(Error::NotConfigured(line))?;
        self.slots[pos] = None;
        debug!("{} unconfigured", line);
        Ok(())
    }

    pub fn is_configured(&self, line: LineId) -> bool {
        self.find(line).is_some()
    }

    /// 当前已配置的全部线路。
    pub fn configured(&self) -> LineSet {
        let mut set = LineSet::new();
        for slot in self.slots.iter().flatten() {
            set.insert(slot.tracker.line());
        }
        set
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// 立即读取线路的原始电平，不经过消抖。
    pub fn read(&mut self, line: LineId) -> Result<Level, Error> {
        let index = self.slot(line)?.index;
        self.source.level(index).map_err(pin_error)
    }

    /// 按上下拉模式换算后的瞬时按下状态。
    pub fn is_pressed(&mut self, line: LineId) -> Result<bool, Error> {
        let asserted = self.slot(line)?.tracker.pull().asserted_level();
        Ok(self.read(line)? == asserted)
    }

    /// 消抖后的电平。
    pub fn debounced_level(&self, line: LineId) -> Result<Level, Error> {
        Ok(self.slot(line)?.tracker.level())
    }

    /// 对一条线路执行一次采样，返回被确认的跳变。
    pub fn sample(&mut self, line: LineId, now: Instant) -> Result<Option<EdgeEvent>, Error> {
        let pos = self.position(line)?;
        self.sample_slot(pos, now)
    }

    /// 对全部已配置线路各采样一次。读取失败的线路会被跳过。
    pub fn sample_all(&mut self, now: Instant) -> [Option<EdgeEvent>; N] {
        let mut events = [None; N];
        for pos in 0..N {
            if self.slots[pos].is_none() {
                continue;
            }
            match self.sample_slot(pos, now) {
                Ok(event) => events[pos] = event,
                Err(_err) => warn!("sampling slot {} failed: {:?}", pos, _err),
            }
        }
        events
    }

    /// 等待线路出现指定方向的跳变。
    ///
    /// `timeout` 为 `None` 时无限等待，只能通过 `cancel` 打断。
    pub async fn wait_for_edge(
        &mut self,
        line: LineId,
        trigger: Trigger,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<EdgeEvent, Error> {
        let pos = self.position(line)?;
        let interval = self.config.poll_interval;
        let deadline = deadline_after(timeout);
        cancellable(
            cancel,
            poll_until(interval, deadline, |now| {
                Ok(self
                    .sample_slot(pos, now)?
                    .filter(|event| trigger.matches(event.edge)))
            }),
        )
        .await
    }

    /// 等待线路被按下，再判断是否持续按下达到 `threshold`。
    ///
    /// 达到阈值时返回 `true`，提前释放时返回 `false`。
    /// 按下以消抖结果为准；之后原始电平连续两次采样处于静止即视为释放，
    /// 因此短于消抖窗口的阈值同样有效。
    pub async fn measure_hold(
        &mut self,
        line: LineId,
        threshold: Duration,
        cancel: Option<&CancelToken>,
    ) -> Result<bool, Error> {
        let pos = self.position(line)?;
        let interval = self.config.poll_interval;
        let mut detector = HoldDetector::new(threshold);
        cancellable(
            cancel,
            poll_until(interval, None, |now| {
                let Some(slot) = self.slots[pos].as_mut() else {
                    return Err(Error::NotConfigured(line));
                };
                let raw = self.source.level(slot.index).map_err(pin_error)?;
                slot.tracker.update(raw, now);
                let asserted = raw == slot.tracker.pull().asserted_level();
                detector.update_sampled(slot.tracker.is_pressed(), asserted, now);
                Ok(detector.outcome())
            }),
        )
        .await
    }

    /// 取回线路来源。
    pub fn release(self) -> S {
        self.source
    }

    fn sample_slot(&mut self, pos: usize, now: Instant) -> Result<Option<EdgeEvent>, Error> {
        let Some(slot) = self.slots[pos].as_mut() else {
            return Ok(None);
        };
        let raw = self.source.level(slot.index).map_err(pin_error)?;
        Ok(slot.tracker.update(raw, now))
    }

    fn find(&self, line: LineId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.is_some_and(|s| s.tracker.line() == line))
    }

    fn position(&self, line: LineId) -> Result<usize, Error> {
        self.find(line).ok_or(Error::NotConfigured(line))
    }

    fn slot(&self, line: LineId) -> Result<&Slot, Error> {
        let pos = self.position(line)?;
        self.slots[pos].as_ref().ok_or(Error::NotConfigured(line))
    }
}

fn pin_error<E: embedded_hal::digital::Error>(err: E) -> Error {
    Error::Pin(err.kind())
}
