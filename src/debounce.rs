use embassy_time::{Duration, Instant};

use crate::line::{Edge, EdgeEvent, Level, LineId, Pull};

/// 单条线路的消抖过滤器。
///
/// 只关心“稳定电平”与上一次上报的时刻：上报之后，窗口内的原始跳变一律忽略；
/// 窗口过去后，若原始电平与稳定电平不同，则作为下一次跳变上报。
/// 所有时刻都由调用方传入，因此可以用任意构造的 `Instant` 驱动。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debouncer {
    stable: Level,
    window: Duration,
    last_report: Option<Instant>,
}

impl Debouncer {
    pub fn new(initial: Level, window: Duration) -> Self {
        Self {
            stable: initial,
            window,
            last_report: None,
        }
    }

    /// 输入一次原始采样，返回被确认的边沿（如果有）。
    pub fn update(&mut self, raw: Level, now: Instant) -> Option<Edge> {
        if raw == self.stable || !self.window_elapsed(now) {
            return None;
        }
        self.stable = raw;
        self.last_report = Some(now);
        Some(Edge::towards(raw))
    }

    /// 消抖后的电平。
    pub fn level(&self) -> Level {
        self.stable
    }

    /// 当前窗口关闭的时刻；尚未上报过任何跳变时为 `None`。
    pub fn window_end(&self) -> Option<Instant> {
        self.last_report.map(|at| at + self.window)
    }

    fn window_elapsed(&self, now: Instant) -> bool {
        match self.last_report {
            None => true,
            Some(at) => now
                .checked_duration_since(at)
                .is_some_and(|since| since >= self.window),
        }
    }
}

/// 在消抖之上附加线路标识、上下拉语义和按下时长的跟踪器。
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineTracker {
    line: LineId,
    pull: Pull,
    debouncer: Debouncer,
    pressed_at: Option<Instant>,
}

impl LineTracker {
    pub(crate) fn new(line: LineId, pull: Pull, initial: Level, window: Duration, now: Instant) -> Self {
        Self {
            line,
            pull,
            debouncer: Debouncer::new(initial, window),
            pressed_at: (initial == pull.asserted_level()).then_some(now),
        }
    }

    pub(crate) fn update(&mut self, raw: Level, now: Instant) -> Option<EdgeEvent> {
        let edge = self.debouncer.update(raw, now)?;
        let pressed = raw == self.pull.asserted_level();
        let held_for = if pressed {
            self.pressed_at = Some(now);
            None
        } else {
            self.pressed_at
                .take()
                .and_then(|since| now.checked_duration_since(since))
        };
        trace!("{} reported {:?} edge", self.line, edge);
        Some(EdgeEvent {
            line: self.line,
            edge,
            at: now,
            pressed,
            held_for,
        })
    }

    pub(crate) fn line(&self) -> LineId {
        self.line
    }

    pub(crate) fn pull(&self) -> Pull {
        self.pull
    }

    pub(crate) fn level(&self) -> Level {
        self.debouncer.level()
    }

    pub(crate) fn is_pressed(&self) -> bool {
        self.debouncer.level() == self.pull.asserted_level()
    }

    pub(crate) fn window_end(&self) -> Option<Instant> {
        self.debouncer.window_end()
    }
}
