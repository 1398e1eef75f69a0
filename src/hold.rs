use embassy_time::{Duration, Instant};

/// 长按检测的进度。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    /// 还在等待按下。
    Waiting,
    /// 已按下，尚未达到阈值。
    Pressed { since: Instant },
    /// 持续按下超过阈值。
    Held,
    /// 在达到阈值之前被释放。
    Released,
}

/// 按下被确认后，原始电平连续处于静止这么多次即视为释放。
pub const RELEASE_SAMPLES: u8 = 2;

/// 判断一次按下是否持续超过阈值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldDetector {
    threshold: Duration,
    state: HoldState,
    rest_samples: u8,
}

impl HoldDetector {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            state: HoldState::Waiting,
            rest_samples: 0,
        }
    }

    /// 输入一次（已消抖的）按下状态。
    pub fn update(&mut self, pressed: bool, now: Instant) -> HoldState {
        self.state = match self.state {
            HoldState::Waiting if pressed => self.check(now, now),
            HoldState::Waiting => HoldState::Waiting,
            HoldState::Pressed { .. } if !pressed => HoldState::Released,
            HoldState::Pressed { since } => self.check(since, now),
            done => done,
        };
        self.state
    }

    /// 同时输入消抖后的按下状态和原始采样的按下状态。
    ///
    /// 按下的确认仍以消抖为准；确认之后，原始电平连续 [`RELEASE_SAMPLES`] 次处于静止
    /// 即判定为释放，不必等待消抖窗口结束。比采样间隔更短的抖动不受影响。
    pub fn update_sampled(&mut self, debounced: bool, raw: bool, now: Instant) -> HoldState {
        self.rest_samples = if raw {
            0
        } else {
            self.rest_samples.saturating_add(1)
        };
        let pressed = match self.state {
            HoldState::Pressed { .. } => debounced && self.rest_samples < RELEASE_SAMPLES,
            _ => debounced,
        };
        self.update(pressed, now)
    }

    /// 已经得出结论时返回是否长按。
    pub fn outcome(&self) -> Option<bool> {
        match self.state {
            HoldState::Held => Some(true),
            HoldState::Released => Some(false),
            _ => None,
        }
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    fn check(&self, since: Instant, now: Instant) -> HoldState {
        let held = now
            .checked_duration_since(since)
            .is_some_and(|d| d >= self.threshold);
        if held {
            HoldState::Held
        } else {
            HoldState::Pressed { since }
        }
    }
}
