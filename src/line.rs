use core::fmt;

use embassy_time::{Duration, Instant};

/// 输入线路的稳定标识，通常就是引脚编号。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(pub u8);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

impl From<u8> for LineId {
    fn from(pin: u8) -> Self {
        Self(pin)
    }
}

/// 线路的逻辑电平。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

impl Level {
    /// 从 `is_high()` 的结果构造电平。
    pub fn from_high(is_high: bool) -> Self {
        if is_high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl core::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::High => Level::Low,
            Level::Low => Level::High,
        }
    }
}

/// 线路的上下拉模式，决定了静止电平。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// 上拉：静止为高电平，按下时引脚接地。
    Up,
    /// 下拉：静止为低电平，按下时引脚接VCC。
    Down,
}

impl Pull {
    /// 未按下时的电平。
    pub fn rest_level(self) -> Level {
        match self {
            Pull::Up => Level::High,
            Pull::Down => Level::Low,
        }
    }

    /// 按下（有效）时的电平。
    pub fn asserted_level(self) -> Level {
        !self.rest_level()
    }

    /// 在此上下拉模式下，表示“按下”的边沿方向。
    pub fn press_edge(self) -> Edge {
        match self {
            Pull::Up => Edge::Falling,
            Pull::Down => Edge::Rising,
        }
    }
}

/// 电平跳变方向。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// 高 → 低。上拉接法下即“按下”。
    Falling,
    /// 低 → 高。上拉接法下即“释放”。
    Rising,
}

impl Edge {
    /// 由跳变后的电平得到边沿方向。
    pub fn towards(level: Level) -> Self {
        match level {
            Level::Low => Edge::Falling,
            Level::High => Edge::Rising,
        }
    }

    /// 跳变后的电平。
    pub fn target_level(self) -> Level {
        match self {
            Edge::Falling => Level::Low,
            Edge::Rising => Level::High,
        }
    }
}

/// 订阅或等待时使用的边沿过滤条件。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Falling,
    Rising,
    Both,
}

impl Trigger {
    pub fn matches(self, edge: Edge) -> bool {
        matches!(
            (self, edge),
            (Trigger::Both, _) | (Trigger::Falling, Edge::Falling) | (Trigger::Rising, Edge::Rising)
        )
    }
}

impl From<Edge> for Trigger {
    fn from(edge: Edge) -> Self {
        match edge {
            Edge::Falling => Trigger::Falling,
            Edge::Rising => Trigger::Rising,
        }
    }
}

/// 一次经过消抖确认的电平跳变。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    pub line: LineId,
    pub edge: Edge,
    /// 跳变被确认的时刻。
    pub at: Instant,
    /// 跳变后线路是否处于按下状态（由上下拉模式换算）。
    pub pressed: bool,
    /// 释放事件附带本次按下持续的时长。
    pub held_for: Option<Duration>,
}

impl EdgeEvent {
    pub fn is_press(&self) -> bool {
        self.pressed
    }

    pub fn is_release(&self) -> bool {
        !self.pressed
    }
}

/// 一个具名按钮，对应且只对应一条输入线路。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button {
    pub name: &'static str,
    pub line: LineId,
}

impl Button {
    pub const fn new(name: &'static str, line: u8) -> Self {
        Self {
            name,
            line: LineId(line),
        }
    }
}

/// 覆盖全部 256 个线路标识的定长位图。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineSet {
    bits: [u64; 4],
}

impl LineSet {
    pub const fn new() -> Self {
        Self { bits: [0; 4] }
    }

    pub fn insert(&mut self, line: LineId) {
        let (word, bit) = Self::position(line);
        self.bits[word] |= bit;
    }

    pub fn remove(&mut self, line: LineId) {
        let (word, bit) = Self::position(line);
        self.bits[word] &= !bit;
    }

    pub fn contains(&self, line: LineId) -> bool {
        let (word, bit) = Self::position(line);
        self.bits[word] & bit != 0
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    fn position(line: LineId) -> (usize, u64) {
        ((line.0 / 64) as usize, 1 << (line.0 % 64))
    }
}
