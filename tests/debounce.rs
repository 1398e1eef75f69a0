use embassy_input_monitor::{
    debounce::Debouncer,
    hold::{HoldDetector, HoldState},
    line::LineSet,
    ConfigError, Edge, Level, LineId, MonitorConfig, Pull, Trigger,
};
use embassy_time::{Duration, Instant};

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

#[test]
fn test_first_transition_is_reported_immediately() {
    let mut debouncer = Debouncer::new(Level::High, Duration::from_millis(100));

    assert_eq!(debouncer.update(Level::High, at(0)), None);
    assert_eq!(debouncer.update(Level::Low, at(5)), Some(Edge::Falling));
    assert_eq!(debouncer.level(), Level::Low);
    assert_eq!(debouncer.window_end(), Some(at(105)));
}

#[test]
fn test_bounces_inside_window_are_ignored() {
    let mut debouncer = Debouncer::new(Level::High, Duration::from_millis(100));
    let mut edges: Vec<Edge> = Vec::new();

    // 按下时的机械抖动
    let press = [(0, Level::Low), (3, Level::High), (6, Level::Low), (9, Level::High), (12, Level::Low)];
    // 释放时的机械抖动
    let release = [(300, Level::High), (303, Level::Low), (306, Level::High), (309, Level::Low), (312, Level::High)];

    for (ms, level) in press.into_iter().chain(release) {
        edges.extend(debouncer.update(level, at(ms)));
    }
    // 抖动结束后继续采样
    for ms in (320..500).step_by(10) {
        edges.extend(debouncer.update(Level::High, at(ms)));
    }

    assert_eq!(edges, [Edge::Falling, Edge::Rising]);
}

#[test]
fn test_suppressed_release_is_reported_after_window() {
    let mut debouncer = Debouncer::new(Level::High, Duration::from_millis(100));

    assert_eq!(debouncer.update(Level::Low, at(0)), Some(Edge::Falling));
    assert_eq!(debouncer.update(Level::High, at(10)), None);
    assert_eq!(debouncer.update(Level::High, at(99)), None);
    // 窗口结束后，与稳定电平不同的采样作为下一次跳变上报，窗口随之重启
    assert_eq!(debouncer.update(Level::High, at(100)), Some(Edge::Rising));
    assert_eq!(debouncer.update(Level::Low, at(150)), None);
    assert_eq!(debouncer.update(Level::Low, at(200)), Some(Edge::Falling));
}

#[test]
fn test_earlier_instant_never_reopens_window() {
    let mut debouncer = Debouncer::new(Level::High, Duration::from_millis(100));

    assert_eq!(debouncer.update(Level::Low, at(1000)), Some(Edge::Falling));
    assert_eq!(debouncer.update(Level::High, at(500)), None);
}

#[test]
fn test_hold_reaches_threshold() {
    let mut detector = HoldDetector::new(Duration::from_millis(3));

    assert_eq!(detector.update(false, at(0)), HoldState::Waiting);
    assert_eq!(detector.update(true, at(10)), HoldState::Pressed { since: at(10) });
    assert_eq!(detector.update(true, at(12)), HoldState::Pressed { since: at(10) });
    assert_eq!(detector.outcome(), None);
    assert_eq!(detector.update(true, at(13)), HoldState::Held);
    assert_eq!(detector.outcome(), Some(true));
    // 得出结论后不再变化
    assert_eq!(detector.update(false, at(20)), HoldState::Held);
}

#[test]
fn test_hold_released_early() {
    let mut detector = HoldDetector::new(Duration::from_millis(3));

    detector.update(true, at(0));
    assert_eq!(detector.update(false, at(2)), HoldState::Released);
    assert_eq!(detector.outcome(), Some(false));
}

#[test]
fn test_raw_rest_samples_end_hold_before_window() {
    let mut detector = HoldDetector::new(Duration::from_millis(20));

    // 消抖确认按下
    assert_eq!(detector.update_sampled(true, true, at(0)), HoldState::Pressed { since: at(0) });
    // 单次静止采样视为抖动
    assert_eq!(detector.update_sampled(true, false, at(5)), HoldState::Pressed { since: at(0) });
    assert_eq!(detector.update_sampled(true, true, at(10)), HoldState::Pressed { since: at(0) });
    assert_eq!(detector.update_sampled(true, false, at(12)), HoldState::Pressed { since: at(0) });
    // 连续两次静止，即使消抖后的状态仍是按下
    assert_eq!(detector.update_sampled(true, false, at(15)), HoldState::Released);
    assert_eq!(detector.outcome(), Some(false));
}

#[test]
fn test_raw_rest_before_press_is_ignored() {
    let mut detector = HoldDetector::new(Duration::from_millis(10));

    for ms in [0, 5, 10] {
        assert_eq!(detector.update_sampled(false, false, at(ms)), HoldState::Waiting);
    }
    assert_eq!(detector.update_sampled(true, true, at(15)), HoldState::Pressed { since: at(15) });
    assert_eq!(detector.update_sampled(true, true, at(25)), HoldState::Held);
}

#[test]
fn test_zero_threshold_holds_on_press() {
    let mut detector = HoldDetector::new(Duration::from_millis(0));

    assert_eq!(detector.update(true, at(7)), HoldState::Held);
}

#[test]
fn test_pull_mapping() {
    assert_eq!(Pull::Up.rest_level(), Level::High);
    assert_eq!(Pull::Up.asserted_level(), Level::Low);
    assert_eq!(Pull::Up.press_edge(), Edge::Falling);
    assert_eq!(Pull::Down.rest_level(), Level::Low);
    assert_eq!(Pull::Down.press_edge(), Edge::Rising);

    assert!(Trigger::Both.matches(Edge::Rising));
    assert!(Trigger::Falling.matches(Edge::Falling));
    assert!(!Trigger::Falling.matches(Edge::Rising));
}

#[test]
fn test_line_set() {
    let mut set = LineSet::new();
    assert!(set.is_empty());

    set.insert(LineId(0));
    set.insert(LineId(17));
    set.insert(LineId(255));
    assert_eq!(set.len(), 3);
    assert!(set.contains(LineId(255)));
    assert!(!set.contains(LineId(16)));

    set.remove(LineId(17));
    assert!(!set.contains(LineId(17)));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_config_validation() {
    assert_eq!(MonitorConfig::default().validate(), Ok(()));

    let too_slow = MonitorConfig::default()
        .with_debounce(Duration::from_millis(10))
        .with_poll_interval(Duration::from_millis(10));
    assert_eq!(too_slow.validate(), Err(ConfigError::PollInterval));

    let zero = MonitorConfig::default().with_poll_interval(Duration::from_ticks(0));
    assert_eq!(zero.validate(), Err(ConfigError::PollInterval));
}
