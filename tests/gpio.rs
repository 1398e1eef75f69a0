use core::convert::Infallible;
use embassy_input_monitor::{gpio::InterruptLine, CancelToken, Edge, Error, LineId, Pull, Trigger};
use embassy_time::{Duration, Timer};
use tokio::sync::watch;

struct MockPin {
    rx: watch::Receiver<bool>,
}
struct MockPinController {
    tx: watch::Sender<bool>,
}
impl MockPin {
    fn split() -> (MockPinController, Self) {
        let (tx, rx) = watch::channel(true);
        (MockPinController { tx }, Self { rx })
    }
}
impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}
impl embedded_hal::digital::InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(*self.rx.borrow())
    }
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!*self.rx.borrow())
    }
}
impl embedded_hal_async::digital::Wait for MockPin {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        self.rx.wait_for(|state| *state).await.unwrap();
        Ok(())
    }
    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        self.rx.wait_for(|state| !*state).await.unwrap();
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_for_low().await?;
        self.wait_for_high().await
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_for_high().await?;
        self.wait_for_low().await
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        self.rx.changed().await.unwrap();
        Ok(())
    }
}

const LINE: LineId = LineId(17);
const DEBOUNCE: Duration = Duration::from_millis(50);

// 1. 事件生成器：带机械抖动的一次按下和释放
async fn bouncy_click(controller: MockPinController) {
    controller.tx.send(true).unwrap(); // 初始状态
    Timer::after(Duration::from_millis(20)).await;

    for level in [false, true, false, true, false] {
        controller.tx.send(level).unwrap();
        Timer::after(Duration::from_millis(3)).await;
    }
    Timer::after(Duration::from_millis(150)).await;

    // 释放后又短暂抖回低电平，最终停在高电平
    for level in [true, false, true, false, true] {
        controller.tx.send(level).unwrap();
        Timer::after(Duration::from_millis(3)).await;
    }
    Timer::after(Duration::from_millis(200)).await;
}

// 2. 事件验证器
async fn edge_validator(mut line: InterruptLine<MockPin>) {
    let expected_edges = [Edge::Falling, Edge::Rising];

    for expected in expected_edges {
        let event = embassy_time::with_timeout(Duration::from_secs(1), line.next_edge())
            .await
            .expect("Test timed out waiting for an edge")
            .unwrap();
        assert_eq!(event.line, LINE);
        assert_eq!(event.edge, expected);
    }

    // 抖动不会产生额外的边沿
    let extra = line
        .wait_for_edge(Trigger::Both, Some(Duration::from_millis(150)), None)
        .await;
    assert_eq!(extra, Err(Error::Timeout));
    assert!(!line.is_pressed());
}

#[tokio::test]
async fn test_interrupt_line_debounces_click() {
    let (controller, pin) = MockPin::split();
    let line = InterruptLine::new(LINE, pin, Pull::Up, DEBOUNCE).unwrap();

    tokio::join!(bouncy_click(controller), edge_validator(line));
}

#[tokio::test]
async fn test_interrupt_line_waits_for_requested_edge() {
    let (controller, pin) = MockPin::split();
    let mut line = InterruptLine::new(LINE, pin, Pull::Up, DEBOUNCE).unwrap();
    assert_eq!(line.pull(), Pull::Up);

    let generator = async {
        Timer::after(Duration::from_millis(20)).await;
        controller.tx.send(false).unwrap();
        Timer::after(Duration::from_millis(100)).await;
        controller.tx.send(true).unwrap();
    };

    // 跳过按下，只等待释放
    let (_, release) = tokio::join!(generator, line.wait_for_edge(Trigger::Rising, Some(Duration::from_secs(1)), None));
    let release = release.unwrap();
    assert_eq!(release.edge, Edge::Rising);
    assert!(release.is_release());
    assert!(release.held_for.unwrap() >= Duration::from_millis(80));
}

#[tokio::test]
async fn test_interrupt_line_reads_level() {
    let (controller, pin) = MockPin::split();
    let mut line = InterruptLine::new(LINE, pin, Pull::Up, DEBOUNCE).unwrap();

    assert!(line.level().unwrap() == embassy_input_monitor::Level::High);
    controller.tx.send(false).unwrap();
    assert!(line.level().unwrap() == embassy_input_monitor::Level::Low);
    // 尚未经过消抖确认
    assert!(!line.is_pressed());
}

#[tokio::test]
async fn test_interrupt_line_unbounded_timeout_and_cancel() {
    let (controller, pin) = MockPin::split();
    let mut line = InterruptLine::new(LINE, pin, Pull::Up, DEBOUNCE).unwrap();

    let generator = async {
        Timer::after(Duration::from_millis(20)).await;
        controller.tx.send(false).unwrap();
    };
    let (_, press) = tokio::join!(generator, line.wait_for_edge(Trigger::Falling, Some(Duration::MAX), None));
    assert_eq!(press.unwrap().edge, Edge::Falling);

    // 保持按下，没有新的跳变
    let cancel = CancelToken::new();
    let canceller = async {
        Timer::after(Duration::from_millis(30)).await;
        cancel.cancel();
    };
    let waiter = embassy_time::with_timeout(Duration::from_secs(1), line.wait_for_edge(Trigger::Both, None, Some(&cancel)));
    let (_, result) = tokio::join!(canceller, waiter);
    assert_eq!(result.expect("cancellation was not observed"), Err(Error::Cancelled));
    assert!(line.is_pressed());
}
