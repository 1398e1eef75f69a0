use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    pubsub::{PubSubChannel, Publisher, Subscriber},
};
use embassy_time::{with_deadline, Duration, Instant, Ticker};

use crate::{
    cancel::CancelToken,
    error::{ConfigError, Error},
    line::{EdgeEvent, LineId, LineSet, Trigger},
    monitor::InputMonitor,
    wait::{cancellable, deadline_after},
    LineSource,
};

pub type EdgeChannel<const CAP: usize, const SUBS: usize, const PUBS: usize> =
    PubSubChannel<CriticalSectionRawMutex, EdgeEvent, CAP, SUBS, PUBS>;
pub type EdgeSubscriber<'a, const CAP: usize, const SUBS: usize, const PUBS: usize> =
    Subscriber<'a, CriticalSectionRawMutex, EdgeEvent, CAP, SUBS, PUBS>;
type EdgePublisher<'a, const CAP: usize, const SUBS: usize, const PUBS: usize> =
    Publisher<'a, CriticalSectionRawMutex, EdgeEvent, CAP, SUBS, PUBS>;

/// 能够接收边沿事件的处理器。
///
/// 闭包 `FnMut(&EdgeEvent)` 自动实现此trait。
pub trait EdgeHandler {
    fn on_edge(&mut self, event: &EdgeEvent);
}

impl<F: FnMut(&EdgeEvent)> EdgeHandler for F {
    fn on_edge(&mut self, event: &EdgeEvent) {
        self(event)
    }
}

/// 【后台驱动器】拥有输入监视器，按轮询间隔采样并广播边沿事件。
pub struct EdgeDriver<
    'a,
    S: LineSource,
    const N: usize,
    const CAP: usize,
    const SUBS: usize,
    const PUBS: usize,
> {
    monitor: InputMonitor<S, N>,
    publisher: EdgePublisher<'a, CAP, SUBS, PUBS>,
}

impl<'a, S: LineSource, const N: usize, const CAP: usize, const SUBS: usize, const PUBS: usize>
    EdgeDriver<'a, S, N, CAP, SUBS, PUBS>
{
    /// 创建一个事件驱动器及其关联的订阅工厂。
    ///
    /// 线路需要在调用之前配置好；工厂只接受这些线路的订阅。
    ///
    /// # 返回
    /// 一个元组，包含:
    /// - `EdgeDriver`: 需要被 spawn 到后台任务中运行。
    /// - `EdgeSubscriptions`: 用于在程序中创建订阅和分发器。
    pub fn new(
        monitor: InputMonitor<S, N>,
        channel: &'a EdgeChannel<CAP, SUBS, PUBS>,
    ) -> Result<(Self, EdgeSubscriptions<'a, CAP, SUBS, PUBS>), Error> {
        let publisher = channel
            .publisher()
            .map_err(|_| ConfigError::ChannelExhausted)?;
        let factory = EdgeSubscriptions {
            channel,
            lines: monitor.configured(),
        };
        Ok((Self { monitor, publisher }, factory))
    }

    pub fn monitor(&self) -> &InputMonitor<S, N> {
        &self.monitor
    }

    /// 运行采样循环。这是您需要 spawn 到后台的唯一任务。
    ///
    /// 发布时会等待订阅者腾出空间，因此同一线路的事件不会丢失或乱序。
    pub async fn run(mut self) -> ! {
        let mut ticker = Ticker::every(self.monitor.config().poll_interval);
        loop {
            for event in self.monitor.sample_all(Instant::now()).into_iter().flatten() {
                self.publisher.publish(event).await;
            }
            ticker.next().await;
        }
    }
}

/// 【订阅工厂】可被克隆并在程序各处使用。
#[derive(Clone)]
pub struct EdgeSubscriptions<'a, const CAP: usize, const SUBS: usize, const PUBS: usize> {
    channel: &'a EdgeChannel<CAP, SUBS, PUBS>,
    lines: LineSet,
}

impl<'a, const CAP: usize, const SUBS: usize, const PUBS: usize> EdgeSubscriptions<'a, CAP, SUBS, PUBS> {
    /// 订阅一条线路上指定方向的边沿。
    pub fn edges(
        &self,
        line: LineId,
        trigger: Trigger,
    ) -> Result<EdgeSubscription<'a, CAP, SUBS, PUBS>, Error> {
        let line = self.check(line)?;
        Ok(EdgeSubscription {
            subscriber: self.subscriber()?,
            line,
            trigger,
        })
    }

    /// 创建一个最多容纳 `H` 个处理器的分发器。
    pub fn dispatcher<'h, const H: usize>(&self) -> Result<Dispatcher<'a, 'h, H, CAP, SUBS, PUBS>, Error> {
        Ok(Dispatcher {
            subscriber: self.subscriber()?,
            lines: self.lines,
            registrations: core::array::from_fn(|_| None),
        })
    }

    pub fn lines(&self) -> LineSet {
        self.lines
    }

    fn check(&self, line: LineId) -> Result<LineId, Error> {
        if self.lines.contains(line) {
            Ok(line)
        } else {
            Err(Error::NotConfigured(line))
        }
    }

    fn subscriber(&self) -> Result<EdgeSubscriber<'a, CAP, SUBS, PUBS>, Error> {
        self.channel
            .subscriber()
            .map_err(|_| ConfigError::ChannelExhausted.into())
    }
}

/// 一条线路的边沿事件流。
pub struct EdgeSubscription<'a, const CAP: usize, const SUBS: usize, const PUBS: usize> {
    subscriber: EdgeSubscriber<'a, CAP, SUBS, PUBS>,
    line: LineId,
    trigger: Trigger,
}

impl<const CAP: usize, const SUBS: usize, const PUBS: usize> EdgeSubscription<'_, CAP, SUBS, PUBS> {
    pub fn line(&self) -> LineId {
        self.line
    }

    pub async fn next(&mut self) -> EdgeEvent {
        loop {
            let event = self.subscriber.next_message_pure().await;
            if event.line == self.line && self.trigger.matches(event.edge) {
                return event;
            }
        }
    }

    /// 等待下一次匹配的边沿，可选超时与取消。
    pub async fn wait_for_edge(
        &mut self,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<EdgeEvent, Error> {
        let deadline = deadline_after(timeout);
        cancellable(cancel, async {
            match deadline {
                Some(deadline) => with_deadline(deadline, self.next())
                    .await
                    .map_err(|_| Error::Timeout),
                None => Ok(self.next().await),
            }
        })
        .await
    }
}

struct Registration<'h> {
    line: LineId,
    trigger: Trigger,
    window: Option<Duration>,
    last_fired: Option<Instant>,
    handler: &'h mut dyn EdgeHandler,
}

impl Registration<'_> {
    fn accepts(&self, event: &EdgeEvent) -> bool {
        if event.line != self.line || !self.trigger.matches(event.edge) {
            return false;
        }
        match (self.window, self.last_fired) {
            (Some(window), Some(last)) => event
                .at
                .checked_duration_since(last)
                .is_some_and(|since| since >= window),
            _ => true,
        }
    }
}

/// 把边沿事件分发给已注册的处理器。
///
/// 同一个分发器内的处理器按注册顺序依次调用，互不并发。
pub struct Dispatcher<'a, 'h, const H: usize, const CAP: usize, const SUBS: usize, const PUBS: usize> {
    subscriber: EdgeSubscriber<'a, CAP, SUBS, PUBS>,
    lines: LineSet,
    registrations: [Option<Registration<'h>>; H],
}

impl<'h, const H: usize, const CAP: usize, const SUBS: usize, const PUBS: usize>
    Dispatcher<'_, 'h, H, CAP, SUBS, PUBS>
{
    /// 注册一个处理器。
    ///
    /// `debounce_window` 额外限制该处理器两次调用之间的最小间隔；
    /// 为 `None` 时只依赖监视器本身的消抖。
    pub fn subscribe(
        &mut self,
        line: LineId,
        trigger: Trigger,
        handler: &'h mut dyn EdgeHandler,
        debounce_window: Option<Duration>,
    ) -> Result<(), Error> {
        if !self.lines.contains(line) {
            return Err(Error::NotConfigured(line));
        }
        let slot = self
            .registrations
            .iter_mut()
            .find(|r| r.is_none())
            .ok_or(ConfigError::HandlersFull)?;
        *slot = Some(Registration {
            line,
            trigger,
            window: debounce_window,
            last_fired: None,
            handler,
        });
        Ok(())
    }

    /// 调用所有匹配的处理器，返回被调用的数量。
    pub fn dispatch(&mut self, event: &EdgeEvent) -> usize {
        let mut invoked = 0;
        for registration in self.registrations.iter_mut().flatten() {
            if registration.accepts(event) {
                registration.last_fired = Some(event.at);
                registration.handler.on_edge(event);
                invoked += 1;
            }
        }
        invoked
    }

    /// 接收并分发下一个事件。
    pub async fn next(&mut self) -> usize {
        let event = self.subscriber.next_message_pure().await;
        self.dispatch(&event)
    }

    pub async fn run(mut self) -> ! {
        loop {
            self.next().await;
        }
    }
}
