use core::future::Future;

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Timer};

use crate::{cancel::CancelToken, error::Error};

/// 以固定间隔轮询，直到条件满足。
///
/// 每个周期以当前时刻调用 `step`：
/// 返回 `Ok(Some(v))` 时结束并返回 `v`，返回 `Err` 时立即传播错误。
/// 若到达 `deadline` 仍未满足，返回 [`Error::Timeout`]。
pub async fn poll_until<T, F>(interval: Duration, deadline: Option<Instant>, mut step: F) -> Result<T, Error>
where
    F: FnMut(Instant) -> Result<Option<T>, Error>,
{
    loop {
        let now = Instant::now();
        if let Some(value) = step(now)? {
            return Ok(value);
        }

        let next = now.checked_add(interval).unwrap_or(Instant::MAX);
        match deadline {
            Some(deadline) if deadline <= now => return Err(Error::Timeout),
            // 最后一次采样对齐到截止时刻
            Some(deadline) if deadline < next => Timer::at(deadline).await,
            _ => Timer::at(next).await,
        }
    }
}

/// 让 `fut` 与取消标志赛跑。
///
/// 标志已经置位时不会启动 `fut`；等待期间置位会立即结束并返回 [`Error::Cancelled`]。
pub async fn cancellable<T, F>(cancel: Option<&CancelToken>, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    let Some(token) = cancel else {
        return fut.await;
    };
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }
    match select(fut, token.cancelled()).await {
        Either::First(result) => result,
        Either::Second(result) => result.and(Err(Error::Cancelled)),
    }
}

/// 由可选的超时时长计算截止时刻。
///
/// 超出时钟范围的超时视为没有截止时刻。
pub fn deadline_after(timeout: Option<Duration>) -> Option<Instant> {
    timeout.and_then(|t| Instant::now().checked_add(t))
}
