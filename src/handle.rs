use super::errors::{panic_message, PoolError};
use std::{
    future::Future,
    panic::AssertUnwindSafe,
    pin::Pin,
    task::{Context, Poll},
};
use futures::FutureExt;
use tokio::{sync::oneshot, time::Duration};

pub type TaskResult<T> = Result<T, PoolError>;

/// Handle на результат задания. Пул ничего не знает о результатах:
/// задание само публикует выход через oneshot-канал
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<TaskResult<T>>,
}

impl<T> TaskHandle<T> {
    pub async fn await_timeout(self, timeout: Duration) -> TaskResult<T> {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(PoolError::ResultDropped),
            Err(_) => Err(PoolError::Timeout),
        }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(res) => Poll::Ready(res.unwrap_or(Err(PoolError::ResultDropped))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Оборачивает замыкание в задание для пула плюс handle на его результат.
/// Паника внутри замыкания перехватывается и доставляется через handle
/// как PoolError::Panic; задание, сброшенное не выполнившись (например,
/// при shutdown), даёт PoolError::ResultDropped
pub fn task_with_handle<T, F>(f: F) -> (impl Future<Output = ()> + Send, TaskHandle<T>)
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel::<TaskResult<T>>();
    let task = async move {
        let result = std::panic::catch_unwind(AssertUnwindSafe(f))
            .map_err(|payload| PoolError::Panic(panic_message(payload)));
        let _ = tx.send(result);
    };
    (task, TaskHandle { receiver: rx })
}

/// То же для произвольного future
pub fn future_with_handle<T, Fut>(fut: Fut) -> (impl Future<Output = ()> + Send, TaskHandle<T>)
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let (tx, rx) = oneshot::channel::<TaskResult<T>>();
    let task = async move {
        let result = AssertUnwindSafe(fut)
            .catch_unwind()
            .await
            .map_err(|payload| PoolError::Panic(panic_message(payload)));
        let _ = tx.send(result);
    };
    (task, TaskHandle { receiver: rx })
}
