use std::{
    future::Future,
    pin::Pin,
    sync::atomic::{AtomicUsize, Ordering},
};
use crossbeam::deque::{Injector, Steal};
use tokio::sync::Notify;

pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Общая FIFO-очередь заданий без ограничения размера.
/// Пустой результат try_pop означает действительно пустую очередь
/// (Steal::Retry повторяется внутри), т.к. именно пустой опрос
/// запускает деактивацию дополнительных воркеров.
pub struct TaskQueue {
    inject: Injector<Task>,
    notify: Notify,
    queued: AtomicUsize,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            inject: Injector::new(),
            notify: Notify::new(),
            queued: AtomicUsize::new(0),
        }
    }

    /// Добавляет задание в хвост и будит один простаивающий воркер.
    /// Всегда успешно, никогда не блокирует
    pub fn push(&self, task: Task) {
        self.queued.fetch_add(1, Ordering::Relaxed);
        self.inject.push(task);
        self.notify.notify_one();
    }

    /// Забирает задание из головы без блокировки
    pub fn try_pop(&self) -> Option<Task> {
        loop {
            match self.inject.steal() {
                Steal::Success(task) => {
                    self.queued.fetch_sub(1, Ordering::Relaxed);
                    return Some(task);
                }
                Steal::Empty => return None,
                Steal::Retry => {}
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ожидание следующего push (permit-семантика Notify закрывает
    /// гонку между проверкой очереди и ожиданием)
    pub async fn task_available(&self) {
        self.notify.notified().await;
    }

    /// Передаёт wakeup другому воркеру: воркер, завершающийся после
    /// полученного уведомления, не должен "съесть" его
    pub fn wake_one(&self) {
        self.notify.notify_one();
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
