use super::{
    config::FixedConfig,
    errors::{panic_message, PoolError},
    model::PoolMetrics,
    queue::{Task, TaskQueue},
    worker::Worker,
};
use std::{
    future::Future,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub type FixedPool = Arc<FixedPoolInner>;

/// Пул с фиксированным количеством воркеров: запускается один раз,
/// каждый воркер забирает задания из общей очереди до остановки
pub struct FixedPoolInner {
    queue: TaskQueue,
    // не отменён <=> running; отмена необратима (shutdown)
    token: CancellationToken,
    started: AtomicBool,
    workers: Mutex<Vec<Worker>>,
    next_worker_id: AtomicUsize,
    live_workers: AtomicUsize,
    executed_tasks: AtomicUsize,
    failed_tasks: AtomicUsize,
    config: FixedConfig,
}

impl FixedPoolInner {
    pub fn new(workers: usize) -> FixedPool {
        Self::with_config(FixedConfig::new(workers))
    }

    pub fn with_config(config: FixedConfig) -> FixedPool {
        // поля конфигурации публичные: нулевое количество воркеров
        // перехватывается и здесь (пул без воркеров никогда не разберёт
        // очередь)
        let config = if config.workers == 0 {
            warn!("неправильно указано количество воркеров, используются значения по-умолчанию");
            FixedConfig::default()
        } else {
            config
        };
        Arc::new(Self {
            queue: TaskQueue::new(),
            token: CancellationToken::new(),
            started: AtomicBool::new(false),
            workers: Mutex::new(Vec::with_capacity(config.workers)),
            next_worker_id: AtomicUsize::new(0),
            live_workers: AtomicUsize::new(0),
            executed_tasks: AtomicUsize::new(0),
            failed_tasks: AtomicUsize::new(0),
            config,
        })
    }

    /// "Ручной" запуск пула; идемпотентен. Все переходы жизненного цикла
    /// сериализуются на мьютексе набора воркеров
    pub fn start(self: &Arc<Self>) {
        let mut workers = self.workers.lock().unwrap();
        if self.started.load(Ordering::Acquire) {
            return;
        }
        if self.token.is_cancelled() {
            // пул терминален: после shutdown повторный запуск не выполняется
            warn!("start ignored: pool is shut down");
            return;
        }
        for _ in 0..self.config.workers {
            self.spawn_worker(&mut workers);
        }
        self.started.store(true, Ordering::Release);
        info!(workers = workers.len(), "ThreadPool started");
    }

    /// Принимает задание на асинхронное выполнение; возвращает сразу.
    /// Автозапуск, если забыли "стартануть". После shutdown задание
    /// отклоняется явно, а не теряется молча
    pub fn submit<F>(self: &Arc<Self>, fut: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.token.is_cancelled() {
            return Err(PoolError::Closed);
        }
        if !self.started.load(Ordering::Acquire) {
            self.start();
        }
        self.queue.push(Box::pin(fut));
        Ok(())
    }

    /// Деактивация пула: отменяется только токен пула, воркеры замечают
    /// его на следующей итерации или выходя из ожидания. Уже поставленные
    /// в очередь задания могут не выполниться (drain не гарантируется)
    pub fn shutdown(&self) {
        self.token.cancel();
        info!("ThreadPool stopped");
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn worker_count(&self) -> usize {
        self.live_workers.load(Ordering::Relaxed)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &FixedConfig {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            queued_tasks: self.queue.len(),
            live_workers: self.live_workers.load(Ordering::Relaxed),
            executed_tasks: self.executed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
        }
    }

    fn spawn_worker(self: &Arc<Self>, set: &mut Vec<Worker>) {
        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let worker = Worker::new(id, &self.token);
        let token = worker.token();
        self.live_workers.fetch_add(1, Ordering::Relaxed);
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            pool.worker_loop(id, token).await;
        });
        debug!(worker = id, "worker is started");
        set.push(worker);
    }

    async fn worker_loop(&self, id: usize, token: CancellationToken) {
        loop {
            if token.is_cancelled() {
                break;
            }
            match self.queue.try_pop() {
                Some(task) => {
                    if self.token.is_cancelled() {
                        // после shutdown уже забранное задание не запускается
                        debug!(worker = id, "claimed task dropped at shutdown");
                        break;
                    }
                    self.run_task(id, task).await;
                }
                None => {
                    tokio::select! {
                        _ = self.queue.task_available() => {}
                        _ = token.cancelled() => {
                            self.queue.wake_one();
                            break;
                        }
                    }
                }
            }
        }
        self.live_workers.fetch_sub(1, Ordering::Relaxed);
        debug!(worker = id, "worker stopped");
    }

    /// Паника задания изолируется: воркер переживает её и ёмкость пула
    /// не уменьшается
    async fn run_task(&self, id: usize, task: Task) {
        match AssertUnwindSafe(task).catch_unwind().await {
            Ok(()) => {
                self.executed_tasks.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                self.failed_tasks.fetch_add(1, Ordering::Relaxed);
                warn!(worker = id, "task panicked: {}", panic_message(payload));
            }
        }
    }
}
