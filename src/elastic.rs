use super::{
    config::ElasticConfig,
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

pub type ElasticPool = Arc<ElasticPoolInner>;

/// Набор воркеров: постоянные и дополнительные ("boost").
/// Дополнительные создаются и останавливаются как единое целое
struct WorkerSet {
    permanent: Vec<Worker>,
    boost: Vec<Worker>,
}

/// Пул с изменяемым количеством воркеров в зависимости от глубины очереди.
/// Работает либо минимальное количество воркеров, либо максимальное:
/// при превышении порога очереди включаются дополнительные, при пустом
/// опросе очереди они отключаются. Порог единственный, без гистерезиса —
/// под рваной нагрузкой пул осциллирует между состояниями (намеренно
/// простая политика, см. DESIGN.md)
pub struct ElasticPoolInner {
    queue: TaskQueue,
    // не отменён <=> running; отмена необратима (shutdown)
    token: CancellationToken,
    started: AtomicBool,
    boosted: AtomicBool,
    workers: Mutex<WorkerSet>,
    next_worker_id: AtomicUsize,
    live_workers: AtomicUsize,
    executed_tasks: AtomicUsize,
    failed_tasks: AtomicUsize,
    config: ElasticConfig,
}

impl ElasticPoolInner {
    pub fn new(min_workers: usize, max_workers: usize) -> ElasticPool {
        Self::with_config(ElasticConfig::new(min_workers, max_workers))
    }

    pub fn with_config(config: ElasticConfig) -> ElasticPool {
        // поля конфигурации публичные и могут обойти валидацию new,
        // поэтому откат к значениям по-умолчанию выполняется и здесь
        let config = ElasticConfig::new(config.min_workers, config.max_workers);
        Arc::new(Self {
            queue: TaskQueue::new(),
            token: CancellationToken::new(),
            started: AtomicBool::new(false),
            boosted: AtomicBool::new(false),
            workers: Mutex::new(WorkerSet {
                permanent: Vec::with_capacity(config.min_workers),
                boost: Vec::with_capacity(config.max_workers - config.min_workers),
            }),
            next_worker_id: AtomicUsize::new(0),
            live_workers: AtomicUsize::new(0),
            executed_tasks: AtomicUsize::new(0),
            failed_tasks: AtomicUsize::new(0),
            config,
        })
    }

    /// "Ручной" запуск пула; идемпотентен. Запускает ровно min_workers
    /// постоянных воркеров
    pub fn start(self: &Arc<Self>) {
        let mut set = self.workers.lock().unwrap();
        if self.started.load(Ordering::Acquire) {
            return;
        }
        if self.token.is_cancelled() {
            warn!("start ignored: pool is shut down");
            return;
        }
        for _ in 0..self.config.min_workers {
            self.spawn_worker(&mut set.permanent, false);
        }
        self.started.store(true, Ordering::Release);
        info!(workers = set.permanent.len(), "ThreadPool started");
    }

    /// Принимает задание; автозапуск при необходимости. После постановки
    /// в очередь проверяется backlog: глубина очереди больше min_workers
    /// включает дополнительные воркеры
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
        if self.queue.len() > self.config.min_workers {
            self.boost_on();
        }
        Ok(())
    }

    /// Деактивация пула: сначала отключаются дополнительные воркеры,
    /// затем постоянные, и только потом сбрасывается running. Все три
    /// шага выполняются под одним захватом мьютекса набора воркеров:
    /// проверка токена в boost_on под тем же мьютексом становится
    /// решающей, и гонка submit/shutdown не оставит boosted = true
    /// после остановки
    pub fn shutdown(&self) {
        let mut set = self.workers.lock().unwrap();
        if self.boosted.swap(false, Ordering::AcqRel) {
            for worker in set.boost.drain(..) {
                worker.stop();
                debug!(worker = worker.id(), "boost worker stop requested");
            }
            debug!("boost off");
        }
        for worker in set.permanent.drain(..) {
            worker.stop();
            debug!(worker = worker.id(), "worker stop requested");
        }
        self.token.cancel();
        drop(set);
        info!("ThreadPool stopped");
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Активны ли дополнительные воркеры. Отражает состояние политики;
    /// живое количество воркеров догоняет его, когда остановленные
    /// воркеры замечают свои токены
    pub fn is_boosted(&self) -> bool {
        self.boosted.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.live_workers.load(Ordering::Relaxed)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &ElasticConfig {
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

    /// Пуск дополнительных воркеров; идемпотентен. Проверка и установка
    /// флага boosted атомарны относительно друг друга: обе выполняются
    /// под мьютексом набора воркеров, повторный вызов из гонки двух
    /// submit не запустит второй комплект. Быстрая проверка до
    /// блокировки держит горячий путь дешёвым
    fn boost_on(self: &Arc<Self>) {
        if self.boosted.load(Ordering::Acquire) {
            return;
        }
        let mut set = self.workers.lock().unwrap();
        if self.boosted.load(Ordering::Acquire) || self.token.is_cancelled() {
            return;
        }
        for _ in self.config.min_workers..self.config.max_workers {
            self.spawn_worker(&mut set.boost, true);
        }
        self.boosted.store(true, Ordering::Release);
        debug!(workers = set.boost.len(), "boost on");
    }

    /// Отключение дополнительных воркеров; идемпотентен. Вызывается
    /// любым воркером, увидевшим пустую очередь при активном boost,
    /// и из shutdown
    fn boost_off(&self) {
        if !self.boosted.load(Ordering::Acquire) {
            return;
        }
        let mut set = self.workers.lock().unwrap();
        if !self.boosted.swap(false, Ordering::AcqRel) {
            return;
        }
        for worker in set.boost.drain(..) {
            worker.stop();
            debug!(worker = worker.id(), "boost worker stop requested");
        }
        debug!("boost off");
    }

    fn spawn_worker(self: &Arc<Self>, set: &mut Vec<Worker>, boost: bool) {
        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let worker = Worker::new(id, &self.token);
        let token = worker.token();
        self.live_workers.fetch_add(1, Ordering::Relaxed);
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            pool.worker_loop(id, token).await;
        });
        if boost {
            debug!(worker = id, "worker is started (boost!)");
        } else {
            debug!(worker = id, "worker is started");
        }
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
                        // после shutdown уже забранное задание не запускается;
                        // при деактивации boost (пул ещё работает) забранное
                        // задание довыполняется
                        debug!(worker = id, "claimed task dropped at shutdown");
                        break;
                    }
                    self.run_task(id, task).await;
                }
                None => {
                    // пустой опрос — сигнал убрать дополнительные воркеры
                    self.boost_off();
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
