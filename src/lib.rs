//! Пул заданий с фиксированным и эластичным количеством воркеров
//!
//! # Features
//! - Общая неблокирующая FIFO-очередь заданий (crossbeam Injector + Notify)
//! - Эластичный пул: boost до максимума при росте очереди, возврат к минимуму
//! - Автозапуск при первой отправке задания, идемпотентный start
//! - Graceful shutdown через CancellationToken, явный отказ после остановки
//! - Изоляция паник: задание не убивает свой воркер
//! - Result-handle через oneshot для получения результатов заданий
//! - Метрики очереди и воркеров

pub mod config;
pub mod elastic;
pub mod errors;
pub mod fixed;
pub mod handle;
pub mod model;
pub mod queue;
pub mod worker;

pub use config::{ElasticConfig, FixedConfig};
pub use elastic::{ElasticPool, ElasticPoolInner};
pub use errors::PoolError;
pub use fixed::{FixedPool, FixedPoolInner};
pub use handle::{future_with_handle, task_with_handle, TaskHandle, TaskResult};
pub use model::PoolMetrics;
