use std::any::Any;
use thiserror::Error;

/// Ошибки пула и result-handle
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PoolError {
    #[error("pool is shut down")]
    Closed,
    #[error("task panicked: {0}")]
    Panic(String),
    #[error("task was dropped before producing a result")]
    ResultDropped,
    #[error("timed out waiting for task result")]
    Timeout,
}

/// Извлекает текст из panic payload (&str или String)
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
