use tokio_util::sync::CancellationToken;

/// Handle воркера на стороне контроллера: идентификатор плюс приватный
/// стоп-токен. Токен — child пула: отмена токена пула останавливает все
/// воркеры, отмена приватного токена — только этот (деактивация boost)
pub struct Worker {
    id: usize,
    token: CancellationToken,
}

impl Worker {
    pub fn new(id: usize, pool_token: &CancellationToken) -> Self {
        Self {
            id,
            token: pool_token.child_token(),
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Клон токена для цикла воркера
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Сигнал остановки после текущего/следующего опроса очереди
    pub fn stop(&self) {
        self.token.cancel();
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}
