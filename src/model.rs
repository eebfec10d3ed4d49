/// Снимок метрик пула
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub queued_tasks: usize,
    pub live_workers: usize,
    pub executed_tasks: usize,
    pub failed_tasks: usize,
}

impl PoolMetrics {
    pub fn queue_pressure(&self) -> f64 {
        self.queued_tasks as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.executed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.executed_tasks as f64 / total as f64
    }
}
