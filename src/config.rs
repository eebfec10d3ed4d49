use tracing::warn;

/// Конфигурация пула с фиксированным количеством воркеров
#[derive(Debug, Clone)]
pub struct FixedConfig {
    pub workers: usize,
}

impl Default for FixedConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

impl FixedConfig {
    /// Валидация с откатом к значениям по-умолчанию: допустимо workers > 1,
    /// иначе используется значение по-умолчанию (никогда не паникует)
    pub fn new(workers: usize) -> Self {
        if workers > 1 {
            Self { workers }
        } else {
            warn!(
                requested = workers,
                "неправильно указано количество воркеров, используются значения по-умолчанию"
            );
            Self::default()
        }
    }

    pub fn cpu_bound() -> Self {
        Self {
            workers: num_cpus::get().max(2),
        }
    }
}

/// Конфигурация эластичного пула: минимальное и максимальное количество воркеров
#[derive(Debug, Clone)]
pub struct ElasticConfig {
    pub min_workers: usize,
    pub max_workers: usize,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            min_workers: 1,
            max_workers: 4,
        }
    }
}

impl ElasticConfig {
    /// Валидация с откатом: допустимо 0 < min <= max, иначе (1, 4)
    pub fn new(min_workers: usize, max_workers: usize) -> Self {
        if min_workers == 0 || min_workers > max_workers {
            warn!(
                requested_min = min_workers,
                requested_max = max_workers,
                "неправильно заданы параметры, используются значения по-умолчанию"
            );
            Self::default()
        } else {
            Self {
                min_workers,
                max_workers,
            }
        }
    }

    pub fn cpu_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            min_workers: (num_cpus / 2).max(1),
            max_workers: num_cpus.max(2),
        }
    }
}
