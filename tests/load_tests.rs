#[cfg(test)]
mod tests {
    use elastic_pool::{
        config::FixedConfig,
        elastic::ElasticPoolInner,
        fixed::FixedPoolInner,
        handle::task_with_handle,
    };
    use std::{
        future::Future,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::{Duration, Instant},
    };

    async fn measure<F, Fut, T>(name: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let start = Instant::now();
        let result = f().await;
        let elapsed = start.elapsed();
        println!("✓ {}: {:?}", name, elapsed);
        result
    }

    async fn wait_until<F>(cond: F, timeout: Duration) -> bool
    where
        F: Fn() -> bool,
    {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cond()
    }

    /// Детерминированная CPU-нагрузка
    fn compute(i: u64) -> f64 {
        let mut acc = 0.0f64;
        for k in 1..=20_000u64 {
            acc += ((i.wrapping_mul(k)) % 1000) as f64 / 1000.0;
        }
        acc
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_test_1_sum_matches_sequential() {
        println!("\n=== LOAD TEST 1: 200 вычислений, сумма как при последовательном прогоне ===");

        let mut sequential = 0.0;
        for i in 0..200u64 {
            sequential += compute(i);
        }

        let pool = ElasticPoolInner::new(2, 4);
        pool.start();

        let value = measure("200 tasks on elastic(2,4)", || async {
            let mut handles = Vec::with_capacity(200);
            for i in 0..200u64 {
                let (task, handle) = task_with_handle(move || compute(i));
                pool.submit(task).unwrap();
                handles.push(handle);
            }
            // порядок суммирования совпадает с последовательным:
            // handles опрашиваются в порядке отправки
            let mut value = 0.0;
            for handle in handles {
                value += handle.await.unwrap();
            }
            value
        })
        .await;

        assert_eq!(sequential, value, "параллельность не должна менять сумму");
        pool.shutdown();
        println!("  ✓ Суммы совпадают: {:.6}", value);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_test_2_10k_fast_tasks() {
        println!("\n=== LOAD TEST 2: 10k быстрых заданий ===");
        let pool = FixedPoolInner::with_config(FixedConfig::cpu_bound());
        pool.start();

        let counter = Arc::new(AtomicUsize::new(0));
        measure("submit 10k tasks", || async {
            for _ in 0..10_000 {
                let c = counter.clone();
                pool.submit(async move {
                    c.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
            }
        })
        .await;

        let c = counter.clone();
        assert!(
            wait_until(move || c.load(Ordering::Relaxed) == 10_000, Duration::from_secs(10)).await,
            "все 10k заданий должны выполниться"
        );

        let metrics = pool.metrics();
        println!("  Выполнено: {}/10000", metrics.executed_tasks);
        println!("  Success rate: {:.1}%", metrics.success_rate() * 100.0);
        pool.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_test_3_parallel_submitters() {
        println!("\n=== LOAD TEST 3: 8 параллельных отправителей ===");
        let pool = ElasticPoolInner::new(2, 4);
        pool.start();

        let slots: Arc<Vec<AtomicUsize>> =
            Arc::new((0..4_000).map(|_| AtomicUsize::new(0)).collect());

        measure("8 x 500 concurrent submits", || async {
            let mut submitters = Vec::new();
            for s in 0..8usize {
                let pool = pool.clone();
                let slots = slots.clone();
                submitters.push(tokio::spawn(async move {
                    for i in 0..500usize {
                        let slots = slots.clone();
                        let idx = s * 500 + i;
                        pool.submit(async move {
                            slots[idx].fetch_add(1, Ordering::Relaxed);
                        })
                        .unwrap();
                    }
                }));
            }
            for submitter in submitters {
                submitter.await.unwrap();
            }
        })
        .await;

        let done = {
            let slots = slots.clone();
            wait_until(
                move || slots.iter().map(|s| s.load(Ordering::Relaxed)).sum::<usize>() == 4_000,
                Duration::from_secs(10),
            )
            .await
        };
        assert!(done, "все 4000 заданий должны выполниться");
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(slot.load(Ordering::Relaxed), 1, "задание {} выполнено не один раз", i);
        }

        pool.shutdown();
        println!("  ✓ 4000/4000 без дублей при конкурентной отправке");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_test_4_panic_storm() {
        println!("\n=== LOAD TEST 4: 1k заданий, каждое десятое паникует ===");

        let _guard = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let pool = ElasticPoolInner::new(2, 4);
        pool.start();

        measure("1k tasks with panics", || async {
            for i in 0..1_000u64 {
                pool.submit(async move {
                    if i % 10 == 0 {
                        panic!("storm {}", i);
                    }
                    let _ = compute(i % 16);
                })
                .unwrap();
            }
        })
        .await;

        let pool_done = pool.clone();
        assert!(
            wait_until(
                move || {
                    let m = pool_done.metrics();
                    m.executed_tasks + m.failed_tasks == 1_000
                },
                Duration::from_secs(10)
            )
            .await,
            "все 1000 заданий должны быть обработаны"
        );

        let metrics = pool.metrics();
        assert_eq!(metrics.executed_tasks, 900);
        assert_eq!(metrics.failed_tasks, 100);
        assert!(pool.is_running(), "пул должен пережить паники");
        println!("  Success rate: {:.1}%", metrics.success_rate() * 100.0);

        pool.shutdown();
        drop(_guard);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_test_5_boost_cycles() {
        println!("\n=== LOAD TEST 5: Циклы boost/de-boost ===");
        let pool = ElasticPoolInner::new(2, 4);
        pool.start();

        let counter = Arc::new(AtomicUsize::new(0));
        for cycle in 0..5usize {
            // всплеск: очередь растёт быстрее, чем воркеры её разбирают
            for i in 0..100u64 {
                let c = counter.clone();
                pool.submit(async move {
                    let _ = compute(i % 8);
                    c.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
            }

            let expected = (cycle + 1) * 100;
            let c = counter.clone();
            assert!(
                wait_until(move || c.load(Ordering::Relaxed) == expected, Duration::from_secs(10))
                    .await,
                "всплеск {} должен быть разобран",
                cycle
            );
            assert!(
                wait_until(|| !pool.is_boosted(), Duration::from_secs(5)).await,
                "после разбора очереди boost должен выключиться"
            );
        }

        assert!(
            wait_until(|| pool.worker_count() == 2, Duration::from_secs(5)).await,
            "после всех циклов должен остаться минимум воркеров"
        );
        assert_eq!(counter.load(Ordering::Relaxed), 500);

        pool.shutdown();
        println!("  ✓ 5 циклов boost/de-boost, 500/500 заданий");
    }
}
