use elastic_pool::{task_with_handle, ElasticPoolInner};
use tokio::runtime::Builder;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const TASKS: u64 = 200;

/// Детерминированная CPU-нагрузка вместо Compute.doWork
fn compute(i: u64) -> f64 {
    let mut acc = 0.0f64;
    for k in 1..=200_000u64 {
        acc += ((i.wrapping_mul(k)) % 1000) as f64 / 1000.0;
    }
    acc
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rt = Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async {
        // последовательный прогон для сравнения
        let now = Instant::now();
        let mut sequential = 0.0;
        for i in 0..TASKS {
            sequential += compute(i);
        }
        println!("sequential: executed by {:?}, value: {:.6}", now.elapsed(), sequential);

        let pool = ElasticPoolInner::new(2, 4);
        pool.start();

        let now = Instant::now();
        println!("ThreadPool is boosted? {}", pool.is_boosted());

        let mut handles = Vec::with_capacity(TASKS as usize);
        for i in 0..TASKS {
            let (task, handle) = task_with_handle(move || compute(i));
            pool.submit(task).unwrap();
            handles.push(handle);
        }
        println!("ThreadPool is boosted? {}", pool.is_boosted());

        // handles опрашиваются в порядке отправки, поэтому порядок
        // суммирования совпадает с последовательным прогоном
        let mut value = 0.0;
        for handle in handles {
            value += handle.await.unwrap();
        }

        println!("pool: executed by {:?}, value: {:.6}", now.elapsed(), value);
        assert_eq!(sequential, value);

        pool.shutdown();
    });
}
