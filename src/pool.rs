//! 有界并发的工作池
//!
//! 派发前先获取信号量许可，所以任意时刻存在的任务数都不超过 `workers`，
//! 即使候选集有上百万条也不会一次性创建全部任务。

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::error::{Error, Result};
use crate::logger::Logger;

/// 默认并发数
pub const DEFAULT_WORKERS: usize = 300;

/// 允许的最大并发数
pub const MAX_WORKERS: usize = 10_000;

/// 校验并发数是否在 `1..=MAX_WORKERS` 范围内
pub fn validate_workers(workers: usize) -> Result<usize> {
    if workers == 0 || workers > MAX_WORKERS {
        return Err(Error::InvalidWorkers {
            got: workers,
            max: MAX_WORKERS,
        });
    }
    Ok(workers)
}

/// 工作池
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    logger: Logger,
}

impl WorkerPool {
    /// 创建工作池，并发数超出范围时返回错误
    pub fn new(workers: usize, logger: Logger) -> Result<Self> {
        Ok(WorkerPool {
            workers: validate_workers(workers)?,
            logger,
        })
    }

    /// 并发上限
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// 对每个元素恰好执行一次 `job`，等待全部任务结束后返回派发数量
    ///
    /// 完成顺序不作保证。单个任务 panic 只会被记录，不会中断其余任务。
    pub async fn run<I, T, F, Fut>(&self, items: I, job: F) -> usize
    where
        I: IntoIterator<Item = T>,
        F: Fn(T) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut dispatched = 0usize;

        for item in items {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let fut = job(item);
            tasks.spawn(async move {
                fut.await;
                drop(permit);
            });
            dispatched += 1;

            // 及时回收已结束的任务，避免 JoinSet 无限增长
            while let Some(result) = tasks.try_join_next() {
                self.reap(result);
            }
        }

        while let Some(result) = tasks.join_next().await {
            self.reap(result);
        }

        self.logger
            .debug(format_args!("worker pool drained, {} jobs dispatched", dispatched));
        dispatched
    }

    fn reap(&self, result: std::result::Result<(), JoinError>) {
        if let Err(e) = result {
            if e.is_panic() {
                self.logger.error(format_args!("worker task panicked: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_validate_workers() {
        assert!(validate_workers(0).is_err());
        assert!(validate_workers(MAX_WORKERS + 1).is_err());
        assert_eq!(validate_workers(1).unwrap(), 1);
        assert_eq!(validate_workers(MAX_WORKERS).unwrap(), MAX_WORKERS);
        assert!(WorkerPool::new(0, Logger::quiet()).is_err());
    }

    async fn run_tracked(workers: usize, items: usize) -> (usize, usize, Vec<usize>) {
        let pool = WorkerPool::new(workers, Logger::quiet()).unwrap();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let dispatched = pool
            .run(0..items, |i| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                let seen = Arc::clone(&seen);
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    seen.lock().unwrap().push(i);
                    active.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await;

        let mut seen = seen.lock().unwrap().clone();
        seen.sort_unstable();
        (dispatched, peak.load(Ordering::SeqCst), seen)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let (dispatched, peak, seen) = run_tracked(4, 60).await;
        assert_eq!(dispatched, 60);
        assert!(peak <= 4, "peak concurrency {} exceeded 4", peak);
        assert_eq!(seen, (0..60).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_single_worker_runs_sequentially() {
        let (dispatched, peak, seen) = run_tracked(1, 10).await;
        assert_eq!(dispatched, 10);
        assert_eq!(peak, 1);
        assert_eq!(seen.len(), 10);
    }

    #[tokio::test]
    async fn test_more_workers_than_items() {
        let (dispatched, peak, seen) = run_tracked(500, 3).await;
        assert_eq!(dispatched, 3);
        assert!(peak <= 3);
        assert_eq!(seen, vec![0, 1, 2]);

        let (dispatched, _, seen) = run_tracked(8, 0).await;
        assert_eq!(dispatched, 0);
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_stop_pool() {
        let pool = WorkerPool::new(2, Logger::quiet()).unwrap();
        let done = Arc::new(AtomicUsize::new(0));

        let dispatched = pool
            .run(0..6, |i| {
                let done = Arc::clone(&done);
                async move {
                    if i == 3 {
                        panic!("boom");
                    }
                    done.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;

        assert_eq!(dispatched, 6);
        assert_eq!(done.load(Ordering::SeqCst), 5);
    }
}
