//! 运行状态计数器
//!
//! 由所有工作任务并发写入、由进度追踪器并发读取，
//! 全部使用原子计数，热路径上没有锁。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 一次运行的共享计数器，只增不减
#[derive(Debug)]
pub struct ProgressState {
    total: u64,
    completed: AtomicU64,
    resolved: AtomicU64,
    alive: AtomicU64,
    started: Instant,
}

impl ProgressState {
    /// 创建计数器，`total` 为候选域名总数
    pub fn new(total: u64) -> Self {
        ProgressState {
            total,
            completed: AtomicU64::new(0),
            resolved: AtomicU64::new(0),
            alive: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// 候选域名总数
    pub fn total(&self) -> u64 {
        self.total
    }

    /// 开始时间
    pub fn started(&self) -> Instant {
        self.started
    }

    /// 记录一个候选域名处理完成，每个候选只能调用一次
    pub fn record_completed(&self) {
        let previous = self.completed.fetch_add(1, Ordering::Relaxed);
        debug_assert!(previous < self.total, "completed counter exceeded total");
    }

    /// 记录一个候选域名通过了DNS预过滤
    pub fn record_resolved(&self) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一个存活的候选域名
    pub fn record_alive(&self) {
        self.alive.fetch_add(1, Ordering::Relaxed);
    }

    /// 已完成数
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// DNS解析成功数
    pub fn resolved(&self) -> u64 {
        self.resolved.load(Ordering::Relaxed)
    }

    /// 存活数
    pub fn alive(&self) -> u64 {
        self.alive.load(Ordering::Relaxed)
    }

    /// 读取当前计数的快照
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total,
            completed: self.completed(),
            resolved: self.resolved(),
            alive: self.alive(),
            elapsed: self.started.elapsed(),
        }
    }
}

/// 某一时刻的计数快照
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// 候选域名总数
    pub total: u64,
    /// 已完成数
    pub completed: u64,
    /// DNS解析成功数
    pub resolved: u64,
    /// 存活数
    pub alive: u64,
    /// 从开始到快照时刻的耗时
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// 完成百分比，没有任何候选时视为已完成
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    /// 每秒完成的候选数
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / secs
    }

    /// 是否全部完成
    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }
}
