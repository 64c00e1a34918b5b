//! 结果收集与汇总统计

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::HumanDuration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::logger::Logger;
use crate::model::ProbeOutcome;

/// 工作任务提交探测结果的发送端
pub type ResultSender = mpsc::UnboundedSender<ProbeOutcome>;

/// 结果收集器
///
/// 接收所有探测结果，只保留存活的，顺序即到达顺序。
/// 所有发送端被丢弃（工作池排空）后收集结束。
pub struct ResultCollector {
    receiver: mpsc::UnboundedReceiver<ProbeOutcome>,
    logger: Logger,
}

/// 创建结果通道
pub fn result_channel(logger: Logger) -> (ResultSender, ResultCollector) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (sender, ResultCollector { receiver, logger })
}

impl ResultCollector {
    /// 持续接收直到通道关闭，返回存活结果
    pub async fn collect(mut self) -> Vec<ProbeOutcome> {
        let mut alive = Vec::new();
        while let Some(outcome) = self.receiver.recv().await {
            if let Some(hit) = outcome.hit {
                self.logger.found(outcome.host(), hit.scheme.as_str(), hit.status);
                alive.push(outcome);
            }
        }
        alive
    }

    /// 在后台任务中收集
    pub fn spawn(self) -> JoinHandle<Vec<ProbeOutcome>> {
        tokio::spawn(self.collect())
    }
}

/// 一次运行的累计统计
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    /// 候选域名总数
    pub total: u64,
    /// 已完成数，运行结束时等于总数
    pub completed: u64,
    /// 通过DNS预过滤的数量
    pub resolved: u64,
    /// 存活数量
    pub alive: u64,
    /// 总耗时
    pub elapsed: Duration,
    /// 开始时间
    pub started_at: DateTime<Utc>,
}

/// 存活结果汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    /// 存活数量
    pub alive: usize,
    /// 按协议计数
    pub by_scheme: BTreeMap<String, usize>,
    /// 状态码直方图
    pub by_status: BTreeMap<u16, usize>,
    /// 按来源域名计数
    pub by_domain: BTreeMap<String, usize>,
}

/// 统计存活结果的协议、状态码和来源域名分布
pub fn summarize(outcomes: &[ProbeOutcome]) -> SummaryStats {
    let mut stats = SummaryStats::default();

    for outcome in outcomes.iter().filter(|o| o.is_alive()) {
        stats.alive += 1;
        if let Some(hit) = outcome.hit {
            *stats.by_scheme.entry(hit.scheme.to_string()).or_insert(0) += 1;
            *stats.by_status.entry(hit.status).or_insert(0) += 1;
        }
        *stats
            .by_domain
            .entry(outcome.candidate.domain.to_string())
            .or_insert(0) += 1;
    }

    stats
}

/// 打印汇总统计
pub fn print_summary(summary: &SummaryStats, run: &RunStats) {
    println!("\n{}", "=".repeat(60));
    println!("                    汇总统计");
    println!("{}", "=".repeat(60));

    println!("候选域名总数: {}", run.total);
    println!("已完成: {}", run.completed);
    println!("DNS解析成功: {}", run.resolved);
    println!("存活域名: {}", run.alive);
    println!("耗时: {}", HumanDuration(run.elapsed));

    if summary.alive == 0 {
        println!("{}", "=".repeat(60));
        return;
    }

    println!("\n协议分布:");
    for (scheme, count) in &summary.by_scheme {
        println!("  {}: {}", scheme, count);
    }

    println!("\n状态码分布:");
    for (status, count) in &summary.by_status {
        println!("  {}: {}", status, count);
    }

    println!("\n来源域名分布:");
    for (domain, count) in &summary.by_domain {
        println!("  {}: {}", domain, count);
    }

    println!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gen::{generate_subdomains, FallbackPolicy};
    use crate::model::{ProbeHit, Scheme};

    fn outcomes() -> Vec<ProbeOutcome> {
        let candidates = generate_subdomains("a.b.example.com", "dev", FallbackPolicy::Skip);
        vec![
            ProbeOutcome::probed(
                candidates[0].clone(),
                Some(ProbeHit {
                    scheme: Scheme::Https,
                    status: 200,
                }),
            ),
            ProbeOutcome::unresolved(candidates[1].clone()),
            ProbeOutcome::probed(
                candidates[1].clone(),
                Some(ProbeHit {
                    scheme: Scheme::Http,
                    status: 404,
                }),
            ),
            ProbeOutcome::probed(candidates[0].clone(), None),
        ]
    }

    #[tokio::test]
    async fn test_collector_keeps_only_alive() {
        let (sender, collector) = result_channel(Logger::quiet());
        let handle = collector.spawn();

        for outcome in outcomes() {
            sender.send(outcome).unwrap();
        }
        drop(sender);

        let alive = handle.await.unwrap();
        assert_eq!(alive.len(), 2);
        assert!(alive.iter().all(|o| o.is_alive()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_collector_accepts_concurrent_senders() {
        let (sender, collector) = result_channel(Logger::quiet());
        let handle = collector.spawn();
        let template = outcomes();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let sender = sender.clone();
            let batch = template.clone();
            tasks.push(tokio::spawn(async move {
                for outcome in batch {
                    sender.send(outcome).unwrap();
                }
            }));
        }
        drop(sender);
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(handle.await.unwrap().len(), 32);
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&outcomes());
        assert_eq!(summary.alive, 2);
        assert_eq!(summary.by_scheme.get("https"), Some(&1));
        assert_eq!(summary.by_scheme.get("http"), Some(&1));
        assert_eq!(summary.by_status.get(&404), Some(&1));
        assert_eq!(summary.by_domain.get("a.b.example.com"), Some(&2));
    }
}
