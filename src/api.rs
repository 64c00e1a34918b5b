//! 探测引擎
//!
//! 把生成器、DNS预过滤、存活探测、工作池、进度和结果收集组装成一次完整运行。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::dns_resolver::{parse_resolvers, DnsGate, Resolve, DEFAULT_DNS_TIMEOUT};
use crate::error::{Error, Result};
use crate::gen::{generate_all, FallbackPolicy, DEFAULT_FALLBACK_POLICY};
use crate::handle::{result_channel, RunStats};
use crate::logger::Logger;
use crate::model::{Candidate, ProbeOutcome};
use crate::pool::{validate_workers, WorkerPool, DEFAULT_WORKERS};
use crate::progress::{ProgressTracker, DEFAULT_PROGRESS_INTERVAL};
use crate::state::ProgressState;
use crate::verify::{AlivePolicy, LivenessProbe, Probe, DEFAULT_ALIVE_POLICY, DEFAULT_REQUEST_TIMEOUT};

/// 运行配置
#[derive(Debug, Clone)]
pub struct StrikeConfig {
    /// 最大并发探测数
    pub workers: usize,
    /// 单次HTTP请求超时
    pub request_timeout: Duration,
    /// 单次DNS查询超时
    pub dns_timeout: Duration,
    /// 是否输出调试信息，为真时引擎会把传入的日志句柄提升到调试级别
    pub debug: bool,
    /// 自定义DNS服务器，为空时使用默认上游
    pub resolvers: Vec<String>,
    /// 标签不足时的生成策略
    pub fallback: FallbackPolicy,
    /// 存活判定策略
    pub alive_policy: AlivePolicy,
    /// 是否显示进度条
    pub show_progress: bool,
    /// 进度刷新间隔
    pub progress_interval: Duration,
}

impl Default for StrikeConfig {
    fn default() -> Self {
        StrikeConfig {
            workers: DEFAULT_WORKERS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            dns_timeout: DEFAULT_DNS_TIMEOUT,
            debug: false,
            resolvers: Vec::new(),
            fallback: DEFAULT_FALLBACK_POLICY,
            alive_policy: DEFAULT_ALIVE_POLICY,
            show_progress: true,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl StrikeConfig {
    /// 在任何探测开始之前校验配置
    pub fn validate(&self) -> Result<()> {
        validate_workers(self.workers)?;
        if self.request_timeout.is_zero() {
            return Err(Error::ZeroTimeout("request"));
        }
        if self.dns_timeout.is_zero() {
            return Err(Error::ZeroTimeout("dns"));
        }
        if self.show_progress && self.progress_interval.is_zero() {
            return Err(Error::ZeroTimeout("progress interval"));
        }
        parse_resolvers(&self.resolvers)?;
        Ok(())
    }
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct StrikeReport {
    /// 存活的候选域名，按完成顺序排列
    pub alive: Vec<ProbeOutcome>,
    /// 累计统计
    pub stats: RunStats,
}

impl StrikeReport {
    /// 存活主机名列表
    pub fn hosts(&self) -> Vec<&str> {
        self.alive.iter().map(|o| o.host()).collect()
    }
}

/// 子域名组合探测引擎
///
/// DNS解析器和HTTP客户端在构造时创建一次，整个运行期间只读共享。
pub struct StrikeEngine {
    config: StrikeConfig,
    gate: Arc<dyn Resolve>,
    probe: Arc<dyn Probe>,
    logger: Logger,
}

impl StrikeEngine {
    /// 使用真实的DNS解析器和HTTP客户端创建引擎
    pub fn new(config: StrikeConfig, logger: Logger) -> Result<Self> {
        config.validate()?;
        let logger = logger.with_debug(config.debug);
        let gate = DnsGate::new(&config.resolvers, config.dns_timeout, logger.clone())?;
        let probe = LivenessProbe::new(config.request_timeout, config.alive_policy, logger.clone())?;
        Self::with_components(config, Arc::new(gate), Arc::new(probe), logger)
    }

    /// 注入自定义的DNS预过滤器和存活探测器
    pub fn with_components(
        config: StrikeConfig,
        gate: Arc<dyn Resolve>,
        probe: Arc<dyn Probe>,
        logger: Logger,
    ) -> Result<Self> {
        config.validate()?;
        let logger = logger.with_debug(config.debug);
        Ok(StrikeEngine {
            config,
            gate,
            probe,
            logger,
        })
    }

    /// 当前配置
    pub fn config(&self) -> &StrikeConfig {
        &self.config
    }

    /// 引擎实际使用的日志句柄
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// 只生成候选域名，不做任何网络请求
    pub fn generate(&self, domains: &[String], words: &[String]) -> Vec<Candidate> {
        generate_all(domains, words, self.config.fallback)
    }

    /// 生成候选域名并完成全部探测
    pub async fn run(&self, domains: &[String], words: &[String]) -> Result<StrikeReport> {
        if domains.is_empty() {
            return Err(Error::MissingDomain);
        }

        self.logger.info(format_args!(
            "已加载 {} 个字典词，{} 个目标域名",
            words.len(),
            domains.len()
        ));
        let candidates = self.generate(domains, words);
        self.run_candidates(candidates).await
    }

    /// 探测给定的候选集合
    pub async fn run_candidates(&self, candidates: Vec<Candidate>) -> Result<StrikeReport> {
        let pool = WorkerPool::new(self.config.workers, self.logger.clone())?;
        let started_at = Utc::now();
        let state = Arc::new(ProgressState::new(candidates.len() as u64));

        self.logger.info(format_args!(
            "开始探测 {} 个候选域名，并发数 {}",
            candidates.len(),
            pool.workers()
        ));

        let tracker = if self.config.show_progress && !candidates.is_empty() {
            Some(ProgressTracker::start(
                Arc::clone(&state),
                self.config.progress_interval,
            ))
        } else {
            None
        };

        let (sender, collector) = result_channel(self.logger.clone());
        let collecting = collector.spawn();

        pool.run(candidates, |candidate| {
            let gate = Arc::clone(&self.gate);
            let probe = Arc::clone(&self.probe);
            let state = Arc::clone(&state);
            let sender = sender.clone();
            async move {
                let outcome = strike_candidate(gate.as_ref(), probe.as_ref(), &state, candidate).await;
                state.record_completed();
                let _ = sender.send(outcome);
            }
        })
        .await;

        // 所有发送端释放后收集器才会结束
        drop(sender);
        let alive = match collecting.await {
            Ok(alive) => alive,
            Err(e) => {
                self.logger.error(format_args!("result collector failed: {}", e));
                Vec::new()
            }
        };

        let last = match tracker {
            Some(tracker) => tracker.stop().await,
            None => state.snapshot(),
        };
        self.logger.info(format_args!(
            "完成 {:.1}%，平均 {:.1} 个/秒，存活 {}",
            last.percentage(),
            last.rate(),
            last.alive
        ));

        Ok(StrikeReport {
            alive,
            stats: RunStats {
                total: last.total,
                completed: last.completed,
                resolved: last.resolved,
                alive: last.alive,
                elapsed: last.elapsed,
                started_at,
            },
        })
    }
}

/// 单个候选域名的处理链：先DNS预过滤，通过后再做HTTP探测
async fn strike_candidate(
    gate: &dyn Resolve,
    probe: &dyn Probe,
    state: &ProgressState,
    candidate: Candidate,
) -> ProbeOutcome {
    if !gate.resolves(&candidate.host).await {
        return ProbeOutcome::unresolved(candidate);
    }
    state.record_resolved();

    let hit = probe.probe(&candidate.host).await;
    if hit.is_some() {
        state.record_alive();
    }
    ProbeOutcome::probed(candidate, hit)
}

/// 便捷的组合探测函数，使用默认配置且不显示进度条
pub async fn strike_subdomains(domains: Vec<String>, words: Vec<String>) -> Result<StrikeReport> {
    let config = StrikeConfig {
        show_progress: false,
        ..Default::default()
    };

    let engine = StrikeEngine::new(config, Logger::new(false))?;
    engine.run(&domains, &words).await
}
