//! # substrike
//!
//! 子域名组合生成与存活探测工具库。
//!
//! 对每个目标域名和字典词，把字典词插入到域名的各个标签位置生成候选主机名，
//! 先用DNS预过滤掉无法解析的候选，再依次尝试 HTTPS、HTTP 判断是否存活。
//!
//! ## 特性
//!
//! - **确定性生成**: 相同的输入总是得到相同顺序的候选集合
//! - **DNS预过滤**: 无法解析的候选不会发起任何HTTP请求
//! - **有界并发**: 同时在途的探测数不超过配置的工作数
//! - **多格式输出**: 支持TXT、JSON、CSV三种输出格式
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use substrike::strike_subdomains;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let domains = vec!["api.prod.example.com".to_string()];
//!     let words = vec!["auth".to_string(), "staging".to_string()];
//!     let report = strike_subdomains(domains, words).await?;
//!
//!     println!("发现 {} 个存活域名", report.alive.len());
//!     for host in report.hosts() {
//!         println!("  {}", host);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## 高级配置
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use substrike::{AlivePolicy, Logger, StrikeConfig, StrikeEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StrikeConfig {
//!         workers: 100,
//!         request_timeout: Duration::from_secs(5),
//!         resolvers: vec!["1.1.1.1".to_string()],
//!         alive_policy: AlivePolicy::StatusBelow400,
//!         ..Default::default()
//!     };
//!
//!     let engine = StrikeEngine::new(config, Logger::new(false))?;
//!     let report = engine
//!         .run(&["api.prod.example.com".to_string()], &["dev".to_string()])
//!         .await?;
//!
//!     println!("存活 {}/{}", report.stats.alive, report.stats.total);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// 内部模块
pub mod logger;
pub mod error;
pub mod input;
pub mod model;
pub mod gen;
pub mod state;
pub mod progress;
pub mod pool;
pub mod handle;
pub mod verify;
pub mod dns_resolver;
pub mod api;
pub mod output;

// 重新导出主要的公共API
pub use api::{strike_subdomains, StrikeConfig, StrikeEngine, StrikeReport};

// 导出其他有用的类型
pub use error::{Error, Result};
pub use logger::{init_logger, Logger};
pub use model::{Candidate, ProbeHit, ProbeOutcome, Scheme};
pub use gen::{generate_all, generate_subdomains, FallbackPolicy};
pub use verify::{AlivePolicy, LivenessProbe, Probe};
pub use dns_resolver::{DnsGate, Resolve};
pub use pool::WorkerPool;
pub use progress::ProgressTracker;
pub use state::{ProgressSnapshot, ProgressState};
pub use handle::{summarize, ResultCollector, RunStats, SummaryStats};
pub use output::export_results;
pub use input::{parse_timeout, OutputFormat};
