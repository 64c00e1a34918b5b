//! DNS预过滤
//!
//! 未指定DNS服务器时读取系统配置（`/etc/resolv.conf`），
//! 与HTTP客户端解析主机名时使用同一组上游。

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::system_conf::read_system_conf;
use trust_dns_resolver::TokioAsyncResolver;

use crate::error::{Error, Result};
use crate::logger::Logger;

/// 默认DNS查询超时
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(2);

/// DNS预过滤接口
///
/// 只关心能否解析，NXDOMAIN、超时、网络不可达都统一视为失败。
#[async_trait]
pub trait Resolve: Send + Sync {
    /// 候选域名能否解析出至少一个地址
    async fn resolves(&self, host: &str) -> bool;
}

/// 基于 trust-dns 的DNS预过滤器
pub struct DnsGate {
    resolver: TokioAsyncResolver,
    timeout: Duration,
    logger: Logger,
}

impl DnsGate {
    /// 创建解析器
    ///
    /// `resolvers` 为空时使用系统DNS配置，否则只查询给定的服务器。
    /// 每次查询只尝试一次并关闭缓存，单次查询受 `timeout` 限制。
    pub fn new(resolvers: &[String], timeout: Duration, logger: Logger) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::ZeroTimeout("dns"));
        }

        let (config, opts) = resolver_setup(resolvers, timeout, &logger)?;
        Ok(DnsGate {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
            logger,
        })
    }
}

/// 生成解析器配置和选项
///
/// 系统配置读取失败时退回库默认的上游并给出警告。
/// 无论来源如何，超时、尝试次数和缓存都会被覆盖。
pub fn resolver_setup(
    resolvers: &[String],
    timeout: Duration,
    logger: &Logger,
) -> Result<(ResolverConfig, ResolverOpts)> {
    let (config, mut opts) = if resolvers.is_empty() {
        match read_system_conf() {
            Ok(system) => system,
            Err(e) => {
                logger.warn(format_args!(
                    "failed to read system DNS config, using library defaults: {}",
                    e
                ));
                (ResolverConfig::default(), ResolverOpts::default())
            }
        }
    } else {
        let ips = parse_resolvers(resolvers)?;
        (
            ResolverConfig::from_parts(None, vec![], NameServerConfigGroup::from_ips_clear(&ips, 53, true)),
            ResolverOpts::default(),
        )
    };

    opts.timeout = timeout;
    opts.attempts = 1;
    opts.cache_size = 0;
    Ok((config, opts))
}

#[async_trait]
impl Resolve for DnsGate {
    async fn resolves(&self, host: &str) -> bool {
        match tokio::time::timeout(self.timeout, self.resolver.lookup_ip(host)).await {
            Ok(Ok(lookup)) => lookup.iter().next().is_some(),
            Ok(Err(e)) => {
                self.logger.debug(format_args!("DNS failed for {}: {}", host, e));
                false
            }
            Err(_) => {
                self.logger.debug(format_args!("DNS timed out for {}", host));
                false
            }
        }
    }
}

/// 解析DNS服务器地址列表
pub fn parse_resolvers(resolvers: &[String]) -> Result<Vec<IpAddr>> {
    resolvers
        .iter()
        .map(|r| {
            r.trim()
                .parse::<IpAddr>()
                .map_err(|_| Error::InvalidResolver(r.clone()))
        })
        .collect()
}
