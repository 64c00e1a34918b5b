//! HTTP存活探测
//!
//! 共享一个 reqwest 客户端，按 HTTPS、HTTP 顺序请求根路径，
//! 不跟随跳转、不校验证书，只看有没有响应和状态码。

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{redirect, Client};
use std::time::Duration;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::model::{ProbeHit, Scheme};

/// 默认HTTP请求超时
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// 浏览器 User-Agent，减少被简单反爬拦截
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// 每个主机保留的空闲连接数
pub const POOL_MAX_IDLE_PER_HOST: usize = 30;

/// 空闲连接保留时长
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// TCP keepalive 探测间隔
pub const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// 判定存活的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlivePolicy {
    /// 超时前收到任意响应即视为存活
    #[default]
    AnyResponse,
    /// 只有状态码小于400才视为存活
    StatusBelow400,
}

/// 默认的存活判定策略
pub const DEFAULT_ALIVE_POLICY: AlivePolicy = AlivePolicy::AnyResponse;

impl AlivePolicy {
    /// 该状态码是否视为存活
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            AlivePolicy::AnyResponse => true,
            AlivePolicy::StatusBelow400 => status < 400,
        }
    }
}

/// HTTP存活探测接口
#[async_trait]
pub trait Probe: Send + Sync {
    /// 按 HTTPS、HTTP 顺序探测，返回第一个被接受的响应
    async fn probe(&self, host: &str) -> Option<ProbeHit>;
}

/// 基于共享 reqwest 客户端的存活探测器
///
/// 客户端在构造时创建一次，之后所有探测复用同一个连接池。
pub struct LivenessProbe {
    client: Client,
    timeout_duration: Duration,
    policy: AlivePolicy,
    logger: Logger,
}

impl LivenessProbe {
    /// 构建共享客户端，超时为零时返回错误
    pub fn new(timeout_duration: Duration, policy: AlivePolicy, logger: Logger) -> Result<Self> {
        if timeout_duration.is_zero() {
            return Err(Error::ZeroTimeout("request"));
        }

        let client = Client::builder()
            .timeout(timeout_duration)
            .connect_timeout(timeout_duration)
            .danger_accept_invalid_certs(true) // 只关心可达性，不校验证书
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(LivenessProbe {
            client,
            timeout_duration,
            policy,
            logger,
        })
    }

    /// 当前的存活判定策略
    pub fn policy(&self) -> AlivePolicy {
        self.policy
    }

    /// 发送一次GET请求，返回状态码
    async fn request(&self, scheme: Scheme, host: &str) -> Option<u16> {
        let url = format!("{}://{}/", scheme, host);
        let request = self.client.get(&url).header(ACCEPT, "*/*").send();

        match timeout(self.timeout_duration, request).await {
            Ok(Ok(response)) => Some(response.status().as_u16()),
            Ok(Err(e)) => {
                self.logger.debug(format_args!("GET {} failed: {}", url, e));
                None
            }
            Err(_) => {
                self.logger.debug(format_args!("GET {} timed out", url));
                None
            }
        }
    }
}

#[async_trait]
impl Probe for LivenessProbe {
    async fn probe(&self, host: &str) -> Option<ProbeHit> {
        for scheme in Scheme::PROBE_ORDER {
            if let Some(status) = self.request(scheme, host).await {
                if self.policy.accepts(status) {
                    return Some(ProbeHit { scheme, status });
                }
                self.logger.debug(format_args!(
                    "{}://{} answered {}, rejected by {:?}",
                    scheme, host, status, self.policy
                ));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 本地HTTP桩服务，对任何请求返回固定响应
    async fn spawn_stub(status: &'static str, extra_headers: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\n{}Content-Length: 0\r\nConnection: close\r\n\r\n",
                        status, extra_headers
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        addr
    }

    fn probe(policy: AlivePolicy) -> LivenessProbe {
        LivenessProbe::new(Duration::from_secs(2), policy, Logger::quiet()).unwrap()
    }

    #[test]
    fn test_alive_policy() {
        assert!(AlivePolicy::AnyResponse.accepts(503));
        assert!(AlivePolicy::StatusBelow400.accepts(302));
        assert!(!AlivePolicy::StatusBelow400.accepts(400));
        assert_eq!(DEFAULT_ALIVE_POLICY, AlivePolicy::AnyResponse);
    }

    #[test]
    fn test_keepalive_is_independent_of_idle_pool() {
        assert_eq!(TCP_KEEPALIVE, Duration::from_secs(60));
        assert_eq!(POOL_IDLE_TIMEOUT, Duration::from_secs(30));
        assert_ne!(TCP_KEEPALIVE, POOL_IDLE_TIMEOUT);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(LivenessProbe::new(Duration::ZERO, AlivePolicy::AnyResponse, Logger::quiet()).is_err());
    }

    #[tokio::test]
    async fn test_plain_http_host_is_alive() {
        let addr = spawn_stub("200 OK", "").await;
        let hit = probe(AlivePolicy::AnyResponse).probe(&addr.to_string()).await;
        // HTTPS握手失败后回退到HTTP
        assert_eq!(
            hit,
            Some(ProbeHit {
                scheme: Scheme::Http,
                status: 200
            })
        );
    }

    #[tokio::test]
    async fn test_error_status_depends_on_policy() {
        let addr = spawn_stub("503 Service Unavailable", "").await;

        let any = probe(AlivePolicy::AnyResponse).probe(&addr.to_string()).await;
        assert_eq!(any.map(|h| h.status), Some(503));

        let strict = probe(AlivePolicy::StatusBelow400).probe(&addr.to_string()).await;
        assert_eq!(strict, None);
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let addr = spawn_stub("302 Found", "Location: http://127.0.0.1:1/\r\n").await;
        let hit = probe(AlivePolicy::StatusBelow400).probe(&addr.to_string()).await;
        assert_eq!(hit.map(|h| h.status), Some(302));
    }

    #[tokio::test]
    async fn test_closed_port_is_not_alive() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert_eq!(probe(AlivePolicy::AnyResponse).probe(&addr.to_string()).await, None);
    }
}
