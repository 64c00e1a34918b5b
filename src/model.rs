//! 候选域名与探测结果的数据模型

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// 生成的候选域名及其来源
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// 完整的候选主机名
    pub host: String,
    /// 来源域名
    pub domain: Arc<str>,
    /// 插入的字典词
    pub word: Arc<str>,
    /// 插入位置（标签下标）
    pub position: usize,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}

/// 探测协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// 443端口
    Https,
    /// 80端口
    Http,
}

impl Scheme {
    /// 固定的探测顺序：先 HTTPS 后 HTTP
    pub const PROBE_ORDER: [Scheme; 2] = [Scheme::Https, Scheme::Http];

    /// 小写协议名
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }

    /// 协议默认端口
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Https => 443,
            Scheme::Http => 80,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次成功探测的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeHit {
    /// 产生响应的协议
    pub scheme: Scheme,
    /// HTTP状态码
    pub status: u16,
}

/// 每个候选域名恰好产生一个探测结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// 对应的候选域名
    pub candidate: Candidate,
    /// 是否通过了DNS预过滤
    pub resolved: bool,
    /// 存活时的协议和状态码
    pub hit: Option<ProbeHit>,
}

impl ProbeOutcome {
    /// DNS解析失败，未发起任何HTTP请求
    pub fn unresolved(candidate: Candidate) -> Self {
        ProbeOutcome {
            candidate,
            resolved: false,
            hit: None,
        }
    }

    /// 通过了DNS预过滤并完成了HTTP探测
    pub fn probed(candidate: Candidate, hit: Option<ProbeHit>) -> Self {
        ProbeOutcome {
            candidate,
            resolved: true,
            hit,
        }
    }

    /// 是否存活
    pub fn is_alive(&self) -> bool {
        self.hit.is_some()
    }

    /// 候选主机名
    pub fn host(&self) -> &str {
        &self.candidate.host
    }

    /// 存活时的协议
    pub fn scheme(&self) -> Option<Scheme> {
        self.hit.map(|h| h.scheme)
    }

    /// 存活时的状态码
    pub fn status(&self) -> Option<u16> {
        self.hit.map(|h| h.status)
    }

    /// 存活时的端口
    pub fn port(&self) -> Option<u16> {
        self.hit.map(|h| h.scheme.default_port())
    }
}
