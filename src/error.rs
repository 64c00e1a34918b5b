//! 错误类型

use std::io;
use std::path::PathBuf;

/// 运行期间可能出现的致命错误
///
/// 单个候选域名的网络失败不会出现在这里，它们只会被记为"不存活"。
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 并发数超出允许范围
    #[error("worker count must be between 1 and {max}, got {got}")]
    InvalidWorkers {
        /// 给定的并发数
        got: usize,
        /// 允许的上限
        max: usize,
    },

    /// 超时时间为零
    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),

    /// 超时字符串无法解析
    #[error("invalid timeout format '{0}', use values like 5s, 500ms or 1m")]
    TimeoutFormat(String),

    /// 未提供任何目标域名
    #[error("no target domain given, use -d/--domain or --domain-file")]
    MissingDomain,

    /// 字典为空
    #[error("wordlist {} contains no usable entries", .0.display())]
    EmptyWordlist(PathBuf),

    /// DNS服务器地址非法
    #[error("invalid resolver address: {0}")]
    InvalidResolver(String),

    /// 不支持的输出格式
    #[error("unsupported output format: {0}, supported formats: txt, json, csv")]
    OutputFormat(String),

    /// 输入文件读取失败
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// 文件路径
        path: PathBuf,
        /// 底层错误
        #[source]
        source: io::Error,
    },

    /// 结果文件写入失败
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// 文件路径
        path: PathBuf,
        /// 底层错误
        #[source]
        source: io::Error,
    },

    /// HTTP客户端构建失败
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON序列化失败
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// 其他I/O错误
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// crate内统一的Result别名
pub type Result<T> = std::result::Result<T, Error>;
