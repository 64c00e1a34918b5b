//! 命令行参数与输入文件处理

use clap::Parser;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::StrikeConfig;
use crate::error::{Error, Result};
use crate::gen::FallbackPolicy;
use crate::logger::Logger;
use crate::pool::DEFAULT_WORKERS;
use crate::progress::DEFAULT_PROGRESS_INTERVAL;
use crate::verify::AlivePolicy;

lazy_static! {
    static ref LABEL_RE: Regex = Regex::new(r"^[a-z0-9_](?:[a-z0-9_-]{0,61}[a-z0-9_])?$").unwrap();
}

/// 域名最大长度
const MAX_DOMAIN_LEN: usize = 253;

/// 输出格式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// 每行一个主机名
    Txt,
    /// 带来源信息和统计的JSON
    Json,
    /// 带表头的CSV
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" => Ok(OutputFormat::Txt),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(Error::OutputFormat(s.to_string())),
        }
    }
}

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "substrike")]
#[command(version)]
#[command(about = "Generate subdomain permutations and probe which ones are alive", long_about = None, arg_required_else_help = true)]
pub struct Opts {
    /// target domain, can be given multiple times
    #[arg(short, long)]
    pub domain: Vec<String>,

    /// file with target domains, one per line
    #[arg(long = "domain-file", visible_alias = "df")]
    pub domain_file: Option<PathBuf>,

    /// wordlist used to build permutations
    #[arg(short, long)]
    pub wordlist: PathBuf,

    /// output file path
    #[arg(short, long, default_value = "result.txt")]
    pub output: PathBuf,

    /// output format (txt, json, csv)
    #[arg(long, default_value = "txt")]
    pub format: String,

    /// number of concurrent workers
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// timeout for each HTTP request (e.g. 5s, 500ms)
    #[arg(short, long, default_value = "3s")]
    pub timeout: String,

    /// timeout for each DNS lookup
    #[arg(long, default_value = "2s")]
    pub dns_timeout: String,

    /// DNS servers to query, use the system resolver config when empty
    #[arg(short, long)]
    pub resolvers: Vec<String>,

    /// print per-candidate failures
    #[arg(long)]
    pub debug: bool,

    /// also append log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// only print alive hostnames
    #[arg(short, long)]
    pub silent: bool,

    /// hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// only print generated permutations, do not probe
    #[arg(long)]
    pub dry_run: bool,

    /// prepend the word to domains with fewer than three labels
    #[arg(long)]
    pub fallback_prepend: bool,

    /// only count responses with status below 400 as alive
    #[arg(long)]
    pub strict_status: bool,

    /// show summary statistics
    #[arg(long)]
    pub summary: bool,
}

impl Opts {
    /// 转换为运行配置并校验
    pub fn to_config(&self) -> Result<StrikeConfig> {
        let config = StrikeConfig {
            workers: self.workers,
            request_timeout: parse_timeout(&self.timeout)?,
            dns_timeout: parse_timeout(&self.dns_timeout)?,
            debug: self.debug,
            resolvers: self.resolvers.clone(),
            fallback: if self.fallback_prepend {
                FallbackPolicy::Prepend
            } else {
                FallbackPolicy::Skip
            },
            alive_policy: if self.strict_status {
                AlivePolicy::StatusBelow400
            } else {
                AlivePolicy::AnyResponse
            },
            show_progress: !self.no_progress && !self.silent,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        };
        config.validate()?;
        Ok(config)
    }

    /// 解析输出格式
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.format.parse()
    }
}

/// 解析超时字符串，支持 `500ms`、`3s`、`1.5s`、`1m30s`，纯数字按秒计算
pub fn parse_timeout(value: &str) -> Result<Duration> {
    let invalid = || Error::TimeoutFormat(value.to_string());
    let s = value.trim().to_lowercase();
    if s.is_empty() {
        return Err(invalid());
    }

    let total = match s.parse::<f64>() {
        Ok(secs) => secs,
        Err(_) => {
            let mut total = 0f64;
            let mut rest = s.as_str();
            while !rest.is_empty() {
                let num_end = rest
                    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                    .ok_or_else(invalid)?;
                if num_end == 0 {
                    return Err(invalid());
                }
                let num: f64 = rest[..num_end].parse().map_err(|_| invalid())?;

                let after = &rest[num_end..];
                let unit_end = after
                    .find(|c: char| c.is_ascii_digit() || c == '.')
                    .unwrap_or(after.len());
                let factor = match &after[..unit_end] {
                    "ms" => 0.001,
                    "s" => 1.0,
                    "m" => 60.0,
                    "h" => 3600.0,
                    _ => return Err(invalid()),
                };

                total += num * factor;
                rest = &after[unit_end..];
            }
            total
        }
    };

    if !total.is_finite() || total < 0.0 || total > u32::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_secs_f64(total))
}

/// 去掉协议前缀、路径和末尾的点，统一小写
pub fn normalize_domain(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let host = without_scheme.split('/').next().unwrap_or_default();
    host.trim_end_matches('.').to_string()
}

/// 检查域名的每个标签是否合法
pub fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain.len() <= MAX_DOMAIN_LEN
        && domain.split('.').all(|label| LABEL_RE.is_match(label))
}

/// 按行读取文件，去除首尾空白并跳过空行
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let read_err = |source: io::Error| Error::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let reader = io::BufReader::new(file);
    let mut lines = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(read_err)?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    Ok(lines)
}

/// 加载字典，空字典视为配置错误
pub fn load_wordlist(path: &Path) -> Result<Vec<String>> {
    let words = read_lines(path)?;
    if words.is_empty() {
        return Err(Error::EmptyWordlist(path.to_path_buf()));
    }
    Ok(words)
}

/// 汇总命令行和文件中的目标域名，非法域名会被跳过
pub fn collect_domains(
    domains: &[String],
    domain_file: Option<&Path>,
    logger: &Logger,
) -> Result<Vec<String>> {
    let mut raw: Vec<String> = domains.to_vec();
    if let Some(path) = domain_file {
        raw.extend(read_lines(path)?);
    }

    let mut collected = Vec::with_capacity(raw.len());
    for entry in raw {
        let domain = normalize_domain(&entry);
        if is_valid_domain(&domain) {
            collected.push(domain);
        } else {
            logger.warn(format_args!("跳过非法域名: {}", entry));
        }
    }

    if collected.is_empty() {
        return Err(Error::MissingDomain);
    }
    Ok(collected)
}
