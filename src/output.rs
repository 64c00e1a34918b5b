//! 结果导出，支持 txt、json、csv

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::api::StrikeReport;
use crate::error::{Error, Result};
use crate::handle::{summarize, RunStats};
use crate::input::OutputFormat;
use crate::model::{ProbeOutcome, Scheme};

/// 可序列化的存活域名结构
#[derive(Debug, Clone, Serialize)]
pub struct SerializableAliveHost {
    /// 存活主机名
    pub host: String,
    /// 响应的协议
    pub scheme: Scheme,
    /// 状态码
    pub status: u16,
    /// 协议默认端口
    pub port: u16,
    /// 来源域名
    pub source_domain: String,
    /// 插入的字典词
    pub word: String,
    /// 插入位置
    pub position: usize,
}

/// 可序列化的运行统计
#[derive(Debug, Clone, Serialize)]
pub struct SerializableRunStats {
    /// 候选域名总数
    pub total_candidates: u64,
    /// 已完成数
    pub completed: u64,
    /// DNS解析成功数
    pub resolved: u64,
    /// 存活数
    pub alive: u64,
    /// 耗时（秒）
    pub elapsed_secs: f64,
    /// 开始时间
    pub started_at: String,
    /// 状态码直方图
    pub by_status: BTreeMap<u16, usize>,
}

/// 完整的导出数据结构
#[derive(Debug, Clone, Serialize)]
pub struct ExportData {
    /// 存活主机
    pub alive_hosts: Vec<SerializableAliveHost>,
    /// 运行统计
    pub stats: SerializableRunStats,
    /// 导出时间
    pub export_time: String,
}

impl SerializableAliveHost {
    /// 只有存活结果才能转换
    fn from_outcome(outcome: &ProbeOutcome) -> Option<Self> {
        let hit = outcome.hit?;
        Some(SerializableAliveHost {
            host: outcome.candidate.host.clone(),
            scheme: hit.scheme,
            status: hit.status,
            port: hit.scheme.default_port(),
            source_domain: outcome.candidate.domain.to_string(),
            word: outcome.candidate.word.to_string(),
            position: outcome.candidate.position,
        })
    }
}

impl From<&RunStats> for SerializableRunStats {
    fn from(stats: &RunStats) -> Self {
        SerializableRunStats {
            total_candidates: stats.total,
            completed: stats.completed,
            resolved: stats.resolved,
            alive: stats.alive,
            elapsed_secs: stats.elapsed.as_secs_f64(),
            started_at: stats.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            by_status: BTreeMap::new(),
        }
    }
}

impl From<&StrikeReport> for ExportData {
    fn from(report: &StrikeReport) -> Self {
        let mut stats = SerializableRunStats::from(&report.stats);
        stats.by_status = summarize(&report.alive).by_status;

        ExportData {
            alive_hosts: report
                .alive
                .iter()
                .filter_map(SerializableAliveHost::from_outcome)
                .collect(),
            stats,
            export_time: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        }
    }
}

/// 按格式渲染导出内容
pub fn render(report: &StrikeReport, format: OutputFormat) -> Result<String> {
    let data = ExportData::from(report);
    match format {
        OutputFormat::Txt => Ok(export_to_txt(&data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&data)?),
        OutputFormat::Csv => Ok(export_to_csv(&data)),
    }
}

/// 导出结果到文件，文件会被覆盖
pub fn export_results(report: &StrikeReport, output_path: &Path, format: OutputFormat) -> Result<()> {
    let content = render(report, format)?;
    let write_err = |source| Error::Write {
        path: output_path.to_path_buf(),
        source,
    };

    let mut file = File::create(output_path).map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    Ok(())
}

/// 每行一个存活主机名，与完成顺序一致
fn export_to_txt(data: &ExportData) -> String {
    let mut txt = String::new();
    for host in &data.alive_hosts {
        txt.push_str(&host.host);
        txt.push('\n');
    }
    txt
}

fn export_to_csv(data: &ExportData) -> String {
    let mut csv = String::new();
    csv.push_str("Host,Scheme,Status,Port,SourceDomain,Word,Position\n");
    for host in &data.alive_hosts {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            escape_csv(&host.host),
            host.scheme,
            host.status,
            host.port,
            escape_csv(&host.source_domain),
            escape_csv(&host.word),
            host.position
        ));
    }
    csv
}

/// CSV转义
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gen::{generate_subdomains, FallbackPolicy};
    use crate::model::ProbeHit;
    use chrono::Utc;
    use std::time::Duration;

    fn report() -> StrikeReport {
        let candidates = generate_subdomains("api.prod.evil.com", "auth", FallbackPolicy::Skip);
        StrikeReport {
            alive: vec![
                ProbeOutcome::probed(
                    candidates[1].clone(),
                    Some(ProbeHit {
                        scheme: Scheme::Http,
                        status: 404,
                    }),
                ),
                ProbeOutcome::probed(
                    candidates[0].clone(),
                    Some(ProbeHit {
                        scheme: Scheme::Https,
                        status: 200,
                    }),
                ),
            ],
            stats: RunStats {
                total: 2,
                completed: 2,
                resolved: 2,
                alive: 2,
                elapsed: Duration::from_millis(1500),
                started_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_txt_keeps_completion_order() {
        let txt = render(&report(), OutputFormat::Txt).unwrap();
        assert_eq!(txt, "api.auth.prod.evil.com\nauth.api.prod.evil.com\n");
    }

    #[test]
    fn test_empty_report_writes_empty_txt() {
        let mut empty = report();
        empty.alive.clear();
        assert_eq!(render(&empty, OutputFormat::Txt).unwrap(), "");
    }

    #[test]
    fn test_json_contains_provenance() {
        let json = render(&report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let hosts = value["alive_hosts"].as_array().unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0]["scheme"], "http");
        assert_eq!(hosts[0]["port"], 80);
        assert_eq!(hosts[1]["source_domain"], "api.prod.evil.com");
        assert_eq!(hosts[1]["word"], "auth");
        assert_eq!(value["stats"]["total_candidates"], 2);
        assert_eq!(value["stats"]["by_status"]["404"], 1);
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let csv = render(&report(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Host,Scheme,Status"));
        assert_eq!(lines[2], "auth.api.prod.evil.com,https,200,443,api.prod.evil.com,auth,0");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_export_overwrites_file() {
        let path = std::env::temp_dir().join(format!("substrike-export-{}.txt", std::process::id()));
        std::fs::write(&path, "stale\nstale\nstale\n").unwrap();

        export_results(&report(), &path, OutputFormat::Txt).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "api.auth.prod.evil.com\nauth.api.prod.evil.com\n");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let path = std::env::temp_dir().join("substrike-no-such-dir").join("out.txt");
        assert!(matches!(
            export_results(&report(), &path, OutputFormat::Txt),
            Err(Error::Write { .. })
        ));
    }
}
