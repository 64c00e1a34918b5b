use std::process;

use clap::Parser;
use log::{error, info};
use substrike::error::Result;
use substrike::handle::{print_summary, summarize};
use substrike::input::{collect_domains, load_wordlist, Opts};
use substrike::logger::{init_logger, Logger};
use substrike::output::export_results;
use substrike::StrikeEngine;

#[tokio::main]
async fn main() {
    let opts = Opts::parse();

    let logger = match Logger::build(opts.debug, opts.silent, opts.log_file.as_deref()) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("无法打开日志文件: {}", e);
            process::exit(1);
        }
    };
    if init_logger(logger.clone()).is_err() {
        logger.warn(format_args!("log facade already initialized"));
    }

    if let Err(e) = run_strike(opts, &logger).await {
        error!("{}", e);
        process::exit(1);
    }
}

/// 组合探测主逻辑
async fn run_strike(opts: Opts, logger: &Logger) -> Result<()> {
    // 所有配置错误都要在发起任何网络请求之前暴露
    let config = opts.to_config()?;
    info!("并发数 {}，请求超时 {:?}，DNS超时 {:?}", config.workers, config.request_timeout, config.dns_timeout);
    let format = opts.output_format()?;
    let words = load_wordlist(&opts.wordlist)?;
    let domains = collect_domains(&opts.domain, opts.domain_file.as_deref(), logger)?;

    let engine = StrikeEngine::new(config, logger.clone())?;

    if opts.dry_run {
        print_candidates(&engine, &domains, &words);
        return Ok(());
    }

    let report = engine.run(&domains, &words).await?;

    if opts.summary {
        print_summary(&summarize(&report.alive), &report.stats);
    }

    export_results(&report, &opts.output, format)?;

    info!(
        "探测完成，存活 {}/{}，结果已导出到: {}",
        report.stats.alive,
        report.stats.total,
        opts.output.display()
    );
    Ok(())
}

/// 只输出生成的候选域名
fn print_candidates(engine: &StrikeEngine, domains: &[String], words: &[String]) {
    let candidates = engine.generate(domains, words);
    for candidate in &candidates {
        println!("{}", candidate);
    }
    eprintln!("共生成 {} 个候选域名", candidates.len());
}
