//! 彩色日志输出
//!
//! `Logger` 是一个可克隆的句柄，在构造时传给每个组件，
//! 不依赖任何全局的调试开关。二进制入口通过 `init_logger`
//! 把同一个句柄注册为 `log` 门面的后端，之后 `log::info!` 等宏
//! 与组件内的直接调用走同一条输出路径。

use colored::*;
use log::{Level, Metadata, Record, SetLoggerError};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// 清除进度条所在行时写入的空格数
const CLEAR_WIDTH: usize = 120;

/// 日志句柄
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    max_level: Level,
    use_colors: bool,
    silent: bool,
    /// 为假时不向终端输出任何内容
    console: bool,
    file: Option<Arc<Mutex<File>>>,
    console_lock: Arc<Mutex<()>>,
}

impl Logger {
    /// 创建只输出到终端的日志句柄，`debug` 为真时输出调试信息
    pub fn new(debug: bool) -> Self {
        Self::from_parts(debug, false, None)
    }

    /// 创建完整配置的日志句柄
    ///
    /// `silent` 模式下终端只保留警告、错误和存活域名本身；
    /// 指定 `log_file` 时，所有启用级别的日志都会以无颜色格式追加到该文件。
    pub fn build(debug: bool, silent: bool, log_file: Option<&Path>) -> io::Result<Self> {
        let file = match log_file {
            Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
            None => None,
        };
        Ok(Self::from_parts(debug, silent, file))
    }

    /// 不向终端输出任何内容的句柄，测试中使用
    pub fn quiet() -> Self {
        Logger {
            inner: Arc::new(Inner {
                max_level: Level::Error,
                use_colors: false,
                silent: true,
                console: false,
                file: None,
                console_lock: Arc::new(Mutex::new(())),
            }),
        }
    }

    fn from_parts(debug: bool, silent: bool, file: Option<File>) -> Self {
        let max_level = if debug {
            Level::Debug
        } else if silent {
            Level::Warn
        } else {
            Level::Info
        };

        Logger {
            inner: Arc::new(Inner {
                max_level,
                use_colors: io::stderr().is_terminal(),
                silent,
                console: true,
                file: file.map(|f| Arc::new(Mutex::new(f))),
                console_lock: Arc::new(Mutex::new(())),
            }),
        }
    }

    /// 返回至少启用调试级别的句柄
    ///
    /// `debug` 为假或已经是调试级别时原样返回；否则共享同一个日志文件和终端锁，
    /// 只提高日志级别。
    pub fn with_debug(&self, debug: bool) -> Self {
        if !debug || self.debug_enabled() {
            return self.clone();
        }

        Logger {
            inner: Arc::new(Inner {
                max_level: Level::Debug,
                use_colors: self.inner.use_colors,
                silent: self.inner.silent,
                console: self.inner.console,
                file: self.inner.file.clone(),
                console_lock: Arc::clone(&self.inner.console_lock),
            }),
        }
    }

    /// 当前生效的最高日志级别
    pub fn max_level(&self) -> Level {
        self.inner.max_level
    }

    /// 是否输出调试信息
    pub fn debug_enabled(&self) -> bool {
        self.inner.max_level >= Level::Debug
    }

    /// 是否为静默模式
    pub fn is_silent(&self) -> bool {
        self.inner.silent
    }

    /// 是否向终端输出
    pub fn has_console(&self) -> bool {
        self.inner.console
    }

    fn label(&self, level: Level) -> String {
        let label = match level {
            Level::Error => "Error",
            Level::Warn => "Warning",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };

        if !self.inner.use_colors {
            return label.to_string();
        }

        match level {
            Level::Error => label.red().to_string(),
            Level::Warn => label.yellow().to_string(),
            Level::Info => label.blue().to_string(),
            Level::Debug => label.magenta().to_string(),
            Level::Trace => label.normal().to_string(),
        }
    }

    /// 按级别输出一条日志
    pub fn log(&self, level: Level, args: fmt::Arguments) {
        if level > self.inner.max_level {
            return;
        }

        let message = args.to_string();
        if self.inner.console {
            let _guard = self.inner.console_lock.lock().unwrap_or_else(|e| e.into_inner());
            let mut stderr = io::stderr().lock();
            if stderr.is_terminal() {
                let _ = write!(stderr, "\r{}\r", " ".repeat(CLEAR_WIDTH));
            }
            let _ = writeln!(stderr, "[{}] {}", self.label(level), message);
        }

        self.write_file(level.as_str(), &message);
    }

    /// 报告一个存活的域名
    ///
    /// 输出到标准输出，静默模式下只打印域名本身，方便管道处理。
    pub fn found(&self, host: &str, scheme: &str, status: u16) {
        if self.inner.console {
            let _guard = self.inner.console_lock.lock().unwrap_or_else(|e| e.into_inner());
            let mut stdout = io::stdout().lock();
            if self.inner.silent {
                let _ = writeln!(stdout, "{}", host);
            } else {
                if stdout.is_terminal() {
                    let _ = write!(stdout, "\r{}\r", " ".repeat(CLEAR_WIDTH));
                }
                let tag = if self.inner.use_colors {
                    "[+] ONLINE:".green().bold().to_string()
                } else {
                    "[+] ONLINE:".to_string()
                };
                let _ = writeln!(stdout, "{} {} ({} {})", tag, host, scheme, status);
            }
        }

        self.write_file("FOUND", &format!("{} ({} {})", host, scheme, status));
    }

    fn write_file(&self, label: &str, message: &str) {
        if let Some(file) = &self.inner.file {
            let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
            let _ = writeln!(
                file,
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                label,
                message
            );
        }
    }

    /// 信息级日志
    pub fn info(&self, args: fmt::Arguments) {
        self.log(Level::Info, args)
    }

    /// 警告级日志
    pub fn warn(&self, args: fmt::Arguments) {
        self.log(Level::Warn, args)
    }

    /// 错误级日志
    pub fn error(&self, args: fmt::Arguments) {
        self.log(Level::Error, args)
    }

    /// 调试级日志
    pub fn debug(&self, args: fmt::Arguments) {
        self.log(Level::Debug, args)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("max_level", &self.inner.max_level)
            .field("silent", &self.inner.silent)
            .field("console", &self.inner.console)
            .field("file", &self.inner.file.is_some())
            .finish()
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // 只接收本crate的日志，避免 reqwest/hyper 的调试输出刷屏
        metadata.level() <= self.inner.max_level
            && metadata.target().starts_with(env!("CARGO_CRATE_NAME"))
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            Logger::log(self, record.level(), *record.args());
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.inner.file {
            let _ = file.lock().unwrap_or_else(|e| e.into_inner()).flush();
        }
    }
}

/// 把日志句柄注册为 `log` 门面的全局后端
pub fn init_logger(logger: Logger) -> Result<(), SetLoggerError> {
    let level = logger.max_level();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("substrike-{}-{}.log", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn test_levels() {
        assert!(Logger::new(true).debug_enabled());
        assert!(!Logger::new(false).debug_enabled());
        assert_eq!(Logger::quiet().max_level(), Level::Error);
    }

    #[test]
    fn test_quiet_has_no_console() {
        let quiet = Logger::quiet();
        assert!(!quiet.has_console());
        assert!(Logger::new(false).has_console());

        // 不会写到标准输出
        quiet.found("auth.api.example.com", "https", 200);
    }

    #[test]
    fn test_with_debug_raises_level_only() {
        let quiet = Logger::quiet();
        let debug = quiet.with_debug(true);
        assert!(debug.debug_enabled());
        assert!(!debug.has_console());
        assert!(debug.is_silent());
        assert!(!quiet.debug_enabled());

        assert_eq!(quiet.with_debug(false).max_level(), Level::Error);
    }

    #[test]
    fn test_with_debug_shares_log_file() {
        let path = temp_log("shared");
        let logger = Logger::build(false, true, Some(&path)).unwrap();
        logger.with_debug(true).debug(format_args!("raised {}", "level"));
        logger.debug(format_args!("dropped"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[DEBUG] raised level"));
        assert!(!content.contains("dropped"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_log_file_receives_messages() {
        let path = temp_log("file");
        let logger = Logger::build(true, true, Some(&path)).unwrap();
        logger.debug(format_args!("dns failed for {}", "a.b.c.com"));
        logger.found("auth.api.example.com", "https", 200);
        log::Log::flush(&logger);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[DEBUG] dns failed for a.b.c.com"));
        assert!(content.contains("[FOUND] auth.api.example.com (https 200)"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_facade_macros_reach_backend() {
        let path = temp_log("facade");
        let logger = Logger::build(false, true, Some(&path)).unwrap();
        init_logger(logger.clone()).unwrap();

        log::warn!("wordlist has {} duplicate entries", 3);
        log::info!("filtered by level");
        log::warn!(target: "hyper::proto", "filtered by target");
        log::Log::flush(log::logger());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[WARN] wordlist has 3 duplicate entries"));
        assert!(!content.contains("filtered by level"));
        assert!(!content.contains("filtered by target"));
        let _ = std::fs::remove_file(&path);
    }
}
