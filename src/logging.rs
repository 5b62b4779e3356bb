use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_PREFIX: &str = "media-preloader";
const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";
/// 默认保留的日志文件数（按天滚动，即保留天数）
pub const DEFAULT_KEEP_FILES: usize = 7;

/// 持有到进程结束，drop 时刷盘
pub struct LogGuard(#[allow(dead_code)] Option<WorkerGuard>);

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub dir: Option<PathBuf>,
    pub filter: Option<String>,
    /// 额外把 warn 及以上输出到 stderr（加载失败在终端可见）
    pub stderr: bool,
    pub keep_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: None,
            filter: None,
            stderr: false,
            keep_files: DEFAULT_KEEP_FILES,
        }
    }
}

/// 日志目录：显式指定 > `{data_dir}/logs`；建不出来时退回临时目录
fn resolve_log_dir(data_dir: &Path, dir: Option<PathBuf>) -> PathBuf {
    let wanted = dir.unwrap_or_else(|| data_dir.join("logs"));
    if fs::create_dir_all(&wanted).is_ok() {
        return wanted;
    }
    let fallback = std::env::temp_dir().join("media-preloader-logs");
    let _ = fs::create_dir_all(&fallback);
    fallback
}

/// `--log-filter` 优先，其次 RUST_LOG，最后是默认过滤
fn build_filter(filter: Option<&str>) -> EnvFilter {
    match filter.map(str::trim) {
        Some(s) if !s.is_empty() => {
            EnvFilter::try_new(s).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

fn file_appender(log_dir: &Path, keep_files: usize) -> RollingFileAppender {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .max_log_files(keep_files.max(1))
        .build(log_dir)
        .unwrap_or_else(|_| rolling::daily(log_dir, format!("{LOG_PREFIX}.log")))
}

pub fn init(data_dir: &Path, cfg: LogConfig) -> LogGuard {
    let log_dir = resolve_log_dir(data_dir, cfg.dir);
    let (file_writer, guard) =
        tracing_appender::non_blocking(file_appender(&log_dir, cfg.keep_files));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer);

    // 终端只看 warn 以上，且不带时间戳
    let stderr_layer = cfg.stderr.then(|| {
        fmt::layer()
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .with_filter(LevelFilter::WARN)
    });

    let _ = tracing_subscriber::registry()
        .with(build_filter(cfg.filter.as_deref()))
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
    tracing::info!(
        log_dir = %log_dir.display(),
        stderr = cfg.stderr,
        keep_files = cfg.keep_files,
        "tracing 已初始化"
    );

    LogGuard(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_defaults_under_data_dir() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = resolve_log_dir(tmp.path(), None);
        assert_eq!(dir, tmp.path().join("logs"));
        assert!(dir.is_dir());
    }

    #[test]
    fn explicit_log_dir_wins() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let custom = tmp.path().join("custom");
        assert_eq!(resolve_log_dir(tmp.path(), Some(custom.clone())), custom);
    }

    #[test]
    fn unparsable_filter_falls_back_to_default() {
        let filter = build_filter(Some("media_preloader=loud"));
        assert_eq!(filter.to_string(), EnvFilter::new(DEFAULT_FILTER).to_string());
    }

    #[test]
    fn explicit_filter_is_used() {
        let filter = build_filter(Some(" debug "));
        assert_eq!(filter.to_string(), "debug");
    }
}
