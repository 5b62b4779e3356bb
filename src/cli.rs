use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::settings::PreloaderSettings;

#[derive(Debug, Parser)]
#[command(
    name = "media-preloader",
    version,
    about = "顺序预加载媒体资源元数据（每次只加载一个）"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// 覆盖数据目录（默认走系统 data_local_dir）
    #[arg(long, env = "MEDIA_PRELOAD_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// 覆盖日志目录（默认 `{data_dir}/logs`）
    #[arg(long, env = "MEDIA_PRELOAD_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// 覆盖日志过滤（等价于设置 RUST_LOG）
    #[arg(long, env = "RUST_LOG", global = true)]
    pub log_filter: Option<String>,

    /// 不在 stderr 输出警告（仍写日志文件）
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// 初始化后立即预加载的资源数
    #[arg(long, global = true)]
    pub lookahead: Option<usize>,

    /// 两次加载之间的间隔（毫秒）
    #[arg(long, global = true)]
    pub drain_delay_ms: Option<u64>,

    /// 每个资源读取的字节数
    #[arg(long, global = true)]
    pub probe_bytes: Option<usize>,
}

impl Cli {
    /// 命令行参数最后生效，覆盖 settings.json 和环境变量
    pub fn apply_overrides(&self, settings: &mut PreloaderSettings) {
        if let Some(v) = self.lookahead {
            settings.lookahead = v;
        }
        if let Some(v) = self.drain_delay_ms {
            settings.drain_delay_ms = v;
        }
        if let Some(v) = self.probe_bytes {
            settings.probe_bytes = v;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 对一组资源跑一次预加载会话
    Preload {
        /// 资源地址：http(s) URL、file:// URL 或本地路径
        #[arg(required = true)]
        sources: Vec<String>,

        /// 请求全部资源（默认只预加载前 lookahead 个）
        #[arg(long)]
        all: bool,

        /// 以 JSON 输出结果
        #[arg(long)]
        json: bool,
    },

    /// 加载单个资源并打印元数据
    Probe { source: String },

    /// 把当前生效的设置写入 settings.json
    SaveSettings,
}
