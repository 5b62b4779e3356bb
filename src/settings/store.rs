use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::SettingsError;
use crate::loader::SourceLoaderConfig;
use crate::preloader::{DEFAULT_LOOKAHEAD, PreloadConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreloaderSettings {
    // 队列设置
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,
    #[serde(default = "default_drain_delay_ms")]
    pub drain_delay_ms: u64,

    // 加载设置
    #[serde(default = "default_probe_bytes")]
    pub probe_bytes: usize,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_http_connect_timeout_secs")]
    pub http_connect_timeout_secs: u64,
}

impl Default for PreloaderSettings {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
            drain_delay_ms: 100,
            probe_bytes: 64 * 1024,
            http_timeout_secs: 30,
            http_connect_timeout_secs: 10,
        }
    }
}

// 默认值函数（用于 serde default）
fn default_lookahead() -> usize { DEFAULT_LOOKAHEAD }
fn default_drain_delay_ms() -> u64 { 100 }
fn default_probe_bytes() -> usize { 64 * 1024 }
fn default_http_timeout_secs() -> u64 { 30 }
fn default_http_connect_timeout_secs() -> u64 { 10 }

impl PreloaderSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.probe_bytes == 0 {
            return Err(SettingsError::InvalidValue("probe_bytes 必须大于 0".to_owned()));
        }
        if self.http_timeout_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "http_timeout_secs 必须大于 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// 用 `MEDIA_PRELOAD_*` 环境变量覆盖已有值
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// 同 `apply_env`，变量来源可替换；解析不了的值忽略并告警
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "环境变量无法解析，忽略");
                    None
                }
            }
        }

        if let Some(v) = parse(&lookup, "MEDIA_PRELOAD_LOOKAHEAD") {
            self.lookahead = v;
        }
        if let Some(v) = parse(&lookup, "MEDIA_PRELOAD_DRAIN_DELAY_MS") {
            self.drain_delay_ms = v;
        }
        if let Some(v) = parse(&lookup, "MEDIA_PRELOAD_PROBE_BYTES") {
            self.probe_bytes = v;
        }
        if let Some(v) = parse(&lookup, "MEDIA_PRELOAD_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = v;
        }
        if let Some(v) = parse(&lookup, "MEDIA_PRELOAD_HTTP_CONNECT_TIMEOUT_SECS") {
            self.http_connect_timeout_secs = v;
        }
    }

    pub fn preload_config(&self) -> PreloadConfig {
        PreloadConfig {
            lookahead: self.lookahead,
            drain_delay: Duration::from_millis(self.drain_delay_ms),
            ..PreloadConfig::default()
        }
    }

    pub fn loader_config(&self) -> SourceLoaderConfig {
        SourceLoaderConfig {
            http_timeout_secs: self.http_timeout_secs,
            http_connect_timeout_secs: self.http_connect_timeout_secs,
            probe_bytes: self.probe_bytes,
        }
    }
}

pub fn load_settings(data_dir: &Path) -> PreloaderSettings {
    let p = settings_path(data_dir);
    let Ok(bytes) = fs::read(&p) else {
        return PreloaderSettings::default();
    };
    match serde_json::from_slice(&bytes) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = %p.display(), err = %e, "设置文件损坏，使用默认值");
            PreloaderSettings::default()
        }
    }
}

/// settings.json 叠加环境变量；命令行参数由调用方最后覆盖
pub fn resolve_settings(data_dir: &Path) -> PreloaderSettings {
    let mut s = load_settings(data_dir);
    s.apply_env();
    s
}

pub fn save_settings(data_dir: &Path, s: &PreloaderSettings) -> Result<(), SettingsError> {
    let save_err = |source| SettingsError::Save { source };

    fs::create_dir_all(data_dir).map_err(save_err)?;
    let p = settings_path(data_dir);
    let tmp = p.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(s).unwrap_or_else(|_| b"{}".to_vec());
    fs::write(&tmp, bytes).map_err(save_err)?;
    if let Err(e) = fs::rename(&tmp, &p) {
        let _ = fs::remove_file(&p);
        fs::rename(&tmp, &p).map_err(|_| save_err(e))?;
    }
    Ok(())
}

/// 系统 data_local_dir 下的数据目录，取不到时退回临时目录
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "media-preloader", "media-preloader")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("media-preloader"))
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}
