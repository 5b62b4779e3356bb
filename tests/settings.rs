use clap::Parser;
use media_preloader::cli::Cli;
use media_preloader::settings::{PreloaderSettings, load_settings, resolve_settings, save_settings};
use std::fs;
use std::time::Duration;

#[test]
fn settings_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path();

    let s = PreloaderSettings {
        lookahead: 5,
        drain_delay_ms: 250,
        probe_bytes: 4096,
        http_timeout_secs: 12,
        http_connect_timeout_secs: 3,
    };
    save_settings(data_dir, &s).expect("save_settings");

    let loaded = load_settings(data_dir);
    assert_eq!(loaded.lookahead, 5);
    assert_eq!(loaded.drain_delay_ms, 250);
    assert_eq!(loaded.probe_bytes, 4096);
    assert_eq!(loaded.http_timeout_secs, 12);
    assert_eq!(loaded.http_connect_timeout_secs, 3);
}

#[test]
fn settings_corrupt_file_falls_back_to_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path();
    fs::create_dir_all(data_dir).expect("create_dir_all");
    fs::write(data_dir.join("settings.json"), b"{not-json").expect("write");

    let loaded = load_settings(data_dir);
    assert_eq!(loaded.lookahead, PreloaderSettings::default().lookahead);
}

#[test]
fn settings_missing_file_uses_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = load_settings(&dir.path().join("nested"));
    assert_eq!(loaded.drain_delay_ms, 100);
}

// 本文件里只有这个测试读写 MEDIA_PRELOAD_* 环境变量
#[test]
fn settings_precedence_is_cli_then_env_then_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path();
    let file = PreloaderSettings {
        lookahead: 5,
        drain_delay_ms: 250,
        probe_bytes: 4096,
        ..PreloaderSettings::default()
    };
    save_settings(data_dir, &file).expect("save_settings");

    // SAFETY: 同进程的其他测试不读写这些变量
    unsafe {
        std::env::set_var("MEDIA_PRELOAD_LOOKAHEAD", "1");
        std::env::set_var("MEDIA_PRELOAD_PROBE_BYTES", "16");
        std::env::set_var("MEDIA_PRELOAD_DRAIN_DELAY_MS", "7");
    }
    let mut settings = resolve_settings(data_dir);
    let cli = Cli::try_parse_from(["media-preloader", "--drain-delay-ms", "9", "probe", "x"])
        .expect("parse cli");
    cli.apply_overrides(&mut settings);
    unsafe {
        std::env::remove_var("MEDIA_PRELOAD_LOOKAHEAD");
        std::env::remove_var("MEDIA_PRELOAD_PROBE_BYTES");
        std::env::remove_var("MEDIA_PRELOAD_DRAIN_DELAY_MS");
    }

    let preload = settings.preload_config();
    assert_eq!(preload.lookahead, 1);
    assert_eq!(preload.drain_delay, Duration::from_millis(9));
    assert_eq!(settings.loader_config().probe_bytes, 16);
    // 没有环境变量覆盖的字段保留文件里的值
    assert_eq!(settings.http_timeout_secs, file.http_timeout_secs);
}
