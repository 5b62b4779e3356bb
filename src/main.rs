use std::collections::HashMap;

use clap::Parser;
use serde::Serialize;

use media_preloader::cli::{Cli, Command};
use media_preloader::error::AppError;
use media_preloader::loader::{MediaHandle, MediaLoader, SourceLoader};
use media_preloader::logging;
use media_preloader::preloader::{PreloadConfig, PreloadEvent, StatusSnapshot, spawn_preloader};
use media_preloader::settings;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(settings::default_data_dir);

    let _log_guard = logging::init(
        &data_dir,
        logging::LogConfig {
            dir: cli.log_dir.clone(),
            filter: cli.log_filter.clone(),
            stderr: !cli.quiet,
            ..Default::default()
        },
    );
    tracing::info!(data_dir = %data_dir.display(), "media-preloader 启动");

    let mut settings = settings::resolve_settings(&data_dir);
    cli.apply_overrides(&mut settings);
    settings.validate()?;

    let loader = SourceLoader::new(settings.loader_config());

    match cli.command {
        Command::Preload { sources, all, json } => {
            run_preload(loader, settings.preload_config(), sources, all, json).await
        }
        Command::Probe { source } => {
            tracing::info!(source = %source, "启动模式: Probe");
            let handle = loader.load(&source).await?;
            println!("{}", serde_json::to_string_pretty(&handle)?);
            Ok(())
        }
        Command::SaveSettings => {
            settings::save_settings(&data_dir, &settings)?;
            println!("设置已保存到 {}", data_dir.join("settings.json").display());
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    source: &'a str,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<&'a MediaHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

async fn run_preload(
    loader: SourceLoader,
    config: PreloadConfig,
    sources: Vec<String>,
    all: bool,
    json: bool,
) -> Result<(), AppError> {
    tracing::info!(total = sources.len(), all, "启动模式: Preload");

    let lookahead = config.lookahead;
    let (preloader, mut events) = spawn_preloader(loader, config);
    preloader.initialize(sources.iter().cloned()).await?;

    let targets: Vec<&String> = if all {
        for src in &sources {
            preloader.request(src.clone()).await?;
        }
        sources.iter().collect()
    } else {
        sources.iter().take(lookahead).collect()
    };

    let mut failed = HashMap::<String, String>::new();
    let mut snapshot: StatusSnapshot<MediaHandle> = StatusSnapshot::new();
    loop {
        let evt = tokio::select! {
            evt = events.recv() => evt,
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("收到 Ctrl-C，提前结束预加载");
                snapshot = preloader.snapshot().await?;
                break;
            }
        };
        let Some(evt) = evt else {
            break;
        };
        match evt {
            PreloadEvent::LoadFailed { id, message } => {
                failed.insert(id, message);
            }
            PreloadEvent::Idle => {
                snapshot = preloader.snapshot().await?;
                let settled = targets.iter().all(|id| {
                    failed.contains_key(*id) || snapshot.get(*id).is_some_and(|st| st.loaded)
                });
                if settled {
                    break;
                }
            }
            _ => {}
        }
    }
    preloader.shutdown().await?;

    let rows: Vec<ReportRow> = sources
        .iter()
        .map(|src| {
            let handle = snapshot.get(src).and_then(|st| st.handle.as_deref());
            let error = failed.get(src).map(String::as_str);
            let state = match (handle, error) {
                (Some(_), _) => "loaded",
                (None, Some(_)) => "failed",
                (None, None) => "skipped",
            };
            ReportRow {
                source: src,
                state,
                handle,
                error,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in &rows {
        match (row.handle, row.error) {
            (Some(h), _) => println!(
                "{:<8} {:<9} {:>10} {}",
                row.state,
                h.container.to_string(),
                h.content_length
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_owned()),
                row.source
            ),
            (None, Some(err)) => println!("{:<8} {}: {}", row.state, row.source, err),
            (None, None) => println!("{:<8} {}", row.state, row.source),
        }
    }
    Ok(())
}
