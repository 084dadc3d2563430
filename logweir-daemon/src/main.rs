//! logweir-daemon entry point.
//!
//! Startup sequence:
//! 1. Parse CLI arguments
//! 2. Load and validate `logweir.toml` (CLI overrides applied)
//! 3. Initialize tracing
//! 4. Install the Prometheus metrics recorder
//! 5. Build the YAML catalogue and the router, start it
//! 6. Wait for ctrl-c, then stop gracefully

mod cli;
mod logging;
mod metrics_server;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use logweir_core::config::LogweirConfig;
use logweir_core::pipeline::{Pipeline, StreamCatalogue};
use logweir_router::{CompiledRule, RouterBuilder, RouterConfig, YamlCatalogue};

use crate::cli::DaemonCli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonCli::parse();

    // 설정 로드 + CLI 오버라이드
    let mut config = LogweirConfig::load(&args.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", args.config.display(), e))?;

    if let Some(log_level) = args.log_level {
        config.general.log_level = log_level;
    }
    if let Some(log_format) = args.log_format {
        config.general.log_format = log_format;
    }
    if let Some(stream_dir) = args.stream_dir {
        config.catalogue.stream_dir = stream_dir;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if args.validate {
        // 설정과 스트림 정의를 검증하고 종료. 런타임에 fail-closed로
        // 제외될 스트림이 통과 판정을 받지 않도록, 엔진 빌드와 동일한
        // 한도로 모든 규칙을 실제로 컴파일해 본다.
        let catalogue = YamlCatalogue::new(&config.catalogue.stream_dir);
        let streams = catalogue
            .load_snapshot()
            .await
            .map_err(|e| anyhow::anyhow!("stream definitions invalid: {}", e))?;

        let limits = RouterConfig::from_core(&config.router).compile_limits();
        let mut rule_count = 0usize;
        let mut compile_errors = Vec::new();
        for stream in &streams {
            for rule in &stream.rules {
                rule_count += 1;
                if let Err(e) = CompiledRule::compile(rule.clone(), &limits) {
                    compile_errors.push(format!("stream '{}': {}", stream.id, e));
                }
            }
        }

        if !compile_errors.is_empty() {
            for error in &compile_errors {
                eprintln!("invalid rule: {error}");
            }
            anyhow::bail!(
                "{} invalid rules in {}",
                compile_errors.len(),
                config.catalogue.stream_dir
            );
        }

        println!(
            "configuration OK: {} enabled streams, {} rules in {}",
            streams.len(),
            rule_count,
            config.catalogue.stream_dir
        );
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(config = %args.config.display(), "logweir-daemon starting");

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
        tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
    }

    // 카탈로그 + 라우터 빌드
    let catalogue = Arc::new(YamlCatalogue::new(&config.catalogue.stream_dir));
    let mut router = RouterBuilder::new()
        .config(RouterConfig::from_core(&config.router))
        .catalogue(catalogue)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build router: {}", e))?;

    router
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("failed to start router: {}", e))?;
    tracing::info!(
        streams = router.stream_count(),
        rules = router.rule_count(),
        "router started"
    );

    // 종료 시그널 대기
    tracing::info!("logweir-daemon running");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    // 우아한 종료
    if let Err(e) = router.stop().await {
        tracing::error!(error = %e, "failed to stop router");
    }

    tracing::info!("logweir-daemon shut down");
    Ok(())
}
