//! logweir.toml 통합 설정 테스트
//!
//! - logweir.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use logweir_core::config::LogweirConfig;
use logweir_core::error::ConfigError;

// =============================================================================
// logweir.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../logweir.toml.example");
    let config = LogweirConfig::parse(content).expect("example config should parse");

    // general 기본값 확인
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.general.data_dir, "/var/lib/logweir");
    assert_eq!(config.general.pid_file, "/run/logweir.pid");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../logweir.toml.example");
    let config = LogweirConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_has_documented_router_defaults() {
    let content = include_str!("../../../logweir.toml.example");
    let config = LogweirConfig::parse(content).expect("should parse");

    assert_eq!(config.router.processing_timeout_ms, 2000);
    assert_eq!(config.router.max_fault_count, 3);
    assert_eq!(config.router.rebuild_period_ms, 1000);
    assert_eq!(config.router.message_recording, "never");
}

#[test]
fn example_config_has_documented_metrics_defaults() {
    let content = include_str!("../../../logweir.toml.example");
    let config = LogweirConfig::parse(content).expect("should parse");

    assert!(config.metrics.enabled);
    assert_eq!(config.metrics.listen_addr, "127.0.0.1");
    assert_eq!(config.metrics.port, 9830);
    assert_eq!(config.metrics.endpoint, "/metrics");
}

#[test]
fn example_config_matches_built_in_defaults() {
    // 예시 파일의 값과 Default 구현이 어긋나면 문서가 거짓말을 하게 됨
    let content = include_str!("../../../logweir.toml.example");
    let from_example = LogweirConfig::parse(content).expect("should parse");
    let built_in = LogweirConfig::default();

    assert_eq!(
        from_example.router.processing_timeout_ms,
        built_in.router.processing_timeout_ms
    );
    assert_eq!(
        from_example.router.rebuild_period_ms,
        built_in.router.rebuild_period_ms
    );
    assert_eq!(
        from_example.catalogue.stream_dir,
        built_in.catalogue.stream_dir
    );
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn empty_config_uses_all_defaults() {
    let config = LogweirConfig::parse("").expect("empty config should parse");
    config.validate().expect("defaults should validate");
    assert_eq!(config.router.max_fault_count, 3);
}

#[test]
fn single_section_config_parses() {
    let config = LogweirConfig::parse("[catalogue]\nstream_dir = \"/srv/streams\"\n")
        .expect("should parse");
    assert_eq!(config.catalogue.stream_dir, "/srv/streams");
    assert_eq!(config.general.log_level, "info");
}

// =============================================================================
// 에러 케이스 테스트
// =============================================================================

#[test]
fn malformed_toml_returns_parse_error() {
    let result = LogweirConfig::parse("[router\nbroken");
    assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
}

#[test]
fn wrong_value_type_returns_parse_error() {
    let result = LogweirConfig::parse("[router]\nprocessing_timeout_ms = \"fast\"\n");
    assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
}
