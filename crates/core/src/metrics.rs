//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logweir_`
//! - 모듈명: `router_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 스트림 ID 레이블 키
pub const LABEL_STREAM: &str = "stream";

/// 장애 종류 레이블 키 (timeout, oversized_value)
pub const LABEL_FAULT: &str = "fault";

// ─── 엔진 메트릭 ────────────────────────────────────────────────────

/// Router: 엔진 빌드 횟수 (counter)
pub const ROUTER_ENGINE_BUILDS_TOTAL: &str = "logweir_router_engine_builds_total";

/// Router: 엔진 빌드 소요 시간 (histogram, 초)
pub const ROUTER_ENGINE_BUILD_DURATION_SECONDS: &str =
    "logweir_router_engine_build_duration_seconds";

/// Router: 현재 엔진에 인덱싱된 규칙 수 (gauge)
pub const ROUTER_ENGINE_RULES_CURRENT: &str = "logweir_router_engine_rules_current";

/// Router: 지문 불변으로 생략된 스왑 수 (counter)
pub const ROUTER_ENGINE_SWAPS_SKIPPED_TOTAL: &str = "logweir_router_engine_swaps_skipped_total";

/// Router: 유효하지 않은 규칙으로 빌드에서 제외된 스트림 수 (counter)
pub const ROUTER_ENGINE_STREAMS_EXCLUDED_TOTAL: &str =
    "logweir_router_engine_streams_excluded_total";

// ─── 라우팅 메트릭 ──────────────────────────────────────────────────

/// Router: 라우팅된 메시지 수 (counter)
pub const ROUTER_MESSAGES_ROUTED_TOTAL: &str = "logweir_router_messages_routed_total";

/// Router: 스트림별 수신 메시지 수 (counter, label: stream)
pub const ROUTER_STREAM_INCOMING_TOTAL: &str = "logweir_router_stream_incoming_total";

/// Router: 메시지당 매칭 패스 소요 시간 (histogram, 초)
pub const ROUTER_STREAM_EXECUTION_SECONDS: &str = "logweir_router_stream_execution_seconds";

/// Router: 스트림별 평가 장애 수 (counter, labels: stream, fault)
pub const ROUTER_STREAM_FAULTS_TOTAL: &str = "logweir_router_stream_faults_total";

/// Router: 현재 격리된 스트림 수 (gauge)
pub const ROUTER_STREAMS_QUARANTINED: &str = "logweir_router_streams_quarantined";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 매칭 패스 소요 시간 히스토그램 버킷 (초)
///
/// 10us ~ 5s 범위, 로그 단위 분포
pub const EXECUTION_DURATION_BUCKETS: [f64; 10] = [
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.1, 1.0, 5.0,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `logweir-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        ROUTER_ENGINE_BUILDS_TOTAL,
        "Total number of compiled engine builds"
    );
    describe_histogram!(
        ROUTER_ENGINE_BUILD_DURATION_SECONDS,
        "Time to build a compiled engine from the catalogue in seconds"
    );
    describe_gauge!(
        ROUTER_ENGINE_RULES_CURRENT,
        "Number of rules indexed by the current engine"
    );
    describe_counter!(
        ROUTER_ENGINE_SWAPS_SKIPPED_TOTAL,
        "Engine swaps skipped because the content fingerprint was unchanged"
    );
    describe_counter!(
        ROUTER_ENGINE_STREAMS_EXCLUDED_TOTAL,
        "Streams excluded from an engine build due to invalid rules"
    );
    describe_counter!(
        ROUTER_MESSAGES_ROUTED_TOTAL,
        "Total number of messages routed"
    );
    describe_counter!(
        ROUTER_STREAM_INCOMING_TOTAL,
        "Messages routed into a stream"
    );
    describe_histogram!(
        ROUTER_STREAM_EXECUTION_SECONDS,
        "Single-pass match duration per message in seconds"
    );
    describe_counter!(
        ROUTER_STREAM_FAULTS_TOTAL,
        "Rule evaluation faults (timeouts, oversized values) per stream"
    );
    describe_gauge!(
        ROUTER_STREAMS_QUARANTINED,
        "Number of streams currently quarantined"
    );
}
