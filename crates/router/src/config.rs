//! 라우터 설정
//!
//! [`RouterConfig`]는 core의 [`RouterSettings`](logweir_core::config::RouterSettings)를
//! 기반으로 라우터 전용 타입(Duration, 전략 enum)과 매처 비용 한도를 제공합니다.

use std::time::Duration;

use logweir_core::message::RecordingStrategy;

use crate::error::RouterError;
use crate::matcher::CompileLimits;

/// 라우터 설정
///
/// core의 `RouterSettings`에서 파생되며, 라우터 내부에서 사용하는
/// 매처 비용 한도 필드를 추가로 포함합니다.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// 규칙 단위 평가 타임아웃
    pub processing_timeout: Duration,
    /// 스트림 격리 장애 임계값
    pub max_fault_count: u32,
    /// 엔진 리빌드 주기
    pub rebuild_period: Duration,
    /// 메시지별 상세 기록 전략
    pub recording: RecordingStrategy,

    // --- 매처 비용 한도 (core에 없는 추가 필드) ---
    /// 매칭 대상 필드 값 최대 크기 (바이트)
    pub max_value_scan_bytes: usize,
    /// 정규식 컴파일 크기 한도 (바이트)
    pub regex_size_limit: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            processing_timeout: Duration::from_millis(2000),
            max_fault_count: 3,
            rebuild_period: Duration::from_millis(1000),
            recording: RecordingStrategy::Never,
            max_value_scan_bytes: 64 * 1024,
            regex_size_limit: 1024 * 1024,
        }
    }
}

impl RouterConfig {
    /// core의 `RouterSettings`에서 라우터 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &logweir_core::config::RouterSettings) -> Self {
        Self {
            processing_timeout: Duration::from_millis(core.processing_timeout_ms),
            max_fault_count: core.max_fault_count,
            rebuild_period: Duration::from_millis(core.rebuild_period_ms),
            recording: RecordingStrategy::from_str_loose(&core.message_recording)
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    /// 이 설정에서 파생되는 규칙 컴파일 한도를 반환합니다.
    pub fn compile_limits(&self) -> CompileLimits {
        CompileLimits {
            regex_size_limit: self.regex_size_limit,
            max_value_scan_bytes: self.max_value_scan_bytes,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), RouterError> {
        const MIN_SCAN_BYTES: usize = 256;

        if self.processing_timeout.is_zero() {
            return Err(RouterError::Config {
                field: "processing_timeout".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_fault_count == 0 {
            return Err(RouterError::Config {
                field: "max_fault_count".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.rebuild_period.is_zero() {
            return Err(RouterError::Config {
                field: "rebuild_period".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_value_scan_bytes < MIN_SCAN_BYTES {
            return Err(RouterError::Config {
                field: "max_value_scan_bytes".to_owned(),
                reason: format!("must be at least {MIN_SCAN_BYTES}"),
            });
        }

        if self.regex_size_limit == 0 {
            return Err(RouterError::Config {
                field: "regex_size_limit".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 라우터 설정 빌더
#[derive(Default)]
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 규칙 단위 평가 타임아웃을 설정합니다.
    pub fn processing_timeout(mut self, timeout: Duration) -> Self {
        self.config.processing_timeout = timeout;
        self
    }

    /// 스트림 격리 장애 임계값을 설정합니다.
    pub fn max_fault_count(mut self, count: u32) -> Self {
        self.config.max_fault_count = count;
        self
    }

    /// 엔진 리빌드 주기를 설정합니다.
    pub fn rebuild_period(mut self, period: Duration) -> Self {
        self.config.rebuild_period = period;
        self
    }

    /// 메시지별 상세 기록 전략을 설정합니다.
    pub fn recording(mut self, strategy: RecordingStrategy) -> Self {
        self.config.recording = strategy;
        self
    }

    /// 매칭 대상 필드 값 최대 크기를 설정합니다.
    pub fn max_value_scan_bytes(mut self, bytes: usize) -> Self {
        self.config.max_value_scan_bytes = bytes;
        self
    }

    /// 설정을 검증하고 `RouterConfig`를 생성합니다.
    pub fn build(self) -> Result<RouterConfig, RouterError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
