//! 설정 관리 — logweir.toml 파싱 및 런타임 설정

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// logweir 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogweirConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 라우터 설정
    #[serde(default)]
    pub router: RouterSettings,
    /// 스트림 카탈로그 설정
    #[serde(default)]
    pub catalogue: CatalogueConfig,
    /// 메트릭 노출 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl LogweirConfig {
    /// 설정 파일을 로드하고 파싱합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|_| ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })?;

        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.general.validate()?;
        self.router.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// 로그 레벨
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 데이터 디렉토리
    pub data_dir: String,
    /// PID 파일 경로
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            data_dir: "/var/lib/logweir".to_owned(),
            pid_file: "/run/logweir.pid".to_owned(),
        }
    }
}

impl GeneralConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.log_format != "json" && self.log_format != "pretty" {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("unknown format '{}', expected 'json' or 'pretty'", self.log_format),
            });
        }
        Ok(())
    }
}

/// 라우터 설정
///
/// 라우팅 엔진의 타임아웃, 장애 임계값, 리빌드 주기를 제어합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    /// 규칙 단위 평가 타임아웃 (밀리초)
    pub processing_timeout_ms: u64,
    /// 스트림 격리 장애 임계값
    pub max_fault_count: u32,
    /// 엔진 리빌드 주기 (밀리초)
    pub rebuild_period_ms: u64,
    /// 메시지별 상세 기록 전략 (never, always)
    pub message_recording: String,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            processing_timeout_ms: 2000,
            max_fault_count: 3,
            rebuild_period_ms: 1000,
            message_recording: "never".to_owned(),
        }
    }
}

impl RouterSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        const MAX_TIMEOUT_MS: u64 = 60_000;
        const MAX_REBUILD_PERIOD_MS: u64 = 3_600_000;

        if self.processing_timeout_ms == 0 || self.processing_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::InvalidValue {
                field: "router.processing_timeout_ms".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_MS}"),
            });
        }

        if self.max_fault_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "router.max_fault_count".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.rebuild_period_ms == 0 || self.rebuild_period_ms > MAX_REBUILD_PERIOD_MS {
            return Err(ConfigError::InvalidValue {
                field: "router.rebuild_period_ms".to_owned(),
                reason: format!("must be 1-{MAX_REBUILD_PERIOD_MS}"),
            });
        }

        if crate::message::RecordingStrategy::from_str_loose(&self.message_recording).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "router.message_recording".to_owned(),
                reason: format!(
                    "unknown strategy '{}', expected 'never' or 'always'",
                    self.message_recording
                ),
            });
        }

        Ok(())
    }
}

/// 스트림 카탈로그 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// 스트림 정의 YAML 디렉토리 경로
    pub stream_dir: String,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            stream_dir: "/etc/logweir/streams".to_owned(),
        }
    }
}

/// 메트릭 노출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
    /// 노출 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9830,
            endpoint: "/metrics".to_owned(),
        }
    }
}

impl MetricsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metrics.port".to_owned(),
                reason: "must be greater than 0 when metrics are enabled".to_owned(),
            });
        }
        Ok(())
    }
}
