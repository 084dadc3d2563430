//! 에러 타입 — 도메인별 에러 정의

/// logweir 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogweirError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스트림 카탈로그 에러
    #[error("catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),

    /// 라우팅 파이프라인 에러
    #[error("routing error: {0}")]
    Routing(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스트림 카탈로그 에러
///
/// 카탈로그 로딩 실패 시 업데이터는 이전 엔진을 유지한 채
/// 경고 로그만 남기고 다음 주기를 기다립니다.
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    /// 카탈로그 소스에 접근 불가 (디렉토리 읽기 실패 등)
    #[error("catalogue unavailable: {reason}")]
    Unavailable { reason: String },

    /// 스트림 정의 로딩 실패
    #[error("failed to load stream definition: {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// 스트림/규칙 정의가 유효하지 않음
    #[error("invalid stream definition '{stream_id}': {reason}")]
    InvalidDefinition { stream_id: String, reason: String },

    /// 존재하지 않는 스트림 참조
    #[error("stream not found: {stream_id}")]
    StreamNotFound { stream_id: String },
}
