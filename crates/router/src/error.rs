//! 라우터 에러 타입
//!
//! [`RouterError`]는 라우터 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<RouterError> for LogweirError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 메시지 단위 평가 에러는 여기에 속하지 않습니다. 평가 중의 장애는
//! [`MatchFault`](crate::matcher::MatchFault)로 표현되어 비매칭 처리되며,
//! `route`는 호출자에게 에러를 전파하지 않습니다.

use logweir_core::error::{CatalogueError, LogweirError};

/// 라우터 도메인 에러
///
/// 엔진 빌드, 규칙 컴파일, 설정, 카탈로그 접근 등
/// 라우팅 경로 바깥의 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// 규칙 컴파일 실패 (정규식 오류, 값 리터럴 누락 등)
    #[error("rule compile error: rule '{rule_id}': {reason}")]
    RuleCompile {
        /// 문제가 된 규칙 ID
        rule_id: String,
        /// 컴파일 실패 사유
        reason: String,
    },

    /// 스트림 정의가 유효하지 않음
    #[error("invalid stream definition '{stream_id}': {reason}")]
    InvalidDefinition {
        /// 문제가 된 스트림 ID
        stream_id: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 카탈로그 에러
    #[error("catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),

    /// 라우터가 이미 실행 중
    #[error("router already running")]
    AlreadyRunning,

    /// 라우터가 실행 중이 아님
    #[error("router not running")]
    NotRunning,
}

impl From<RouterError> for LogweirError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::Catalogue(e) => LogweirError::Catalogue(e),
            other => LogweirError::Routing(other.to_string()),
        }
    }
}
