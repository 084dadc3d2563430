//! 파이프라인 trait — 모듈 생명주기 및 확장 포인트 정의
//!
//! [`Pipeline`] trait은 데몬이 관리하는 모듈의 생명주기 인터페이스입니다.
//! [`StreamCatalogue`] trait은 스트림/규칙 정의를 제공하는 외부 협력자와의
//! 경계이며, 엔진 업데이터가 리빌드 시마다 호출합니다.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogueError, LogweirError};
use crate::types::{Stream, StreamRule};

/// dyn-compatible Future 타입 별칭
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 모든 파이프라인 모듈이 구현하는 생명주기 trait
///
/// `logweir-daemon`에서 모듈을 시작/정지하고 상태를 확인하는 데 사용됩니다.
pub trait Pipeline: Send + Sync {
    /// 모듈을 시작합니다.
    ///
    /// 리소스 초기화, 백그라운드 태스크 스폰 등을 수행합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), LogweirError>> + Send;

    /// 모듈을 정지합니다.
    ///
    /// Graceful shutdown을 수행합니다. 진행 중인 작업을 완료하고
    /// 백그라운드 태스크를 정리합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), LogweirError>> + Send;

    /// 모듈의 현재 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// dyn-compatible 파이프라인 trait
///
/// `Pipeline` trait은 RPITIT를 사용하므로 `dyn Pipeline`이 불가합니다.
/// `DynPipeline`은 `BoxFuture`를 반환하여 모듈을 동적으로 관리할 수 있게 합니다.
pub trait DynPipeline: Send + Sync {
    /// 모듈을 시작합니다.
    fn start(&mut self) -> BoxFuture<'_, Result<(), LogweirError>>;

    /// 모듈을 정지합니다.
    fn stop(&mut self) -> BoxFuture<'_, Result<(), LogweirError>>;

    /// 모듈의 현재 상태를 확인합니다.
    fn health_check(&self) -> BoxFuture<'_, HealthStatus>;
}

impl<T: Pipeline> DynPipeline for T {
    fn start(&mut self) -> BoxFuture<'_, Result<(), LogweirError>> {
        Box::pin(Pipeline::start(self))
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), LogweirError>> {
        Box::pin(Pipeline::stop(self))
    }

    fn health_check(&self) -> BoxFuture<'_, HealthStatus> {
        Box::pin(Pipeline::health_check(self))
    }
}

/// 모듈 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 정상 동작 중
    Healthy,
    /// 성능 저하 또는 부분적 장애 (서비스는 계속 동작)
    Degraded(String),
    /// 비정상 — 서비스 불가 상태
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 스트림 카탈로그 trait — 스트림/규칙 정의 제공자와의 경계
///
/// 정의의 영속성은 카탈로그 구현의 책임이며, 엔진은 리빌드 시점의
/// 스냅샷만 소비합니다. 모든 연산은 실패할 수 있고, 실패 시 업데이터는
/// 로그를 남기고 현재 엔진을 유지합니다.
pub trait StreamCatalogue: Send + Sync {
    /// 활성화된 모든 스트림을 로드합니다. 규칙은 포함되지 않습니다.
    fn load_enabled_streams(&self) -> BoxFuture<'_, Result<Vec<Stream>, CatalogueError>>;

    /// 특정 스트림의 규칙 목록을 로드합니다.
    fn load_rules(&self, stream_id: &str) -> BoxFuture<'_, Result<Vec<StreamRule>, CatalogueError>>;

    /// 활성 스트림과 각 스트림의 규칙을 하나의 스냅샷으로 로드합니다.
    ///
    /// 리빌드마다 호출되는 경로입니다. 기본 구현은 위 두 연산을
    /// 조합하지만, 소스를 읽는 비용이 스트림 수에 비례하는 구현
    /// (디렉토리, 원격 저장소)은 한 번의 순회로 끝나도록 재정의해야
    /// 합니다.
    fn load_snapshot(&self) -> BoxFuture<'_, Result<Vec<Stream>, CatalogueError>> {
        Box::pin(async {
            let mut streams = self.load_enabled_streams().await?;
            for stream in &mut streams {
                stream.rules = self.load_rules(&stream.id).await?;
            }
            Ok(streams)
        })
    }
}
