#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`matcher`]: 규칙 종류별 매처 (presence, exact, greater, smaller, regex)
//! - [`engine`]: 필드명/규칙 종류로 인덱싱된 불변 컴파일드 엔진
//! - [`harness`]: 규칙 단위 평가 시간 예산
//! - [`fault`]: 스트림별 장애 카운팅 및 격리
//! - [`updater`]: 주기적 엔진 리빌드 및 원자적 발행
//! - [`router`]: 라우팅 진입점 파사드 (Pipeline trait 구현)
//! - [`catalogue`]: 인메모리/YAML 스트림 카탈로그 구현
//! - [`config`]: 라우터 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! Catalogue -> EngineUpdater -> (atomic swap) -> CompiledEngine
//!                                                     ^
//! Message -> Router::route ---------------------------+--> [Stream]
//! ```

pub mod catalogue;
pub mod config;
pub mod engine;
pub mod error;
pub mod fault;
pub mod harness;
pub mod matcher;
pub mod router;
pub mod updater;

// --- 주요 타입 re-export ---

// 라우터
pub use router::{Router, RouterBuilder, Routing};

// 설정
pub use config::{RouterConfig, RouterConfigBuilder};

// 에러
pub use error::RouterError;

// 엔진
pub use engine::{CompiledEngine, EngineMatch, RuleTestResult, StreamFault, StreamTestMatch};

// 매처
pub use matcher::{CompileLimits, CompiledRule, MatchFault, RuleMatcher, matcher_for};

// 장애 관리
pub use fault::FaultManager;

// 하네스
pub use harness::EvalHarness;

// 업데이터
pub use updater::{EngineUpdater, RebuildOutcome};

// 카탈로그
pub use catalogue::{MemoryCatalogue, StreamFile, YamlCatalogue};
