//! 라우터 파사드 -- 메시지 한 건을 스트림 목록으로 라우팅하는 진입점
//!
//! [`Router`]는 호출자가 사용하는 안정적인 진입점입니다. 현재 엔진
//! 포인터, 스트림별 장애 계정, 메트릭 기록을 보유하며, 그 외에는 호출
//! 간 상태가 없습니다. 여러 태스크에서 동시에 호출해도 안전합니다.
//!
//! 공유 가변 상태는 엔진 슬롯 하나뿐입니다. 라우팅은 잠금 없이 슬롯을
//! 읽고, 엔진 업데이터가 원자적 스토어로 슬롯을 교체합니다.
//!
//! # 평가 풀
//! 매칭 패스는 CPU 바운드이므로 `spawn_blocking`으로 수행됩니다.
//! 블로킹 풀은 인제스트 태스크가 도는 비동기 워커와 분리되어 있어,
//! 비정상적으로 느린 매칭이 인제스트를 굶기지 않습니다.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use metrics::{counter, histogram};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use logweir_core::error::{CatalogueError, LogweirError};
use logweir_core::message::Message;
use logweir_core::metrics::{
    LABEL_FAULT, LABEL_STREAM, ROUTER_MESSAGES_ROUTED_TOTAL, ROUTER_STREAM_EXECUTION_SECONDS,
    ROUTER_STREAM_FAULTS_TOTAL, ROUTER_STREAM_INCOMING_TOTAL,
};
use logweir_core::pipeline::{HealthStatus, Pipeline, StreamCatalogue};
use logweir_core::types::Stream;

use crate::config::RouterConfig;
use crate::engine::{CompiledEngine, EngineMatch, StreamTestMatch};
use crate::error::RouterError;
use crate::fault::FaultManager;
use crate::harness::EvalHarness;
use crate::updater::{EngineUpdater, RebuildOutcome};

/// 라우터 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum RouterState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 라우팅 결과 — 메시지와 매칭된 스트림 목록
#[derive(Debug)]
pub struct Routing {
    /// 스트림 ID가 할당된 메시지
    pub message: Message,
    /// 매칭된 스트림 (스냅샷 순서)
    pub streams: Vec<Arc<Stream>>,
}

/// 스트림 라우터
///
/// # 사용 예시
/// ```ignore
/// use logweir_router::{Router, RouterBuilder};
///
/// let mut router = RouterBuilder::new()
///     .config(config)
///     .catalogue(catalogue)
///     .build()?;
///
/// router.start().await?;
/// let routing = router.route(message).await;
/// ```
pub struct Router {
    /// 라우터 설정
    config: RouterConfig,
    /// 현재 엔진 슬롯 (업데이터와 공유)
    slot: Arc<ArcSwap<CompiledEngine>>,
    /// 스트림별 장애 계정
    faults: Arc<FaultManager>,
    /// 스트림/규칙 정의 소스
    catalogue: Arc<dyn StreamCatalogue>,
    /// 규칙 단위 평가 하네스
    harness: EvalHarness,
    /// 현재 상태
    state: RouterState,
    /// 업데이터 취소 토큰
    cancel: CancellationToken,
    /// 백그라운드 태스크 핸들
    tasks: Vec<JoinHandle<()>>,
}

impl Router {
    /// 메시지를 라우팅합니다.
    ///
    /// 현재 엔진 포인터를 한 번 읽고, 단일 패스 매칭을 블로킹 풀에서
    /// 수행한 뒤, 매칭된 스트림 ID를 메시지에 할당하여 반환합니다.
    /// 이 함수는 실패하지 않습니다: 평가 장애는 비매칭으로 처리되고
    /// 장애 카운터에 반영됩니다.
    pub async fn route(&self, message: Message) -> Routing {
        let engine = self.slot.load_full();
        let harness = self.harness;
        let recording = self.config.recording;

        let started = Instant::now();
        let shared = Arc::new(message);
        let task_message = Arc::clone(&shared);

        let outcome = match tokio::task::spawn_blocking(move || {
            engine.match_message(&task_message, &harness)
        })
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                // 매처는 패닉하지 않으므로 도달하지 않아야 하는 경로.
                // 방어적으로 비매칭 처리한다.
                tracing::error!(error = %e, "match task failed, treating as no match");
                EngineMatch::default()
            }
        };
        let elapsed = started.elapsed();

        let mut message = Arc::try_unwrap(shared).unwrap_or_else(|shared| (*shared).clone());

        counter!(ROUTER_MESSAGES_ROUTED_TOTAL).increment(1);
        histogram!(ROUTER_STREAM_EXECUTION_SECONDS).record(elapsed.as_secs_f64());

        for stream_fault in &outcome.faults {
            counter!(
                ROUTER_STREAM_FAULTS_TOTAL,
                LABEL_STREAM => stream_fault.stream_id.clone(),
                LABEL_FAULT => stream_fault.fault.label()
            )
            .increment(1);
            tracing::debug!(
                stream_id = %stream_fault.stream_id,
                fault = %stream_fault.fault,
                "rule evaluation fault, treated as non-match"
            );

            if self.faults.register_failure(&stream_fault.stream_id) {
                tracing::warn!(
                    stream_id = %stream_fault.stream_id,
                    "stream will be excluded at the next engine rebuild"
                );
            }
        }

        message.record_counter(
            recording,
            "streams-evaluated",
            outcome.streams_evaluated as u64,
        );
        if recording.should_record() {
            for (stream_id, count) in &outcome.rules_evaluated {
                message.record_counter(recording, &format!("rules-evaluated-{stream_id}"), *count);
            }
        }
        message.record_timing(recording, "stream-routing", elapsed);

        for stream in &outcome.matches {
            counter!(ROUTER_STREAM_INCOMING_TOTAL, LABEL_STREAM => stream.id.clone()).increment(1);
        }

        message.set_stream_ids(outcome.matches.iter().map(|s| s.id.clone()).collect());

        Routing {
            message,
            streams: outcome.matches,
        }
    }

    /// 진단용 매칭: 현재 엔진의 모든 스트림에 대해 규칙별 결과를
    /// 반환합니다. 단축 경로가 없으며 장애는 비매칭으로 보고됩니다.
    pub fn test_match(&self, message: &Message) -> Vec<StreamTestMatch> {
        self.slot.load().test_match(message)
    }

    /// 즉시 리빌드를 수행합니다.
    ///
    /// 주기적 리빌드를 기다리지 않고 카탈로그 변경을 반영할 때
    /// 사용합니다 (관리용).
    pub async fn rebuild_now(&self) -> Result<RebuildOutcome, CatalogueError> {
        self.make_updater().rebuild().await
    }

    /// 현재 엔진에 인덱싱된 스트림 수를 반환합니다.
    pub fn stream_count(&self) -> usize {
        self.slot.load().stream_count()
    }

    /// 현재 엔진에 인덱싱된 규칙 수를 반환합니다.
    pub fn rule_count(&self) -> usize {
        self.slot.load().rule_count()
    }

    /// 스트림의 현재 장애 카운트를 반환합니다.
    pub fn fault_count(&self, stream_id: &str) -> u32 {
        self.faults.fault_count(stream_id)
    }

    /// 격리된 스트림 ID 목록을 반환합니다.
    pub fn quarantined_ids(&self) -> Vec<String> {
        self.faults.quarantined_ids()
    }

    /// 스트림 격리를 관리자 권한으로 해제합니다.
    ///
    /// 다음 리빌드부터 스트림이 다시 포함됩니다.
    pub fn clear_quarantine(&self, stream_id: &str) {
        self.faults.clear_quarantine(stream_id);
    }

    /// 현재 상태 이름을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            RouterState::Initialized => "initialized",
            RouterState::Running => "running",
            RouterState::Stopped => "stopped",
        }
    }

    fn make_updater(&self) -> EngineUpdater {
        EngineUpdater::new(
            Arc::clone(&self.slot),
            Arc::clone(&self.catalogue),
            Arc::clone(&self.faults),
            &self.config,
        )
    }
}

impl Pipeline for Router {
    async fn start(&mut self) -> Result<(), LogweirError> {
        if self.state == RouterState::Running {
            return Err(RouterError::AlreadyRunning.into());
        }

        tracing::info!("starting stream router");

        // 1. 초기 엔진 빌드 — 카탈로그 장애는 치명적이지 않음
        //    (빈 엔진으로 시작하고 주기 리빌드가 복구함)
        let updater = self.make_updater();
        match updater.rebuild().await {
            Ok(RebuildOutcome::Swapped { streams, rules }) => {
                tracing::info!(streams, rules, "initial engine built");
            }
            Ok(RebuildOutcome::Unchanged) => {
                tracing::info!("initial engine unchanged");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "initial catalogue load failed, starting with empty engine"
                );
            }
        }

        // 2. 주기적 리빌드 태스크 스폰
        self.cancel = CancellationToken::new();
        let task = tokio::spawn(updater.run(self.config.rebuild_period, self.cancel.clone()));
        self.tasks.push(task);

        self.state = RouterState::Running;
        tracing::info!(
            rebuild_period_ms = self.config.rebuild_period.as_millis() as u64,
            "stream router started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), LogweirError> {
        if self.state != RouterState::Running {
            return Err(RouterError::NotRunning.into());
        }

        tracing::info!("stopping stream router");

        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "updater task join failed");
            }
        }

        self.state = RouterState::Stopped;
        tracing::info!("stream router stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            RouterState::Running => {
                let quarantined = self.faults.quarantined_count();
                if quarantined > 0 {
                    HealthStatus::Degraded(format!("{quarantined} streams quarantined"))
                } else {
                    HealthStatus::Healthy
                }
            }
            RouterState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            RouterState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 라우터 빌더
pub struct RouterBuilder {
    config: RouterConfig,
    catalogue: Option<Arc<dyn StreamCatalogue>>,
}

impl RouterBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: RouterConfig::default(),
            catalogue: None,
        }
    }

    /// 라우터 설정을 지정합니다.
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// 스트림 카탈로그를 지정합니다 (필수).
    pub fn catalogue(mut self, catalogue: Arc<dyn StreamCatalogue>) -> Self {
        self.catalogue = Some(catalogue);
        self
    }

    /// 라우터를 빌드합니다.
    ///
    /// 빈 엔진으로 초기화되며, `start()`가 첫 리빌드를 수행합니다.
    pub fn build(self) -> Result<Router, RouterError> {
        self.config.validate()?;

        let catalogue = self.catalogue.ok_or(RouterError::Config {
            field: "catalogue".to_owned(),
            reason: "a stream catalogue is required".to_owned(),
        })?;

        let harness = EvalHarness::new(self.config.processing_timeout);
        let faults = Arc::new(FaultManager::new(self.config.max_fault_count));

        Ok(Router {
            config: self.config,
            slot: Arc::new(ArcSwap::from_pointee(CompiledEngine::empty())),
            faults,
            catalogue,
            harness,
            state: RouterState::Initialized,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
