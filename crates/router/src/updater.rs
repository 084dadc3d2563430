//! 엔진 업데이터 -- 주기적 리빌드 및 원자적 발행
//!
//! [`EngineUpdater`]는 카탈로그에서 활성 스트림과 규칙을 로드하여 새
//! [`CompiledEngine`]을 빌드하고, 라우터의 엔진 슬롯에 원자적으로
//! 발행합니다. 스왑은 단일 선형화 지점입니다: 스왑 이후 시작된 모든
//! 매칭은 새 엔진을 처음부터 끝까지 사용하며, 찢어진 엔진을 관측할 수
//! 없습니다.
//!
//! 내용 지문이 직전 엔진과 같으면 스왑을 생략합니다. 카탈로그 로딩에
//! 실패하면 현재 엔진을 유지한 채 경고만 남깁니다.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use metrics::{counter, gauge, histogram};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use logweir_core::error::CatalogueError;
use logweir_core::metrics::{
    ROUTER_ENGINE_BUILDS_TOTAL, ROUTER_ENGINE_BUILD_DURATION_SECONDS,
    ROUTER_ENGINE_RULES_CURRENT, ROUTER_ENGINE_SWAPS_SKIPPED_TOTAL,
};
use logweir_core::pipeline::StreamCatalogue;

use crate::config::RouterConfig;
use crate::engine::CompiledEngine;
use crate::fault::FaultManager;
use crate::matcher::CompileLimits;

/// 리빌드 한 번의 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// 새 엔진이 발행됨
    Swapped {
        /// 인덱싱된 스트림 수
        streams: usize,
        /// 인덱싱된 규칙 수
        rules: usize,
    },
    /// 내용 지문이 같아 스왑이 생략됨
    Unchanged,
}

/// 엔진 업데이터
pub struct EngineUpdater {
    /// 라우터와 공유하는 엔진 슬롯
    slot: Arc<ArcSwap<CompiledEngine>>,
    /// 스트림/규칙 정의 소스
    catalogue: Arc<dyn StreamCatalogue>,
    /// 격리 상태 조회용 장애 관리자
    faults: Arc<FaultManager>,
    /// 규칙 컴파일 한도
    limits: CompileLimits,
}

impl EngineUpdater {
    /// 새 업데이터를 생성합니다.
    pub fn new(
        slot: Arc<ArcSwap<CompiledEngine>>,
        catalogue: Arc<dyn StreamCatalogue>,
        faults: Arc<FaultManager>,
        config: &RouterConfig,
    ) -> Self {
        Self {
            slot,
            catalogue,
            faults,
            limits: config.compile_limits(),
        }
    }

    /// 카탈로그에서 엔진을 리빌드하고 필요 시 발행합니다.
    ///
    /// 스냅샷은 `load_snapshot` 한 번으로 읽습니다 (카탈로그 소스를
    /// 스트림 수만큼 다시 읽지 않도록). 격리된 스트림은 스냅샷에서
    /// 제외됩니다. 로딩 실패 시 현재 엔진은 변경되지 않습니다.
    pub async fn rebuild(&self) -> Result<RebuildOutcome, CatalogueError> {
        let mut snapshot = self.catalogue.load_snapshot().await?;

        snapshot.retain(|stream| {
            if self.faults.is_quarantined(&stream.id) {
                tracing::debug!(stream_id = %stream.id, "stream quarantined, excluded from rebuild");
                false
            } else {
                true
            }
        });

        let started = Instant::now();
        let engine = CompiledEngine::build(snapshot, &self.limits);
        counter!(ROUTER_ENGINE_BUILDS_TOTAL).increment(1);
        histogram!(ROUTER_ENGINE_BUILD_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        let current = self.slot.load();
        if current.fingerprint() == engine.fingerprint() {
            counter!(ROUTER_ENGINE_SWAPS_SKIPPED_TOTAL).increment(1);
            return Ok(RebuildOutcome::Unchanged);
        }

        let streams = engine.stream_count();
        let rules = engine.rule_count();
        gauge!(ROUTER_ENGINE_RULES_CURRENT).set(rules as f64);

        self.slot.store(Arc::new(engine));

        Ok(RebuildOutcome::Swapped { streams, rules })
    }

    /// 주기적 리빌드 루프를 실행합니다. 취소될 때까지 동작합니다.
    pub async fn run(self, period: std::time::Duration, cancel: CancellationToken) {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("engine updater stopped");
                    break;
                }
                _ = timer.tick() => {
                    match self.rebuild().await {
                        Ok(RebuildOutcome::Swapped { streams, rules }) => {
                            tracing::debug!(streams, rules, "published new engine");
                        }
                        Ok(RebuildOutcome::Unchanged) => {}
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                "catalogue load failed, retaining current engine"
                            );
                        }
                    }
                }
            }
        }
    }
}
