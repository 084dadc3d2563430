//! 규칙 단위 평가 하네스 -- 시간 예산 초과를 장애로 변환
//!
//! 각 규칙 평가는 [`EvalHarness`]를 거칩니다. 하네스는 평가의 경과
//! 시간을 측정하고, 예산을 초과한 평가를 [`MatchFault::Timeout`]으로
//! 변환합니다. 해당 규칙은 비매칭으로 처리되고, 같은 메시지의 나머지
//! 규칙 평가는 계속됩니다.
//!
//! 정규식 엔진은 실행 중 취소를 지원하지 않으므로, 실행 시간 상한은
//! 매처 수준의 사전 비용 제한(선형 시간 엔진, 컴파일 크기 한도,
//! 값 스캔 상한)으로 보장되고 하네스는 초과를 사후 감지합니다.

use std::time::{Duration, Instant};

use logweir_core::message::Message;

use crate::matcher::{CompiledRule, MatchFault, RuleMatcher};

/// 규칙 단위 평가 예산
#[derive(Debug, Clone, Copy)]
pub struct EvalHarness {
    /// 규칙 하나의 평가에 허용되는 시간
    timeout: Duration,
}

impl EvalHarness {
    /// 새 하네스를 생성합니다.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// 허용 시간을 반환합니다.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 매처 호출을 감싸 평가 시간을 측정합니다.
    ///
    /// 매처 자체의 장애는 그대로 전달되며, 평가가 예산을 초과한 경우
    /// 결과와 무관하게 [`MatchFault::Timeout`]을 반환합니다.
    pub fn evaluate(
        &self,
        matcher: &dyn RuleMatcher,
        message: &Message,
        rule: &CompiledRule,
    ) -> Result<bool, MatchFault> {
        let start = Instant::now();
        let result = matcher.matches(message, rule);
        let elapsed = start.elapsed();

        if elapsed > self.timeout {
            return Err(MatchFault::Timeout {
                elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                budget_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }

        result
    }
}
