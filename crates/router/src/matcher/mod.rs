//! 규칙 매처 -- 규칙 종류별 평가 로직 및 컴파일된 규칙
//!
//! 각 규칙 종류마다 하나의 매처가 [`RuleMatcher`] trait을 구현합니다.
//! 매처는 순수 함수이며 부수 효과가 없고, 공유된 불변 엔진에 대해
//! 여러 스레드에서 동시에 호출해도 안전합니다.
//!
//! # 결과 전달 계약
//! 매처는 예외를 던지지 않습니다. 평가를 완료할 수 없는 상황(타임아웃,
//! 비용 한도 초과)은 [`MatchFault`]로 반환되며, 라우터가 이를 비매칭으로
//! 처리하고 장애 카운터에 반영합니다.
//!
//! # 비용 한도 정책
//! 정규식 비용은 평가 시점이 아니라 사전에 제한됩니다: 선형 시간 정규식
//! 엔진, 컴파일 크기 한도, 필드 값 스캔 상한. 스캔 상한을 넘는 값은
//! [`MatchFault::OversizedValue`]로 보고됩니다.

mod exact;
mod greater;
mod presence;
mod regex_match;
mod smaller;

pub use exact::ExactMatcher;
pub use greater::GreaterMatcher;
pub use presence::PresenceMatcher;
pub use regex_match::RegexMatcher;
pub use smaller::SmallerMatcher;

use regex::{Regex, RegexBuilder};

use logweir_core::message::Message;
use logweir_core::types::{RuleKind, StreamRule};

use crate::error::RouterError;

/// 규칙 평가를 완료할 수 없었던 장애
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchFault {
    /// 평가가 허용 시간을 초과함
    #[error("rule evaluation exceeded budget: {elapsed_ms}ms (budget {budget_ms}ms)")]
    Timeout {
        /// 실제 경과 시간 (밀리초)
        elapsed_ms: u64,
        /// 허용 시간 (밀리초)
        budget_ms: u64,
    },

    /// 필드 값이 스캔 상한을 초과함
    #[error("field value too large to scan: {len} bytes (max {max})")]
    OversizedValue {
        /// 값 크기 (바이트)
        len: usize,
        /// 스캔 상한 (바이트)
        max: usize,
    },
}

impl MatchFault {
    /// 메트릭 레이블로 사용되는 장애 종류 이름
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::OversizedValue { .. } => "oversized_value",
        }
    }
}

/// 규칙 컴파일 한도
#[derive(Debug, Clone, Copy)]
pub struct CompileLimits {
    /// 정규식 컴파일 크기 한도 (바이트)
    pub regex_size_limit: usize,
    /// 매칭 대상 필드 값 최대 크기 (바이트)
    pub max_value_scan_bytes: usize,
}

impl Default for CompileLimits {
    fn default() -> Self {
        Self {
            regex_size_limit: 1024 * 1024,
            max_value_scan_bytes: 64 * 1024,
        }
    }
}

/// 엔진 빌드 시점에 고정되는 컴파일된 규칙
///
/// 정규식은 여기서 한 번만 컴파일되고, Greater/Smaller의 비교 값은
/// 미리 파싱됩니다. 규칙 값 리터럴이 수치가 아니면 `bound`는 `None`이며
/// 해당 규칙의 모든 평가는 비매칭이 됩니다.
#[derive(Debug)]
pub struct CompiledRule {
    /// 원본 규칙 정의
    pub rule: StreamRule,
    /// 컴파일된 정규식 (Regex 규칙에만 존재)
    pub regex: Option<Regex>,
    /// 파싱된 수치 비교 값 (Greater/Smaller 규칙)
    pub bound: Option<f64>,
    /// 필드 값 스캔 상한 (바이트)
    pub max_value_scan_bytes: usize,
}

impl CompiledRule {
    /// 규칙을 컴파일합니다.
    ///
    /// # Errors
    /// - 값 리터럴이 필요한 종류인데 값이 없거나 빈 경우
    /// - 정규식 컴파일 실패
    pub fn compile(rule: StreamRule, limits: &CompileLimits) -> Result<Self, RouterError> {
        let value = rule.value.as_deref().map(str::trim).unwrap_or_default();

        if rule.kind.requires_value() && value.is_empty() {
            return Err(RouterError::RuleCompile {
                rule_id: rule.id.clone(),
                reason: format!("{} rule requires a value literal", rule.kind),
            });
        }

        let regex = match rule.kind {
            RuleKind::Regex => {
                let compiled = RegexBuilder::new(value)
                    .size_limit(limits.regex_size_limit)
                    .build()
                    .map_err(|e| RouterError::RuleCompile {
                        rule_id: rule.id.clone(),
                        reason: format!("invalid regex for field '{}': {e}", rule.field),
                    })?;
                Some(compiled)
            }
            _ => None,
        };

        let bound = match rule.kind {
            RuleKind::Greater | RuleKind::Smaller => value.parse::<f64>().ok(),
            _ => None,
        };

        Ok(Self {
            rule,
            regex,
            bound,
            max_value_scan_bytes: limits.max_value_scan_bytes,
        })
    }

    /// 규칙 값 리터럴을 반환합니다. 값이 없으면 빈 문자열입니다.
    pub fn value(&self) -> &str {
        self.rule.value.as_deref().unwrap_or_default()
    }
}

/// 규칙 매처 trait
///
/// `match(message, rule) -> bool`에 해당하며, 평가 불능 상황은
/// `Err(MatchFault)`로 반환됩니다.
pub trait RuleMatcher: Send + Sync {
    /// 규칙이 메시지에 매칭되는지 평가합니다.
    fn matches(&self, message: &Message, rule: &CompiledRule) -> Result<bool, MatchFault>;
}

/// 규칙 종류에 해당하는 매처를 반환합니다.
pub fn matcher_for(kind: RuleKind) -> &'static dyn RuleMatcher {
    match kind {
        RuleKind::Presence => &PresenceMatcher,
        RuleKind::Exact => &ExactMatcher,
        RuleKind::Greater => &GreaterMatcher,
        RuleKind::Smaller => &SmallerMatcher,
        RuleKind::Regex => &RegexMatcher,
    }
}
