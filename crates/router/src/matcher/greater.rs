//! Greater 매처 -- 수치 비교 (메시지 값 > 규칙 값)

use logweir_core::message::Message;

use super::{CompiledRule, MatchFault, RuleMatcher};

/// 메시지 값과 규칙 값을 IEEE-754 double로 변환하여 비교합니다.
///
/// 어느 한쪽이라도 수치로 변환되지 않으면 비매칭입니다.
/// 반전은 변환 검사 이후의 비교 결과에만 적용됩니다.
pub struct GreaterMatcher;

impl RuleMatcher for GreaterMatcher {
    fn matches(&self, message: &Message, rule: &CompiledRule) -> Result<bool, MatchFault> {
        let Some(bound) = rule.bound else {
            return Ok(false);
        };
        let Some(value) = message.get_field(&rule.rule.field).and_then(|v| v.as_f64()) else {
            return Ok(false);
        };

        Ok((value > bound) ^ rule.rule.inverted)
    }
}
