//! Presence 매처 -- 필드 존재 여부 평가

use logweir_core::message::Message;

use super::{CompiledRule, MatchFault, RuleMatcher};

/// 필드가 존재하고 문자열 형태가 비어있지 않으면 매칭됩니다.
///
/// 반전 규칙은 필드의 부재를 단언하므로, 엔진은 Presence 인덱스의
/// 모든 필드를 메시지 필드 교집합 없이 평가합니다.
pub struct PresenceMatcher;

impl RuleMatcher for PresenceMatcher {
    fn matches(&self, message: &Message, rule: &CompiledRule) -> Result<bool, MatchFault> {
        let present = message
            .get_field(&rule.rule.field)
            .is_some_and(|v| !v.as_text().is_empty());

        Ok(present ^ rule.rule.inverted)
    }
}
