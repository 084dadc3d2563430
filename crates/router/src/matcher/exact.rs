//! Exact 매처 -- 문자열 완전 일치 평가

use logweir_core::message::Message;

use super::{CompiledRule, MatchFault, RuleMatcher};

/// 필드가 존재하고 문자열 형태가 규칙 값과 옥텟 단위로 일치하면 매칭됩니다.
pub struct ExactMatcher;

impl RuleMatcher for ExactMatcher {
    fn matches(&self, message: &Message, rule: &CompiledRule) -> Result<bool, MatchFault> {
        let matched = message
            .get_field(&rule.rule.field)
            .is_some_and(|v| v.as_text() == rule.value());

        Ok(matched ^ rule.rule.inverted)
    }
}
