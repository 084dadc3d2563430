//! Smaller 매처 -- 수치 비교 (메시지 값 < 규칙 값)

use logweir_core::message::Message;

use super::{CompiledRule, MatchFault, RuleMatcher};

/// [`GreaterMatcher`](super::GreaterMatcher)와 대칭인 비교 매처입니다.
pub struct SmallerMatcher;

impl RuleMatcher for SmallerMatcher {
    fn matches(&self, message: &Message, rule: &CompiledRule) -> Result<bool, MatchFault> {
        let Some(bound) = rule.bound else {
            return Ok(false);
        };
        let Some(value) = message.get_field(&rule.rule.field).and_then(|v| v.as_f64()) else {
            return Ok(false);
        };

        Ok((value < bound) ^ rule.rule.inverted)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use logweir_core::types::RuleKind;

    #[test]
    fn smaller_value_matches() {
        let rule = compile(RuleKind::Smaller, "testfield", Some("5"));
        let msg = make_message(&[("testfield", "2")]);
        assert_eq!(SmallerMatcher.matches(&msg, &rule), Ok(true));
    }

    #[test]
    fn equal_value_does_not_match() {
        let rule = compile(RuleKind::Smaller, "testfield", Some("5"));
        let msg = make_message(&[("testfield", "5")]);
        assert_eq!(SmallerMatcher.matches(&msg, &rule), Ok(false));
    }

    #[test]
    fn non_numeric_message_value_does_not_match() {
        let rule = compile(RuleKind::Smaller, "testfield", Some("5"));
        let msg = make_message(&[("testfield", "five")]);
        assert_eq!(SmallerMatcher.matches(&msg, &rule), Ok(false));
    }

    #[test]
    fn negative_bound_comparison() {
        let rule = compile(RuleKind::Smaller, "offset", Some("-1"));
        let msg = make_message(&[("offset", "-3")]);
        assert_eq!(SmallerMatcher.matches(&msg, &rule), Ok(true));
    }

    #[test]
    fn inverted_negates_after_parse_check() {
        let rule = compile_inverted(RuleKind::Smaller, "testfield", Some("5"));

        let big = make_message(&[("testfield", "9")]);
        assert_eq!(SmallerMatcher.matches(&big, &rule), Ok(true));

        let small = make_message(&[("testfield", "1")]);
        assert_eq!(SmallerMatcher.matches(&small, &rule), Ok(false));

        let garbage = make_message(&[("testfield", "xyz")]);
        assert_eq!(SmallerMatcher.matches(&garbage, &rule), Ok(false));
    }
}
