//! Regex 매처 -- 정규식 매칭 평가

use logweir_core::message::Message;

use super::{CompiledRule, MatchFault, RuleMatcher};

/// 엔진 빌드 시 컴파일된 정규식이 메시지 값의 문자열 형태 어디에서든
/// 매칭되면 참입니다.
///
/// 스캔 상한을 넘는 값은 평가하지 않고 [`MatchFault::OversizedValue`]를
/// 반환합니다. 정규식 엔진 자체는 선형 시간이므로 런타임 에러가 없습니다.
pub struct RegexMatcher;

impl RuleMatcher for RegexMatcher {
    fn matches(&self, message: &Message, rule: &CompiledRule) -> Result<bool, MatchFault> {
        let Some(regex) = &rule.regex else {
            return Ok(false);
        };

        let matched = match message.get_field(&rule.rule.field) {
            Some(value) => {
                let text = value.as_text();
                if text.len() > rule.max_value_scan_bytes {
                    return Err(MatchFault::OversizedValue {
                        len: text.len(),
                        max: rule.max_value_scan_bytes,
                    });
                }
                regex.is_match(&text)
            }
            None => false,
        };

        Ok(matched ^ rule.rule.inverted)
    }
}
