//! 컴파일드 엔진 -- 필드명/규칙 종류로 인덱싱된 불변 매칭 구조
//!
//! [`CompiledEngine`]은 카탈로그 스냅샷의 모든 라우팅 대상 스트림 규칙을
//! 규칙 종류별로, 그 안에서 필드명별로 인덱싱한 불변 값입니다. 한 번
//! 발행되면 절대 변형되지 않으며, 교체는 라우터의 원자적 포인터 스왑으로만
//! 이루어집니다.
//!
//! # 평가 전략
//! 규칙 종류는 비용이 낮은 순서(Presence → Exact → Greater → Smaller →
//! Regex)로 평가됩니다. Presence는 반전 규칙이 부재를 단언할 수 있으므로
//! 인덱스의 모든 필드를 평가하고, 나머지 종류는 메시지 필드와 인덱스
//! 필드의 교집합만 평가하여 불필요한 스캔을 피합니다.
//!
//! # 실패 봉쇄
//! 빌드는 실패하지 않습니다. 컴파일 불가능한 규칙을 가진 스트림은 규칙
//! 수를 완화하는 대신 엔진에서 통째로 제외됩니다(fail-closed). 제외는
//! 경고 로그와 메트릭으로 드러납니다.

use std::collections::{HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use metrics::counter;

use logweir_core::message::Message;
use logweir_core::metrics::ROUTER_ENGINE_STREAMS_EXCLUDED_TOTAL;
use logweir_core::types::{RuleKind, Stream, StreamRule};

use crate::harness::EvalHarness;
use crate::matcher::{CompileLimits, CompiledRule, MatchFault, matcher_for};

/// 종류 하나의 규칙 인덱스: 필드명 → 규칙, 그리고 필드명 집합
#[derive(Default)]
struct KindIndex {
    /// 필드명 → 이 필드에 선언된 규칙들의 인덱스
    by_field: HashMap<String, Vec<usize>>,
    /// 이 종류가 사용하는 필드명 집합
    fields: HashSet<String>,
}

impl KindIndex {
    fn insert(&mut self, field: &str, rule_idx: usize) {
        self.fields.insert(field.to_owned());
        self.by_field.entry(field.to_owned()).or_default().push(rule_idx);
    }
}

/// 스트림 인덱스가 붙은 컴파일된 규칙
struct IndexedRule {
    /// 소속 스트림의 스냅샷 내 위치
    stream_idx: usize,
    /// 컴파일된 규칙
    compiled: CompiledRule,
}

/// 스트림 하나에 귀속된 평가 장애
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFault {
    /// 장애가 발생한 스트림 ID
    pub stream_id: String,
    /// 장애 내용
    pub fault: MatchFault,
}

/// 단일 매칭 패스의 결과
///
/// 엔진은 부수 효과를 일으키지 않습니다. 메트릭 기록과 장애 등록은
/// 이 결과를 받은 라우터의 몫입니다.
#[derive(Debug, Default)]
pub struct EngineMatch {
    /// 모든 규칙이 매칭된 스트림 (스냅샷 순서)
    pub matches: Vec<Arc<Stream>>,
    /// 평가 중 발생한 장애
    pub faults: Vec<StreamFault>,
    /// 이 엔진이 평가 대상으로 삼은 스트림 수
    pub streams_evaluated: usize,
    /// 스트림별 실제 평가된 규칙 수 (평가된 스트림만)
    pub rules_evaluated: Vec<(String, u64)>,
}

/// 진단용 스트림 단위 매칭 결과
#[derive(Debug)]
pub struct StreamTestMatch {
    /// 대상 스트림
    pub stream: Arc<Stream>,
    /// 전체 규칙 매칭 여부
    pub matched: bool,
    /// 규칙별 결과
    pub rules: Vec<RuleTestResult>,
}

/// 진단용 규칙 단위 결과
#[derive(Debug)]
pub struct RuleTestResult {
    /// 대상 규칙
    pub rule: StreamRule,
    /// 매칭 여부 (장애는 비매칭으로 보고)
    pub matched: bool,
}

/// 컴파일드 엔진
pub struct CompiledEngine {
    /// 스냅샷 순서의 라우팅 대상 스트림
    streams: Vec<Arc<Stream>>,
    /// 스트림별 요구 매칭 수 (= 규칙 수)
    required: Vec<usize>,
    /// 모든 컴파일된 규칙
    rules: Vec<IndexedRule>,
    presence: KindIndex,
    exact: KindIndex,
    greater: KindIndex,
    smaller: KindIndex,
    regex: KindIndex,
    /// 카탈로그 스냅샷 내용 지문
    fingerprint: u64,
}

impl CompiledEngine {
    /// 빈 엔진을 생성합니다. 첫 리빌드 전의 초기 상태로 사용됩니다.
    pub fn empty() -> Self {
        Self::build(Vec::new(), &CompileLimits::default())
    }

    /// 카탈로그 스냅샷에서 엔진을 빌드합니다.
    ///
    /// 빌드는 실패하지 않습니다. 비활성/정지/규칙 없는 스트림은
    /// 인덱싱되지 않고, 컴파일 불가능한 규칙을 가진 스트림은 경고와
    /// 함께 통째로 제외됩니다.
    pub fn build(snapshot: Vec<Stream>, limits: &CompileLimits) -> Self {
        let fingerprint = fingerprint_of(&snapshot);

        let mut engine = Self {
            streams: Vec::new(),
            required: Vec::new(),
            rules: Vec::new(),
            presence: KindIndex::default(),
            exact: KindIndex::default(),
            greater: KindIndex::default(),
            smaller: KindIndex::default(),
            regex: KindIndex::default(),
            fingerprint,
        };

        for stream in snapshot {
            if !stream.is_routable() {
                continue;
            }

            let mut compiled_rules = Vec::with_capacity(stream.rules.len());
            let mut invalid = false;

            for rule in &stream.rules {
                match CompiledRule::compile(rule.clone(), limits) {
                    Ok(compiled) => compiled_rules.push(compiled),
                    Err(e) => {
                        tracing::warn!(
                            stream_id = %stream.id,
                            rule_id = %rule.id,
                            error = %e,
                            "invalid rule, excluding stream from engine"
                        );
                        invalid = true;
                        break;
                    }
                }
            }

            if invalid {
                counter!(ROUTER_ENGINE_STREAMS_EXCLUDED_TOTAL).increment(1);
                continue;
            }

            let stream_idx = engine.streams.len();
            engine.required.push(compiled_rules.len());

            for compiled in compiled_rules {
                let rule_idx = engine.rules.len();
                let index = engine.kind_index_mut(compiled.rule.kind);
                index.insert(&compiled.rule.field, rule_idx);
                engine.rules.push(IndexedRule {
                    stream_idx,
                    compiled,
                });
            }

            engine.streams.push(Arc::new(stream));
        }

        engine
    }

    fn kind_index_mut(&mut self, kind: RuleKind) -> &mut KindIndex {
        match kind {
            RuleKind::Presence => &mut self.presence,
            RuleKind::Exact => &mut self.exact,
            RuleKind::Greater => &mut self.greater,
            RuleKind::Smaller => &mut self.smaller,
            RuleKind::Regex => &mut self.regex,
        }
    }

    fn kind_index(&self, kind: RuleKind) -> &KindIndex {
        match kind {
            RuleKind::Presence => &self.presence,
            RuleKind::Exact => &self.exact,
            RuleKind::Greater => &self.greater,
            RuleKind::Smaller => &self.smaller,
            RuleKind::Regex => &self.regex,
        }
    }

    /// 메시지를 모든 스트림과 단일 패스로 대조합니다.
    ///
    /// 스트림의 누적 매칭 수가 요구 매칭 수와 같으면 해당 스트림이
    /// 결과에 포함됩니다. 결과 순서는 스냅샷 순서를 따르며 중복은
    /// 발생하지 않습니다.
    pub fn match_message(&self, message: &Message, harness: &EvalHarness) -> EngineMatch {
        let mut tallies = vec![0usize; self.streams.len()];
        let mut evaluated = vec![0u64; self.streams.len()];
        let mut faults = Vec::new();

        // Presence: 반전 규칙이 부재를 단언할 수 있으므로 인덱스의
        // 모든 필드를 평가
        for field in &self.presence.fields {
            if let Some(rule_indices) = self.presence.by_field.get(field) {
                for &rule_idx in rule_indices {
                    self.evaluate_rule(
                        rule_idx, message, harness, &mut tallies, &mut evaluated, &mut faults,
                    );
                }
            }
        }

        // 나머지 종류: 메시지 필드와 인덱스 필드의 교집합만 평가
        for kind in [
            RuleKind::Exact,
            RuleKind::Greater,
            RuleKind::Smaller,
            RuleKind::Regex,
        ] {
            let index = self.kind_index(kind);
            if index.fields.is_empty() {
                continue;
            }

            for field in message.field_names() {
                if let Some(rule_indices) = index.by_field.get(field) {
                    for &rule_idx in rule_indices {
                        self.evaluate_rule(
                            rule_idx, message, harness, &mut tallies, &mut evaluated, &mut faults,
                        );
                    }
                }
            }
        }

        let matches = self
            .streams
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.required[*idx] > 0 && tallies[*idx] == self.required[*idx])
            .map(|(_, stream)| Arc::clone(stream))
            .collect();

        let rules_evaluated = self
            .streams
            .iter()
            .zip(&evaluated)
            .filter(|(_, count)| **count > 0)
            .map(|(stream, count)| (stream.id.clone(), *count))
            .collect();

        EngineMatch {
            matches,
            faults,
            streams_evaluated: self.streams.len(),
            rules_evaluated,
        }
    }

    fn evaluate_rule(
        &self,
        rule_idx: usize,
        message: &Message,
        harness: &EvalHarness,
        tallies: &mut [usize],
        evaluated: &mut [u64],
        faults: &mut Vec<StreamFault>,
    ) {
        let indexed = &self.rules[rule_idx];
        evaluated[indexed.stream_idx] += 1;

        let matcher = matcher_for(indexed.compiled.rule.kind);
        match harness.evaluate(matcher, message, &indexed.compiled) {
            Ok(true) => tallies[indexed.stream_idx] += 1,
            Ok(false) => {}
            Err(fault) => faults.push(StreamFault {
                stream_id: self.streams[indexed.stream_idx].id.clone(),
                fault,
            }),
        }
    }

    /// 진단용 매칭: 스트림마다 규칙별 결과를 반환합니다.
    ///
    /// 단축 경로 없이 모든 인덱싱된 스트림의 모든 규칙을 평가합니다.
    /// 장애는 비매칭으로 보고됩니다.
    pub fn test_match(&self, message: &Message) -> Vec<StreamTestMatch> {
        let mut per_stream: Vec<Vec<&CompiledRule>> = vec![Vec::new(); self.streams.len()];
        for indexed in &self.rules {
            per_stream[indexed.stream_idx].push(&indexed.compiled);
        }

        self.streams
            .iter()
            .zip(per_stream)
            .map(|(stream, compiled_rules)| {
                let rules: Vec<RuleTestResult> = compiled_rules
                    .into_iter()
                    .map(|compiled| {
                        let matcher = matcher_for(compiled.rule.kind);
                        let matched = matcher.matches(message, compiled).unwrap_or(false);
                        RuleTestResult {
                            rule: compiled.rule.clone(),
                            matched,
                        }
                    })
                    .collect();

                let matched = !rules.is_empty() && rules.iter().all(|r| r.matched);
                StreamTestMatch {
                    stream: Arc::clone(stream),
                    matched,
                    rules,
                }
            })
            .collect()
    }

    /// 카탈로그 스냅샷 내용 지문을 반환합니다.
    ///
    /// 업데이터는 지문이 같으면 스왑을 생략합니다. 비교는 항상 같은
    /// 프로세스에서 빌드된 엔진 간에 이루어집니다.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// 인덱싱된 스트림 수를 반환합니다.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// 인덱싱된 규칙 수를 반환합니다.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// 인덱싱된 스트림이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// 스냅샷 내용 지문을 계산합니다.
///
/// 정렬된 `(stream_id, paused, rule_id, kind, field, value, inverted)`
/// 튜플 위의 안정 해시입니다.
fn fingerprint_of(snapshot: &[Stream]) -> u64 {
    let mut stream_entries: Vec<(&str, bool, Vec<(&str, RuleKind, &str, Option<&str>, bool)>)> =
        snapshot
            .iter()
            .map(|stream| {
                let mut rules: Vec<_> = stream
                    .rules
                    .iter()
                    .map(|r| {
                        (
                            r.id.as_str(),
                            r.kind,
                            r.field.as_str(),
                            r.value.as_deref(),
                            r.inverted,
                        )
                    })
                    .collect();
                rules.sort();
                (stream.id.as_str(), stream.paused, rules)
            })
            .collect();
    stream_entries.sort();

    let mut hasher = DefaultHasher::new();
    for (stream_id, paused, rules) in stream_entries {
        stream_id.hash(&mut hasher);
        paused.hash(&mut hasher);
        for (rule_id, kind, field, value, inverted) in rules {
            rule_id.hash(&mut hasher);
            (kind as u8).hash(&mut hasher);
            field.hash(&mut hasher);
            value.hash(&mut hasher);
            inverted.hash(&mut hasher);
        }
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn harness() -> EvalHarness {
        EvalHarness::new(Duration::from_secs(2))
    }

    fn rule(
        stream_id: &str,
        rule_id: &str,
        kind: RuleKind,
        field: &str,
        value: Option<&str>,
    ) -> StreamRule {
        StreamRule {
            id: rule_id.to_owned(),
            stream_id: stream_id.to_owned(),
            kind,
            field: field.to_owned(),
            value: value.map(str::to_owned),
            inverted: false,
        }
    }

    fn stream(id: &str, rules: Vec<StreamRule>) -> Stream {
        Stream {
            id: id.to_owned(),
            title: format!("Stream {id}"),
            enabled: true,
            paused: false,
            rules,
        }
    }

    fn message(fields: &[(&str, &str)]) -> Message {
        let mut msg = Message::new("x", "h", SystemTime::now());
        for (key, value) in fields {
            msg.set_field(key, *value);
        }
        msg
    }

    fn build(streams: Vec<Stream>) -> CompiledEngine {
        CompiledEngine::build(streams, &CompileLimits::default())
    }

    fn matched_ids(engine: &CompiledEngine, msg: &Message) -> Vec<String> {
        engine
            .match_message(msg, &harness())
            .matches
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    // === 시드 시나리오 ===

    #[test]
    fn presence_rule_routes_only_when_field_present() {
        let engine = build(vec![stream(
            "t",
            vec![rule("t", "r1", RuleKind::Presence, "testfield", None)],
        )]);

        assert!(matched_ids(&engine, &message(&[])).is_empty());
        assert_eq!(matched_ids(&engine, &message(&[("testfield", "v")])), ["t"]);
    }

    #[test]
    fn exact_rule_requires_identical_value() {
        let engine = build(vec![stream(
            "t",
            vec![rule("t", "r1", RuleKind::Exact, "testfield", Some("testvalue"))],
        )]);

        assert!(matched_ids(&engine, &message(&[("testfield", "no-testvalue")])).is_empty());
        assert_eq!(
            matched_ids(&engine, &message(&[("testfield", "testvalue")])),
            ["t"]
        );
    }

    #[test]
    fn greater_rule_compares_numerically() {
        let engine = build(vec![stream(
            "t",
            vec![rule("t", "r1", RuleKind::Greater, "testfield", Some("1"))],
        )]);

        assert!(matched_ids(&engine, &message(&[("testfield", "1")])).is_empty());
        assert_eq!(matched_ids(&engine, &message(&[("testfield", "2")])), ["t"]);
        assert!(matched_ids(&engine, &message(&[("testfield", "abc")])).is_empty());
    }

    #[test]
    fn smaller_rule_compares_numerically() {
        let engine = build(vec![stream(
            "t",
            vec![rule("t", "r1", RuleKind::Smaller, "testfield", Some("5"))],
        )]);

        assert!(matched_ids(&engine, &message(&[("testfield", "5")])).is_empty());
        assert_eq!(matched_ids(&engine, &message(&[("testfield", "2")])), ["t"]);
    }

    #[test]
    fn regex_rule_matches_anywhere() {
        let engine = build(vec![stream(
            "t",
            vec![rule("t", "r1", RuleKind::Regex, "testfield", Some("^test"))],
        )]);

        assert!(matched_ids(&engine, &message(&[("testfield", "notestvalue")])).is_empty());
        assert_eq!(
            matched_ids(&engine, &message(&[("testfield", "testvalue")])),
            ["t"]
        );
    }

    #[test]
    fn multi_rule_conjunction_and_multi_stream_disjunction() {
        let s1 = stream(
            "s1",
            vec![
                rule("s1", "r1", RuleKind::Presence, "f1", None),
                rule("s1", "r2", RuleKind::Regex, "f2", Some("^test")),
            ],
        );
        let s2 = stream("s2", vec![rule("s2", "r3", RuleKind::Exact, "f3", Some("v3"))]);
        let engine = build(vec![s1, s2]);

        assert!(matched_ids(&engine, &message(&[])).is_empty());
        // regex 실패: 논리곱 미충족
        assert!(matched_ids(&engine, &message(&[("f1", "x"), ("f2", "xv")])).is_empty());
        assert_eq!(
            matched_ids(&engine, &message(&[("f1", "x"), ("f2", "testx")])),
            ["s1"]
        );

        let both = matched_ids(
            &engine,
            &message(&[("f1", "x"), ("f2", "testx"), ("f3", "v3")]),
        );
        let both_set: HashSet<_> = both.iter().map(String::as_str).collect();
        assert_eq!(both_set, HashSet::from(["s1", "s2"]));

        assert_eq!(matched_ids(&engine, &message(&[("f3", "v3")])), ["s2"]);
    }

    // === 빌드 동작 ===

    #[test]
    fn empty_engine_matches_nothing() {
        let engine = CompiledEngine::empty();
        assert!(engine.is_empty());
        assert_eq!(engine.rule_count(), 0);
        assert!(matched_ids(&engine, &message(&[("any", "v")])).is_empty());
    }

    #[test]
    fn zero_rule_stream_is_not_indexed() {
        let engine = build(vec![stream("empty", vec![])]);
        assert!(engine.is_empty());
        assert!(matched_ids(&engine, &message(&[("f", "v")])).is_empty());
    }

    #[test]
    fn disabled_stream_is_not_indexed() {
        let mut s = stream("s1", vec![rule("s1", "r1", RuleKind::Presence, "f", None)]);
        s.enabled = false;
        let engine = build(vec![s]);
        assert!(engine.is_empty());
    }

    #[test]
    fn paused_stream_is_not_indexed() {
        let mut s = stream("s1", vec![rule("s1", "r1", RuleKind::Presence, "f", None)]);
        s.paused = true;
        let engine = build(vec![s]);
        assert!(engine.is_empty());
    }

    #[test]
    fn invalid_regex_excludes_whole_stream() {
        // fail-closed: 남은 규칙으로 논리곱을 완화하지 않고 스트림 제외
        let s = stream(
            "s1",
            vec![
                rule("s1", "r1", RuleKind::Presence, "f1", None),
                rule("s1", "r2", RuleKind::Regex, "f2", Some("[unclosed")),
            ],
        );
        let healthy = stream("s2", vec![rule("s2", "r3", RuleKind::Exact, "f1", Some("v"))]);
        let engine = build(vec![s, healthy]);

        assert_eq!(engine.stream_count(), 1);
        // 남은 presence 규칙만으로는 절대 매칭되지 않아야 함
        assert_eq!(matched_ids(&engine, &message(&[("f1", "v")])), ["s2"]);
    }

    #[test]
    fn missing_value_excludes_whole_stream() {
        let s = stream("s1", vec![rule("s1", "r1", RuleKind::Exact, "f1", None)]);
        let engine = build(vec![s]);
        assert!(engine.is_empty());
    }

    // === 평가 법칙 ===

    #[test]
    fn field_index_fidelity_skips_absent_fields() {
        let engine = build(vec![stream(
            "s1",
            vec![rule("s1", "r1", RuleKind::Exact, "rare_field", Some("v"))],
        )]);

        let outcome = engine.match_message(&message(&[("other", "v")]), &harness());
        // rare_field가 없는 메시지에서는 규칙이 평가조차 되지 않음
        assert!(outcome.rules_evaluated.is_empty());
        assert!(outcome.matches.is_empty());
    }

    #[test]
    fn inverted_presence_asserts_absence_without_message_field() {
        let mut absence_rule = rule("s1", "r1", RuleKind::Presence, "forbidden", None);
        absence_rule.inverted = true;
        let engine = build(vec![stream("s1", vec![absence_rule])]);

        // 메시지에 필드가 없어도 presence 인덱스는 항상 평가됨
        assert_eq!(matched_ids(&engine, &message(&[])), ["s1"]);
        assert!(matched_ids(&engine, &message(&[("forbidden", "v")])).is_empty());
    }

    #[test]
    fn result_order_follows_snapshot_order() {
        let streams: Vec<Stream> = ["s3", "s1", "s2"]
            .iter()
            .map(|id| stream(id, vec![rule(id, "r", RuleKind::Presence, "f", None)]))
            .collect();
        let engine = build(streams);

        let ids = matched_ids(&engine, &message(&[("f", "v")]));
        assert_eq!(ids, ["s3", "s1", "s2"]);
    }

    #[test]
    fn duplicate_matches_are_impossible() {
        // 같은 필드에 여러 규칙이 있어도 스트림은 한 번만 결과에 포함
        let engine = build(vec![stream(
            "s1",
            vec![
                rule("s1", "r1", RuleKind::Presence, "f", None),
                rule("s1", "r2", RuleKind::Regex, "f", Some(".")),
            ],
        )]);

        assert_eq!(matched_ids(&engine, &message(&[("f", "v")])), ["s1"]);
    }

    #[test]
    fn match_is_deterministic_for_identical_messages() {
        let engine = build(vec![
            stream("s1", vec![rule("s1", "r1", RuleKind::Presence, "f1", None)]),
            stream("s2", vec![rule("s2", "r2", RuleKind::Exact, "f2", Some("v"))]),
        ]);
        let msg = message(&[("f1", "x"), ("f2", "v")]);

        let first = matched_ids(&engine, &msg);
        for _ in 0..10 {
            assert_eq!(matched_ids(&engine, &msg), first);
        }
    }

    #[test]
    fn rules_evaluated_counts_by_stream() {
        let engine = build(vec![stream(
            "s1",
            vec![
                rule("s1", "r1", RuleKind::Presence, "f1", None),
                rule("s1", "r2", RuleKind::Exact, "f2", Some("v")),
            ],
        )]);

        let outcome = engine.match_message(&message(&[("f1", "a"), ("f2", "v")]), &harness());
        assert_eq!(outcome.streams_evaluated, 1);
        assert_eq!(outcome.rules_evaluated, [("s1".to_owned(), 2)]);
    }

    #[test]
    fn mandatory_message_fields_participate_in_matching() {
        let engine = build(vec![stream(
            "s1",
            vec![rule("s1", "r1", RuleKind::Exact, "source", Some("web-01"))],
        )]);

        let msg = Message::new("body", "web-01", SystemTime::now());
        assert_eq!(matched_ids(&engine, &msg), ["s1"]);
    }

    // === test_match 진단 ===

    #[test]
    fn test_match_reports_per_rule_outcomes() {
        let engine = build(vec![stream(
            "s1",
            vec![
                rule("s1", "r1", RuleKind::Presence, "f1", None),
                rule("s1", "r2", RuleKind::Regex, "f2", Some("^test")),
            ],
        )]);

        let results = engine.test_match(&message(&[("f1", "x"), ("f2", "nope")]));
        assert_eq!(results.len(), 1);

        let result = &results[0];
        assert!(!result.matched);
        assert_eq!(result.rules.len(), 2);

        let presence = result.rules.iter().find(|r| r.rule.id == "r1").unwrap();
        let regex = result.rules.iter().find(|r| r.rule.id == "r2").unwrap();
        assert!(presence.matched);
        assert!(!regex.matched);
    }

    #[test]
    fn test_match_covers_streams_the_fast_path_skips() {
        let engine = build(vec![stream(
            "s1",
            vec![rule("s1", "r1", RuleKind::Exact, "absent", Some("v"))],
        )]);

        let results = engine.test_match(&message(&[]));
        assert_eq!(results.len(), 1);
        assert!(!results[0].matched);
        assert!(!results[0].rules[0].matched);
    }

    // === 지문 ===

    #[test]
    fn fingerprint_is_stable_for_identical_snapshots() {
        let make = || {
            vec![
                stream("s1", vec![rule("s1", "r1", RuleKind::Presence, "f", None)]),
                stream("s2", vec![rule("s2", "r2", RuleKind::Exact, "g", Some("v"))]),
            ]
        };
        assert_eq!(build(make()).fingerprint(), build(make()).fingerprint());
    }

    #[test]
    fn fingerprint_ignores_snapshot_ordering() {
        let a = vec![
            stream("s1", vec![rule("s1", "r1", RuleKind::Presence, "f", None)]),
            stream("s2", vec![rule("s2", "r2", RuleKind::Exact, "g", Some("v"))]),
        ];
        let b = vec![
            stream("s2", vec![rule("s2", "r2", RuleKind::Exact, "g", Some("v"))]),
            stream("s1", vec![rule("s1", "r1", RuleKind::Presence, "f", None)]),
        ];
        assert_eq!(build(a).fingerprint(), build(b).fingerprint());
    }

    #[test]
    fn fingerprint_changes_when_rule_changes() {
        let a = build(vec![stream(
            "s1",
            vec![rule("s1", "r1", RuleKind::Exact, "f", Some("v1"))],
        )]);
        let b = build(vec![stream(
            "s1",
            vec![rule("s1", "r1", RuleKind::Exact, "f", Some("v2"))],
        )]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_when_inversion_flips() {
        let mut inverted = rule("s1", "r1", RuleKind::Presence, "f", None);
        inverted.inverted = true;
        let a = build(vec![stream(
            "s1",
            vec![rule("s1", "r1", RuleKind::Presence, "f", None)],
        )]);
        let b = build(vec![stream("s1", vec![inverted])]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_when_pause_toggles() {
        let a = vec![stream("s1", vec![rule("s1", "r1", RuleKind::Presence, "f", None)])];
        let mut paused = a.clone();
        paused[0].paused = true;
        assert_ne!(build(a).fingerprint(), build(paused).fingerprint());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// 같은 메시지에 대한 라우팅은 결정적이다
            #[test]
            fn routing_is_deterministic(
                fields in proptest::collection::vec(("[a-z]{1,6}", "[a-z0-9]{0,8}"), 0..6),
            ) {
                let engine = CompiledEngine::build(
                    vec![
                        Stream {
                            id: "s1".to_owned(),
                            title: "S1".to_owned(),
                            enabled: true,
                            paused: false,
                            rules: vec![StreamRule {
                                id: "r1".to_owned(),
                                stream_id: "s1".to_owned(),
                                kind: RuleKind::Presence,
                                field: "alpha".to_owned(),
                                value: None,
                                inverted: false,
                            }],
                        },
                    ],
                    &CompileLimits::default(),
                );

                let mut msg = Message::new("m", "s", SystemTime::now());
                for (key, value) in &fields {
                    msg.set_field(key, value.as_str());
                }

                let harness = EvalHarness::new(Duration::from_secs(2));
                let first: Vec<String> = engine
                    .match_message(&msg, &harness)
                    .matches.iter().map(|s| s.id.clone()).collect();
                let second: Vec<String> = engine
                    .match_message(&msg, &harness)
                    .matches.iter().map(|s| s.id.clone()).collect();
                prop_assert_eq!(first, second);
            }
        }
    }
}
