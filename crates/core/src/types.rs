//! 도메인 타입 — 스트림과 스트림 규칙
//!
//! 스트림은 규칙들의 논리곱(AND)으로 정의되는 구독입니다.
//! 메시지는 스트림의 모든 규칙이 매칭될 때 해당 스트림으로 라우팅됩니다.
//! 정의의 소유권은 카탈로그에 있으며, 엔진은 읽기 전용 스냅샷만 보유합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 스트림 — 규칙 집합으로 정의되는 논리적 구독
///
/// 규칙이 하나도 없는 스트림은 어떤 메시지와도 매칭되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// 스트림 고유 ID
    pub id: String,
    /// 스트림 제목 (운영자 표시용)
    pub title: String,
    /// 활성화 여부 — 비활성 스트림은 엔진에 인덱싱되지 않음
    pub enabled: bool,
    /// 일시정지 여부 — 정지된 스트림은 활성 상태와 무관하게 매칭 제외
    #[serde(default)]
    pub paused: bool,
    /// 스트림 규칙 목록 (AND 결합)
    #[serde(default)]
    pub rules: Vec<StreamRule>,
}

impl Stream {
    /// 규칙 없이 새 스트림을 생성합니다.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            enabled: true,
            paused: false,
            rules: Vec::new(),
        }
    }

    /// 규칙을 추가한 스트림을 반환합니다 (빌더 스타일).
    #[must_use]
    pub fn with_rule(mut self, rule: StreamRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// 이 스트림이 라우팅 대상인지 확인합니다.
    ///
    /// 활성화되어 있고, 정지되지 않았으며, 규칙이 1개 이상 있어야 합니다.
    pub fn is_routable(&self) -> bool {
        self.enabled && !self.paused && !self.rules.is_empty()
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) rules={} enabled={}",
            self.title,
            self.id,
            self.rules.len(),
            self.enabled,
        )
    }
}

/// 스트림 규칙 — 하나의 필드에 대한 단일 술어
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRule {
    /// 규칙 고유 ID
    pub id: String,
    /// 소속 스트림 ID
    pub stream_id: String,
    /// 규칙 종류
    pub kind: RuleKind,
    /// 대상 필드명
    pub field: String,
    /// 비교 값 리터럴 — Presence 규칙에서는 무시됨
    #[serde(default)]
    pub value: Option<String>,
    /// 반전 여부 — 매칭 결과를 부정
    #[serde(default)]
    pub inverted: bool,
}

impl fmt::Display for StreamRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inv = if self.inverted { "!" } else { "" };
        match &self.value {
            Some(value) => write!(f, "{}{}({}, {})", inv, self.kind, self.field, value),
            None => write!(f, "{}{}({})", inv, self.kind, self.field),
        }
    }
}

/// 규칙 종류
///
/// 평가 비용이 낮은 종류부터 순서대로 정의되어 있으며,
/// 엔진은 이 순서(Presence → Exact → Greater → Smaller → Regex)로 평가합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// 필드 존재 (문자열 형태가 비어있지 않음)
    Presence,
    /// 문자열 완전 일치
    Exact,
    /// 수치 비교: 메시지 값 > 규칙 값
    Greater,
    /// 수치 비교: 메시지 값 < 규칙 값
    Smaller,
    /// 정규식 매칭 (엔진 빌드 시 컴파일)
    Regex,
}

impl RuleKind {
    /// 평가 순서대로 나열된 모든 규칙 종류
    pub const ALL: [RuleKind; 5] = [
        RuleKind::Presence,
        RuleKind::Exact,
        RuleKind::Greater,
        RuleKind::Smaller,
        RuleKind::Regex,
    ];

    /// 이 종류의 규칙이 비교 값 리터럴을 요구하는지 여부
    pub fn requires_value(self) -> bool {
        !matches!(self, RuleKind::Presence)
    }

    /// 문자열에서 규칙 종류를 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "presence" => Some(Self::Presence),
            "exact" => Some(Self::Exact),
            "greater" => Some(Self::Greater),
            "smaller" => Some(Self::Smaller),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence => write!(f, "presence"),
            Self::Exact => write!(f, "exact"),
            Self::Greater => write!(f, "greater"),
            Self::Smaller => write!(f, "smaller"),
            Self::Regex => write!(f, "regex"),
        }
    }
}
