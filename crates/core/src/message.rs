//! 메시지 — 라우팅 파이프라인을 흐르는 단일 로그 레코드
//!
//! [`Message`]는 이름 있는 필드들의 집합이며, 필수 필드(`_id`, `message`,
//! `source`, `timestamp`)를 항상 포함합니다. 인제스트 시 생성되어 라우팅
//! 직전까지 파이프라인 단계들이 변형하고, 엔진 관점에서는 그 이후 불변입니다.
//!
//! # 예약 필드
//! 일반 setter([`Message::set_field`])는 예약 필드명을 거부합니다.
//! 예약 필드 중 일부는 전용 접근자 또는 인제스트 메타데이터 경로를 통해서만
//! 설정할 수 있습니다.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 메시지 ID 필드명
pub const FIELD_ID: &str = "_id";
/// 메시지 본문 필드명
pub const FIELD_MESSAGE: &str = "message";
/// 소스 필드명
pub const FIELD_SOURCE: &str = "source";
/// 타임스탬프 필드명 (UTC)
pub const FIELD_TIMESTAMP: &str = "timestamp";
/// 할당된 스트림 목록 필드명 — 필드 맵이 아닌 전용 슬롯에 저장됨
pub const FIELD_STREAMS: &str = "streams";

/// 일반 setter가 거부하는 예약 필드명 (닫힌 집합)
pub const RESERVED_FIELDS: &[&str] = &[
    // 다운스트림 인덱서 필드
    FIELD_ID,
    "_ttl",
    "_source",
    "_all",
    "_index",
    "_type",
    "_score",
    // logweir 예약 필드
    FIELD_MESSAGE,
    FIELD_SOURCE,
    FIELD_TIMESTAMP,
    FIELD_STREAMS,
    "lw_source_node",
    "lw_source_input",
    "lw_remote_ip",
    "lw_remote_port",
    "lw_remote_hostname",
];

/// 예약 필드 중 전용 경로로 설정 가능한 부분집합
pub const RESERVED_SETTABLE_FIELDS: &[&str] = &[
    FIELD_MESSAGE,
    FIELD_SOURCE,
    FIELD_TIMESTAMP,
    "lw_source_node",
    "lw_source_input",
    "lw_remote_ip",
    "lw_remote_port",
    "lw_remote_hostname",
];

/// 유효한 메시지에 반드시 존재해야 하는 필드
const REQUIRED_FIELDS: &[&str] = &[FIELD_ID, FIELD_MESSAGE];

/// 필드명 허용 패턴 (ASCII 한정)
static VALID_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid field name pattern"));

/// 필드 값 — 문자열, 정수, 실수 또는 타임스탬프
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// 정수 값
    Int(i64),
    /// 실수 값
    Double(f64),
    /// 타임스탬프 값 (UTC)
    Timestamp(SystemTime),
    /// 문자열 값
    Str(String),
}

impl FieldValue {
    /// 매처가 사용하는 문자열 형태를 반환합니다.
    ///
    /// 타임스탬프는 Unix epoch 초로 표현됩니다.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Str(s) => Cow::Borrowed(s.as_str()),
            Self::Int(i) => Cow::Owned(i.to_string()),
            Self::Double(d) => Cow::Owned(d.to_string()),
            Self::Timestamp(t) => Cow::Owned(unix_timestamp_str(*t)),
        }
    }

    /// Greater/Smaller 비교를 위한 수치 변환을 시도합니다.
    ///
    /// 변환 불가한 값(비수치 문자열, 타임스탬프)은 `None`을 반환하며,
    /// 매처는 이를 비매칭으로 처리합니다.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            Self::Str(s) => s.trim().parse::<f64>().ok(),
            Self::Timestamp(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<SystemTime> for FieldValue {
    fn from(value: SystemTime) -> Self {
        Self::Timestamp(value)
    }
}

/// 메시지별 기록(타이밍/카운터) 수집 전략
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStrategy {
    /// 기록하지 않음 (기본값)
    #[default]
    Never,
    /// 모든 메시지에 대해 기록
    Always,
}

impl RecordingStrategy {
    /// 이 전략에서 기록을 수집해야 하는지 여부
    pub fn should_record(self) -> bool {
        matches!(self, Self::Always)
    }

    /// 문자열에서 전략을 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "never" => Some(Self::Never),
            "always" => Some(Self::Always),
            _ => None,
        }
    }
}

/// 메시지별 기록 항목 — 디버깅/벤치마킹용 타이밍 또는 카운터
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recording {
    /// 경과 시간 기록
    Timing {
        /// 기록 이름
        name: String,
        /// 경과 시간
        elapsed: Duration,
    },
    /// 카운터 기록
    Counter {
        /// 기록 이름
        name: String,
        /// 카운터 값
        value: u64,
    },
}

impl fmt::Display for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timing { name, elapsed } => {
                write!(f, "{}: {}micros", name, elapsed.as_micros())
            }
            Self::Counter { name, value } => write!(f, "{name}: {value}"),
        }
    }
}

/// 하나의 로그 레코드
///
/// 필수 필드를 포함한 모든 필드가 내부 맵에 저장되며,
/// 할당된 스트림 ID 목록, 필터 제외 플래그, 저널 오프셋,
/// 기록 버퍼는 전용 슬롯에 보관됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// 필드 맵 (필수 필드 포함)
    fields: HashMap<String, FieldValue>,
    /// 라우팅 결과로 할당된 스트림 ID 목록
    #[serde(default)]
    stream_ids: Vec<String>,
    /// 필터 단계에서 제외 표시된 메시지
    #[serde(default)]
    filter_out: bool,
    /// 저널에서 읽힌 경우의 원본 오프셋
    #[serde(default)]
    journal_offset: Option<u64>,
    /// 타이밍/카운터 기록 버퍼 (지연 할당)
    #[serde(skip)]
    recordings: Option<Vec<Recording>>,
}

impl Message {
    /// 새 메시지를 생성합니다.
    ///
    /// UUID v4 ID가 부여되며, 필수 필드는 예약 검사를 거치지 않고
    /// 직접 삽입됩니다.
    pub fn new(
        message: impl Into<String>,
        source: impl Into<String>,
        timestamp: SystemTime,
    ) -> Self {
        let mut fields = HashMap::new();
        fields.insert(
            FIELD_ID.to_owned(),
            FieldValue::Str(uuid::Uuid::new_v4().to_string()),
        );
        fields.insert(FIELD_MESSAGE.to_owned(), FieldValue::Str(message.into()));
        fields.insert(FIELD_SOURCE.to_owned(), FieldValue::Str(source.into()));
        fields.insert(FIELD_TIMESTAMP.to_owned(), FieldValue::Timestamp(timestamp));

        Self {
            fields,
            stream_ids: Vec::new(),
            filter_out: false,
            journal_offset: None,
            recordings: None,
        }
    }

    /// 메시지 ID를 반환합니다.
    pub fn id(&self) -> &str {
        self.text_field(FIELD_ID)
    }

    /// 메시지 본문을 반환합니다.
    pub fn message_text(&self) -> &str {
        self.text_field(FIELD_MESSAGE)
    }

    /// 소스를 반환합니다.
    pub fn source(&self) -> &str {
        self.text_field(FIELD_SOURCE)
    }

    /// 소스를 설정합니다 (예약 필드 전용 접근자).
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.fields
            .insert(FIELD_SOURCE.to_owned(), FieldValue::Str(source.into()));
    }

    /// 타임스탬프를 반환합니다.
    pub fn timestamp(&self) -> Option<SystemTime> {
        match self.fields.get(FIELD_TIMESTAMP) {
            Some(FieldValue::Timestamp(t)) => Some(*t),
            _ => None,
        }
    }

    fn text_field(&self, key: &str) -> &str {
        match self.fields.get(key) {
            Some(FieldValue::Str(s)) => s.as_str(),
            _ => "",
        }
    }

    /// 필드 값을 설정합니다.
    ///
    /// 예약 필드명(전용 접근자 대상 제외), 허용 패턴을 벗어나는 키는
    /// 무시됩니다. 문자열 값은 트리밍되며 빈 문자열은 버려집니다.
    pub fn set_field(&mut self, key: &str, value: impl Into<FieldValue>) {
        let key = key.trim();

        if (RESERVED_FIELDS.contains(&key) && !RESERVED_SETTABLE_FIELDS.contains(&key))
            || !valid_key(key)
        {
            tracing::debug!(key, message_id = %self.id(), "ignoring invalid or reserved field");
            return;
        }

        match value.into() {
            FieldValue::Str(s) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    self.fields
                        .insert(key.to_owned(), FieldValue::Str(trimmed.to_owned()));
                }
            }
            other => {
                self.fields.insert(key.to_owned(), other);
            }
        }
    }

    /// 여러 필드를 한 번에 설정합니다.
    pub fn set_fields<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        for (key, value) in entries {
            self.set_field(key.as_ref(), value);
        }
    }

    /// 필드를 제거합니다. 예약 필드는 제거되지 않습니다.
    pub fn remove_field(&mut self, key: &str) {
        if !RESERVED_FIELDS.contains(&key) {
            self.fields.remove(key);
        }
    }

    /// 필드 값을 조회합니다.
    pub fn get_field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// 필드가 존재하는지 확인합니다.
    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// 전체 필드 맵을 반환합니다.
    pub fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    /// 필드명 목록을 반환합니다.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// 필드 수를 반환합니다.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// 필수 필드(`_id`, `message`)가 모두 존재하고 비어있지 않은지 확인합니다.
    pub fn is_complete(&self) -> bool {
        REQUIRED_FIELDS.iter().all(|key| {
            self.fields
                .get(*key)
                .is_some_and(|v| !v.as_text().is_empty())
        })
    }

    /// 불완전한 메시지의 누락 사유를 설명합니다.
    pub fn validation_errors(&self) -> String {
        let mut errors = Vec::new();
        for key in REQUIRED_FIELDS {
            match self.fields.get(*key) {
                None => errors.push(format!("{key} is missing")),
                Some(v) if v.as_text().is_empty() => errors.push(format!("{key} is empty")),
                Some(_) => {}
            }
        }
        errors.join(", ")
    }

    /// 라우팅 결과로 할당된 스트림 ID 목록을 설정합니다.
    pub fn set_stream_ids(&mut self, stream_ids: Vec<String>) {
        self.stream_ids = stream_ids;
    }

    /// 할당된 스트림 ID 목록을 반환합니다.
    pub fn stream_ids(&self) -> &[String] {
        &self.stream_ids
    }

    /// 필터 제외 플래그를 설정합니다.
    pub fn set_filter_out(&mut self, filter_out: bool) {
        self.filter_out = filter_out;
    }

    /// 필터 제외 여부를 반환합니다.
    pub fn filter_out(&self) -> bool {
        self.filter_out
    }

    /// 저널 오프셋을 설정합니다.
    pub fn set_journal_offset(&mut self, offset: u64) {
        self.journal_offset = Some(offset);
    }

    /// 저널 오프셋을 반환합니다. 저널을 거치지 않은 메시지는 `None`입니다.
    pub fn journal_offset(&self) -> Option<u64> {
        self.journal_offset
    }

    /// 경과 시간을 기록합니다. 전략이 허용할 때만 버퍼에 추가됩니다.
    pub fn record_timing(&mut self, strategy: RecordingStrategy, name: &str, elapsed: Duration) {
        if strategy.should_record() {
            self.recordings
                .get_or_insert_with(Vec::new)
                .push(Recording::Timing {
                    name: name.to_owned(),
                    elapsed,
                });
        }
    }

    /// 카운터를 기록합니다. 전략이 허용할 때만 버퍼에 추가됩니다.
    pub fn record_counter(&mut self, strategy: RecordingStrategy, name: &str, value: u64) {
        if strategy.should_record() {
            self.recordings
                .get_or_insert_with(Vec::new)
                .push(Recording::Counter {
                    name: name.to_owned(),
                    value,
                });
        }
    }

    /// 기록이 하나 이상 존재하는지 확인합니다.
    pub fn has_recordings(&self) -> bool {
        self.recordings.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// 기록 목록을 반환합니다.
    pub fn recordings(&self) -> &[Recording] {
        self.recordings.as_deref().unwrap_or_default()
    }

    /// 기록을 사람이 읽을 수 있는 한 줄로 요약합니다.
    pub fn recordings_as_string(&self) -> String {
        match &self.recordings {
            Some(recordings) => recordings
                .iter()
                .map(Recording::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            None => String::new(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_BODY: usize = 225;

        write!(f, "source: {} | message: ", self.source())?;

        let body = self.message_text().replace(['\n', '\t'], "");
        if body.len() > MAX_BODY {
            // 문자 경계 보존을 위해 chars 기준으로 자름
            let truncated: String = body.chars().take(MAX_BODY).collect();
            write!(f, "{truncated} (...)")?;
        } else {
            write!(f, "{body}")?;
        }

        write!(f, " {{ ")?;
        let mut first = true;
        for (key, value) in &self.fields {
            if key == FIELD_SOURCE || key == FIELD_MESSAGE {
                continue;
            }
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{}: {}", key, value.as_text())?;
            first = false;
        }
        write!(f, " }}")
    }
}

/// 필드명이 허용 패턴(`[A-Za-z0-9_.\-]+`)에 맞는지 검사합니다.
pub fn valid_key(key: &str) -> bool {
    VALID_KEY_CHARS.is_match(key)
}

/// SystemTime을 Unix epoch 초 문자열로 변환합니다.
fn unix_timestamp_str(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => duration.as_secs().to_string(),
        Err(_) => "unknown".to_owned(),
    }
}
