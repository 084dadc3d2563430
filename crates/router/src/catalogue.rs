//! 스트림 카탈로그 구현 -- 인메모리 및 YAML 디렉토리
//!
//! 카탈로그는 스트림/규칙 정의의 소유자입니다. 엔진 업데이터는 리빌드
//! 시마다 [`StreamCatalogue`] trait을 통해 스냅샷을 읽어갑니다.
//!
//! - [`MemoryCatalogue`]: 테스트와 임베딩용 인메모리 구현
//! - [`YamlCatalogue`]: 디렉토리 내 `.yml`/`.yaml` 파일에서 스트림 정의를
//!   로드하는 구현. 개별 파일 파싱 실패는 경고 로그를 남기고 건너뜁니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use logweir_core::error::CatalogueError;
use logweir_core::pipeline::{BoxFuture, StreamCatalogue};
use logweir_core::types::{RuleKind, Stream, StreamRule};

/// 스트림 정의 파일 크기 상한
const MAX_STREAM_FILE_SIZE: u64 = 1024 * 1024; // 1MB
/// 카탈로그가 허용하는 최대 스트림 수
const MAX_STREAM_COUNT: usize = 10_000;

// ─── 인메모리 카탈로그 ──────────────────────────────────────────────

/// 인메모리 스트림 카탈로그
///
/// 테스트, 임베딩, 외부 저장소 어댑터의 캐시 레이어로 사용됩니다.
#[derive(Default)]
pub struct MemoryCatalogue {
    /// 스트림 ID → 스트림 (규칙 포함)
    streams: Mutex<Vec<Stream>>,
}

impl MemoryCatalogue {
    /// 빈 카탈로그를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 스트림 목록으로 카탈로그를 생성합니다.
    pub fn with_streams(streams: Vec<Stream>) -> Self {
        Self {
            streams: Mutex::new(streams),
        }
    }

    /// 스트림을 추가하거나 같은 ID의 기존 정의를 교체합니다.
    pub fn upsert(&self, stream: Stream) {
        let mut streams = self.streams.lock().expect("catalogue lock poisoned");
        match streams.iter_mut().find(|s| s.id == stream.id) {
            Some(existing) => *existing = stream,
            None => streams.push(stream),
        }
    }

    /// 스트림을 제거합니다.
    pub fn remove(&self, stream_id: &str) {
        self.streams
            .lock()
            .expect("catalogue lock poisoned")
            .retain(|s| s.id != stream_id);
    }

    /// 현재 스트림 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.streams.lock().expect("catalogue lock poisoned").len()
    }

    /// 카탈로그가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StreamCatalogue for MemoryCatalogue {
    fn load_enabled_streams(&self) -> BoxFuture<'_, Result<Vec<Stream>, CatalogueError>> {
        Box::pin(async {
            let streams = self.streams.lock().expect("catalogue lock poisoned");
            Ok(streams
                .iter()
                .filter(|s| s.enabled)
                .map(|s| {
                    let mut stream = s.clone();
                    // 규칙은 load_rules로 별도 제공
                    stream.rules = Vec::new();
                    stream
                })
                .collect())
        })
    }

    fn load_rules(
        &self,
        stream_id: &str,
    ) -> BoxFuture<'_, Result<Vec<StreamRule>, CatalogueError>> {
        let stream_id = stream_id.to_owned();
        Box::pin(async move {
            let streams = self.streams.lock().expect("catalogue lock poisoned");
            streams
                .iter()
                .find(|s| s.id == stream_id)
                .map(|s| s.rules.clone())
                .ok_or(CatalogueError::StreamNotFound { stream_id })
        })
    }

    fn load_snapshot(&self) -> BoxFuture<'_, Result<Vec<Stream>, CatalogueError>> {
        // 잠금 한 번으로 규칙까지 포함한 스냅샷 제공
        Box::pin(async {
            let streams = self.streams.lock().expect("catalogue lock poisoned");
            Ok(streams.iter().filter(|s| s.enabled).cloned().collect())
        })
    }
}

// ─── YAML 디렉토리 카탈로그 ─────────────────────────────────────────

/// YAML 파일 내 스트림 정의
///
/// 파일 하나가 스트림 하나에 대응합니다.
///
/// # YAML 스키마
/// ```yaml
/// id: ssh-logins
/// title: SSH logins
/// enabled: true
/// rules:
///   - kind: exact
///     field: source
///     value: sshd
///   - kind: regex
///     field: message
///     value: "^Accepted"
///     inverted: false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFile {
    /// 스트림 고유 ID
    pub id: String,
    /// 스트림 제목
    pub title: String,
    /// 활성화 여부
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 일시정지 여부
    #[serde(default)]
    pub paused: bool,
    /// 규칙 목록
    #[serde(default)]
    pub rules: Vec<RuleFile>,
}

fn default_enabled() -> bool {
    true
}

/// YAML 파일 내 규칙 정의
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFile {
    /// 규칙 ID — 생략 시 `<stream_id>-<순번>`이 부여됨
    #[serde(default)]
    pub id: Option<String>,
    /// 규칙 종류
    pub kind: RuleKind,
    /// 대상 필드명
    pub field: String,
    /// 비교 값 리터럴
    #[serde(default)]
    pub value: Option<String>,
    /// 반전 여부
    #[serde(default)]
    pub inverted: bool,
}

impl StreamFile {
    /// 정의의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CatalogueError> {
        if self.id.is_empty() {
            return Err(CatalogueError::InvalidDefinition {
                stream_id: "(empty)".to_owned(),
                reason: "stream id must not be empty".to_owned(),
            });
        }

        if self.id.len() > 256 {
            return Err(CatalogueError::InvalidDefinition {
                stream_id: self.id.clone(),
                reason: "stream id must not exceed 256 characters".to_owned(),
            });
        }

        if self.title.is_empty() {
            return Err(CatalogueError::InvalidDefinition {
                stream_id: self.id.clone(),
                reason: "stream title must not be empty".to_owned(),
            });
        }

        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.field.is_empty() {
                return Err(CatalogueError::InvalidDefinition {
                    stream_id: self.id.clone(),
                    reason: format!("rule[{idx}] field must not be empty"),
                });
            }
            if rule.kind.requires_value()
                && rule.value.as_deref().map(str::trim).unwrap_or_default().is_empty()
            {
                return Err(CatalogueError::InvalidDefinition {
                    stream_id: self.id.clone(),
                    reason: format!("rule[{idx}] ({}) requires a value literal", rule.kind),
                });
            }
        }

        Ok(())
    }

    /// 도메인 타입으로 변환합니다.
    pub fn into_stream(self) -> Stream {
        let stream_id = self.id.clone();
        let rules = self
            .rules
            .into_iter()
            .enumerate()
            .map(|(idx, rule)| StreamRule {
                id: rule.id.unwrap_or_else(|| format!("{stream_id}-{idx}")),
                stream_id: stream_id.clone(),
                kind: rule.kind,
                field: rule.field,
                value: rule.value,
                inverted: rule.inverted,
            })
            .collect();

        Stream {
            id: self.id,
            title: self.title,
            enabled: self.enabled,
            paused: self.paused,
            rules,
        }
    }
}

/// YAML 디렉토리 기반 스트림 카탈로그
///
/// 디렉토리 내의 `.yml`/`.yaml` 파일을 스캔합니다. 개별 파일의 파싱/검증
/// 실패와 중복 ID는 경고 로그를 남기고 건너뜁니다.
pub struct YamlCatalogue {
    /// 스트림 정의 디렉토리
    dir: PathBuf,
}

impl YamlCatalogue {
    /// 새 카탈로그를 생성합니다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 디렉토리에서 모든 스트림 정의를 로드합니다.
    async fn load_all(&self) -> Result<Vec<Stream>, CatalogueError> {
        let mut entries =
            tokio::fs::read_dir(&self.dir)
                .await
                .map_err(|e| CatalogueError::Unavailable {
                    reason: format!("failed to read directory {}: {e}", self.dir.display()),
                })?;

        let mut streams: Vec<Stream> = Vec::new();
        let mut seen_ids: HashMap<String, PathBuf> = HashMap::new();

        while let Some(entry) =
            entries
                .next_entry()
                .await
                .map_err(|e| CatalogueError::Unavailable {
                    reason: format!("failed to read directory entry: {e}"),
                })?
        {
            let path = entry.path();

            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml");
            if !is_yaml {
                continue;
            }

            match Self::load_file(&path).await {
                Ok(stream) => {
                    if let Some(previous) = seen_ids.get(&stream.id) {
                        tracing::warn!(
                            stream_id = %stream.id,
                            path = %path.display(),
                            previous = %previous.display(),
                            "duplicate stream id, skipping"
                        );
                        continue;
                    }
                    seen_ids.insert(stream.id.clone(), path);
                    streams.push(stream);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load stream file, skipping"
                    );
                }
            }

            if streams.len() > MAX_STREAM_COUNT {
                return Err(CatalogueError::Unavailable {
                    reason: format!("too many streams: max {MAX_STREAM_COUNT}"),
                });
            }
        }

        // 파일 시스템 순회 순서에 의존하지 않는 안정적인 스냅샷 순서
        streams.sort_by(|a, b| a.id.cmp(&b.id));

        tracing::debug!(
            dir = %self.dir.display(),
            count = streams.len(),
            "loaded stream definitions"
        );

        Ok(streams)
    }

    /// 단일 YAML 파일에서 스트림을 로드합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Stream, CatalogueError> {
        let path = path.as_ref();

        let metadata =
            tokio::fs::metadata(path)
                .await
                .map_err(|e| CatalogueError::LoadFailed {
                    path: path.display().to_string(),
                    reason: format!("failed to read file metadata: {e}"),
                })?;

        if metadata.len() > MAX_STREAM_FILE_SIZE {
            return Err(CatalogueError::LoadFailed {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_STREAM_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| CatalogueError::LoadFailed {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        Self::parse_yaml(&content, &path.display().to_string())
    }

    /// YAML 문자열을 파싱하여 스트림을 생성합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<Stream, CatalogueError> {
        let file: StreamFile =
            serde_yaml::from_str(yaml_str).map_err(|e| CatalogueError::LoadFailed {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        file.validate()?;
        Ok(file.into_stream())
    }
}

impl StreamCatalogue for YamlCatalogue {
    fn load_enabled_streams(&self) -> BoxFuture<'_, Result<Vec<Stream>, CatalogueError>> {
        Box::pin(async {
            let streams = self.load_all().await?;
            Ok(streams
                .into_iter()
                .filter(|s| s.enabled)
                .map(|mut s| {
                    s.rules = Vec::new();
                    s
                })
                .collect())
        })
    }

    fn load_rules(
        &self,
        stream_id: &str,
    ) -> BoxFuture<'_, Result<Vec<StreamRule>, CatalogueError>> {
        let stream_id = stream_id.to_owned();
        Box::pin(async move {
            let streams = self.load_all().await?;
            streams
                .into_iter()
                .find(|s| s.id == stream_id)
                .map(|s| s.rules)
                .ok_or(CatalogueError::StreamNotFound { stream_id })
        })
    }

    fn load_snapshot(&self) -> BoxFuture<'_, Result<Vec<Stream>, CatalogueError>> {
        // 디렉토리를 한 번만 파싱해 규칙까지 포함한 스냅샷 제공.
        // 기본 구현(스트림마다 load_rules)은 스트림 수만큼 디렉토리를
        // 다시 읽게 되므로 반드시 재정의한다.
        Box::pin(async {
            let streams = self.load_all().await?;
            Ok(streams.into_iter().filter(|s| s.enabled).collect())
        })
    }
}
