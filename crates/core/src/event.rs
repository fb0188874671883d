//! 이벤트 -- 로그 배치와 전송 단위
//!
//! [`LogEventBatch`]는 외부 로그 수집 파이프라인이 생성하고, `append` 호출마다
//! 정확히 한 번 소비됩니다. [`WireEvent`]는 이벤트 빌더의 출력으로,
//! 하나의 `append` 호출 동안만 존재합니다.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

// --- 헤더 키 상수 ---

/// 어펜더 ID 헤더
pub const HEADER_APPENDER_ID: &str = "appender_id";
/// 애플리케이션 ID 헤더
pub const HEADER_APPLICATION_ID: &str = "application_id";
/// 로그 스키마 버전 헤더
pub const HEADER_SCHEMA_VERSION: &str = "schema_version";
/// 배치 내 이벤트 수 헤더
pub const HEADER_EVENT_COUNT: &str = "event_count";
/// 이벤트 생성 시각 헤더 (Unix epoch 밀리초)
pub const HEADER_TIMESTAMP: &str = "timestamp";
/// 배치 ID 헤더
pub const HEADER_BATCH_ID: &str = "batch_id";

/// 단일 로그 레코드
///
/// `data`는 JSON으로 인코딩된 레코드 본문입니다.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// 레코드 발생 시각
    pub timestamp: SystemTime,
    /// 레코드 본문
    pub data: Bytes,
}

impl LogRecord {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            data: data.into(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// 로그 스키마 정보
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSchema {
    /// 스키마 버전
    pub version: u32,
    /// 스키마 이름
    pub name: String,
}

/// 배치 메타데이터
#[derive(Debug, Clone)]
pub struct BatchMetadata {
    /// 로그를 생성한 애플리케이션 토큰
    pub source_application: String,
    /// 로그를 보낸 엔드포인트의 키 해시
    pub endpoint_key_hash: String,
    /// 배치 생성 시각
    pub created_at: SystemTime,
}

impl Default for BatchMetadata {
    fn default() -> Self {
        Self {
            source_application: String::new(),
            endpoint_key_hash: String::new(),
            created_at: SystemTime::now(),
        }
    }
}

/// 로그 이벤트 배치
///
/// 레코드 목록과 메타데이터를 담습니다. 프로파일은 JSON 문자열로 전달되며,
/// 이벤트 빌더 설정에 따라 본문에 포함됩니다.
#[derive(Debug, Clone)]
pub struct LogEventBatch {
    /// 배치 ID (UUID v4)
    pub id: String,
    /// 배치 메타데이터
    pub metadata: BatchMetadata,
    /// 레코드 스키마
    pub schema: LogSchema,
    /// 로그 레코드
    pub records: Vec<LogRecord>,
    /// 클라이언트 프로파일 (JSON)
    pub client_profile: Option<String>,
    /// 서버 프로파일 (JSON)
    pub server_profile: Option<String>,
}

impl LogEventBatch {
    /// 레코드가 없는 새 배치를 생성합니다.
    pub fn new(metadata: BatchMetadata, schema: LogSchema) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata,
            schema,
            records: Vec::new(),
            client_profile: None,
            server_profile: None,
        }
    }

    /// 레코드를 추가합니다.
    pub fn with_record(mut self, record: LogRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn with_client_profile(mut self, profile: impl Into<String>) -> Self {
        self.client_profile = Some(profile.into());
        self
    }

    pub fn with_server_profile(mut self, profile: impl Into<String>) -> Self {
        self.server_profile = Some(profile.into());
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 레코드 타임스탬프의 (최소, 최대) 범위를 반환합니다.
    ///
    /// 레코드가 없으면 `None`을 반환합니다.
    pub fn timestamp_range(&self) -> Option<(SystemTime, SystemTime)> {
        let first = self.records.iter().map(|r| r.timestamp).min()?;
        let last = self.records.iter().map(|r| r.timestamp).max()?;
        Some((first, last))
    }
}

impl Default for LogEventBatch {
    fn default() -> Self {
        Self::new(BatchMetadata::default(), LogSchema::default())
    }
}

/// 전송 단위 이벤트
///
/// 헤더 맵과 직렬화된 본문으로 구성됩니다. 영속화되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireEvent {
    /// 이벤트 헤더
    pub headers: BTreeMap<String, String>,
    /// 직렬화된 본문
    pub body: Bytes,
}

impl WireEvent {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

/// `SystemTime`을 Unix epoch 밀리초로 변환합니다.
///
/// epoch 이전 시각은 0으로 처리합니다.
pub fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_batch_is_empty() {
        let batch = LogEventBatch::default();
        assert!(batch.is_empty());
        assert!(batch.timestamp_range().is_none());
        assert!(!batch.id.is_empty());
    }

    #[test]
    fn batch_ids_are_unique() {
        let a = LogEventBatch::default();
        let b = LogEventBatch::default();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn timestamp_range_spans_records() {
        let base = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let batch = LogEventBatch::default()
            .with_record(LogRecord::new(&b"{}"[..]).with_timestamp(base + Duration::from_secs(5)))
            .with_record(LogRecord::new(&b"{}"[..]).with_timestamp(base))
            .with_record(LogRecord::new(&b"{}"[..]).with_timestamp(base + Duration::from_secs(2)));

        let (first, last) = batch.timestamp_range().unwrap();
        assert_eq!(first, base);
        assert_eq!(last, base + Duration::from_secs(5));
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn wire_event_headers() {
        let event = WireEvent::new(&b"body"[..])
            .with_header(HEADER_APPENDER_ID, "appender_id")
            .with_header(HEADER_EVENT_COUNT, "0");
        assert_eq!(event.header(HEADER_APPENDER_ID), Some("appender_id"));
        assert_eq!(event.header("missing"), None);
        assert_eq!(event.body_len(), 4);
    }

    #[test]
    fn unix_millis_conversion() {
        let t = UNIX_EPOCH + Duration::from_millis(1_234);
        assert_eq!(unix_millis(t), 1_234);
        assert_eq!(unix_millis(UNIX_EPOCH), 0);
    }
}
