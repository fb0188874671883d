//! Flume 이벤트 빌더
//!
//! 로그 배치를 레코드 데이터 문서(JSON)로 변환해 [`WireEvent`] 본문에 담습니다.
//!
//! # 본문 구조
//! ```json
//! {
//!   "record_header": {
//!     "endpoint_key_hash": "...",
//!     "application_token": "...",
//!     "header_version": 1,
//!     "timestamp": 1700000000000
//!   },
//!   "schema_version": 2,
//!   "events": [ { ... }, { ... } ],
//!   "client_profile": { ... },
//!   "server_profile": { ... }
//! }
//! ```
//!
//! 프로파일은 설정 플래그가 켜져 있고 배치에 값이 있을 때만 포함됩니다.

use serde::Serialize;
use serde_json::Value;

use kaa_appender_core::appender::EventBuilder;
use kaa_appender_core::error::SerializationError;
use kaa_appender_core::event::{
    HEADER_APPENDER_ID, HEADER_APPLICATION_ID, HEADER_BATCH_ID, HEADER_EVENT_COUNT,
    HEADER_SCHEMA_VERSION, HEADER_TIMESTAMP, LogEventBatch, WireEvent, unix_millis,
};
use kaa_appender_core::types::AppenderIdentity;

use crate::codec::{MAX_FRAME_SIZE, payload_len};
use crate::config::FlumeConfig;

/// 레코드 헤더 버전
pub const RECORD_HEADER_VERSION: u32 = 1;

#[derive(Serialize)]
struct RecordHeader<'a> {
    endpoint_key_hash: &'a str,
    application_token: &'a str,
    header_version: u32,
    timestamp: u64,
}

#[derive(Serialize)]
struct RecordData<'a> {
    record_header: RecordHeader<'a>,
    schema_version: u32,
    events: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_profile: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_profile: Option<Value>,
}

/// Flume 이벤트 빌더
///
/// 본문은 `max_event_size`, 헤더를 포함한 프레임은 [`MAX_FRAME_SIZE`]로 제한됩니다.
#[derive(Debug, Clone)]
pub struct FlumeEventBuilder {
    identity: AppenderIdentity,
    include_client_profile: bool,
    include_server_profile: bool,
    max_event_size: usize,
}

impl FlumeEventBuilder {
    /// 기본 설정(프로파일 제외)으로 빌더를 생성합니다.
    pub fn new(identity: AppenderIdentity) -> Self {
        Self::from_config(identity, &FlumeConfig::default())
    }

    pub fn from_config(identity: AppenderIdentity, config: &FlumeConfig) -> Self {
        Self {
            identity,
            include_client_profile: config.include_client_profile,
            include_server_profile: config.include_server_profile,
            max_event_size: config.max_event_size,
        }
    }

    fn profile(
        enabled: bool,
        raw: Option<&str>,
        what: &str,
    ) -> Result<Option<Value>, SerializationError> {
        match (enabled, raw) {
            (true, Some(raw)) => serde_json::from_str(raw).map(Some).map_err(|e| {
                SerializationError::Encode(format!("invalid {what} profile: {e}"))
            }),
            _ => Ok(None),
        }
    }
}

impl EventBuilder for FlumeEventBuilder {
    fn build(&self, batch: &LogEventBatch) -> Result<WireEvent, SerializationError> {
        let events = batch
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::from_slice::<Value>(&record.data).map_err(|e| {
                    SerializationError::MalformedRecord {
                        index,
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let timestamp = unix_millis(batch.metadata.created_at);
        let data = RecordData {
            record_header: RecordHeader {
                endpoint_key_hash: &batch.metadata.endpoint_key_hash,
                application_token: &batch.metadata.source_application,
                header_version: RECORD_HEADER_VERSION,
                timestamp,
            },
            schema_version: batch.schema.version,
            events,
            client_profile: Self::profile(
                self.include_client_profile,
                batch.client_profile.as_deref(),
                "client",
            )?,
            server_profile: Self::profile(
                self.include_server_profile,
                batch.server_profile.as_deref(),
                "server",
            )?,
        };

        let body =
            serde_json::to_vec(&data).map_err(|e| SerializationError::Encode(e.to_string()))?;
        if body.len() > self.max_event_size {
            return Err(SerializationError::TooLarge {
                size: body.len(),
                max: self.max_event_size,
            });
        }

        let event = WireEvent::new(body)
            .with_header(HEADER_APPENDER_ID, self.identity.appender_id.as_str())
            .with_header(HEADER_APPLICATION_ID, self.identity.application_id.as_str())
            .with_header(HEADER_SCHEMA_VERSION, batch.schema.version.to_string())
            .with_header(HEADER_EVENT_COUNT, batch.len().to_string())
            .with_header(HEADER_TIMESTAMP, timestamp.to_string())
            .with_header(HEADER_BATCH_ID, batch.id.as_str());

        // 헤더를 포함한 프레임 한도
        let frame_size = payload_len(&event);
        if frame_size > MAX_FRAME_SIZE {
            return Err(SerializationError::TooLarge {
                size: frame_size,
                max: MAX_FRAME_SIZE,
            });
        }

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaa_appender_core::event::{BatchMetadata, LogRecord, LogSchema};

    use crate::config::FlumeConfigBuilder;

    fn identity() -> AppenderIdentity {
        AppenderIdentity::new("flume", "appender_id", "application_id")
    }

    fn batch() -> LogEventBatch {
        let metadata = BatchMetadata {
            source_application: "app-token".to_owned(),
            endpoint_key_hash: "key-hash".to_owned(),
            ..Default::default()
        };
        let schema = LogSchema {
            version: 3,
            name: "log".to_owned(),
        };
        LogEventBatch::new(metadata, schema)
            .with_record(LogRecord::new(&br#"{"level":"INFO","msg":"one"}"#[..]))
            .with_record(LogRecord::new(&br#"{"level":"WARN","msg":"two"}"#[..]))
    }

    fn body_of(event: &WireEvent) -> Value {
        serde_json::from_slice(&event.body).unwrap()
    }

    #[test]
    fn builds_headers_and_body() {
        let batch = batch();
        let event = FlumeEventBuilder::new(identity()).build(&batch).unwrap();

        assert_eq!(event.header(HEADER_APPENDER_ID), Some("appender_id"));
        assert_eq!(event.header(HEADER_APPLICATION_ID), Some("application_id"));
        assert_eq!(event.header(HEADER_SCHEMA_VERSION), Some("3"));
        assert_eq!(event.header(HEADER_EVENT_COUNT), Some("2"));
        assert_eq!(event.header(HEADER_BATCH_ID), Some(batch.id.as_str()));

        let body = body_of(&event);
        assert_eq!(body["record_header"]["endpoint_key_hash"], "key-hash");
        assert_eq!(body["record_header"]["application_token"], "app-token");
        assert_eq!(body["record_header"]["header_version"], 1);
        assert_eq!(body["schema_version"], 3);
        assert_eq!(body["events"][1]["msg"], "two");
        assert!(body.get("client_profile").is_none());
    }

    #[test]
    fn empty_batch_builds_empty_event_list() {
        let event = FlumeEventBuilder::new(identity())
            .build(&LogEventBatch::default())
            .unwrap();
        assert_eq!(event.header(HEADER_EVENT_COUNT), Some("0"));
        assert_eq!(body_of(&event)["events"], serde_json::json!([]));
    }

    #[test]
    fn malformed_record_reports_index() {
        let batch = batch().with_record(LogRecord::new(&b"not json"[..]));
        let err = FlumeEventBuilder::new(identity()).build(&batch).unwrap_err();
        assert!(matches!(err, SerializationError::MalformedRecord { index: 2, .. }));
    }

    #[test]
    fn profiles_included_only_when_enabled() {
        let batch = batch()
            .with_client_profile(r#"{"os":"linux"}"#)
            .with_server_profile(r#"{"tier":"gold"}"#);

        let without = FlumeEventBuilder::new(identity()).build(&batch).unwrap();
        assert!(body_of(&without).get("server_profile").is_none());

        let config = FlumeConfigBuilder::new()
            .include_client_profile(true)
            .include_server_profile(true)
            .build()
            .unwrap();
        let with = FlumeEventBuilder::from_config(identity(), &config)
            .build(&batch)
            .unwrap();
        let body = body_of(&with);
        assert_eq!(body["client_profile"]["os"], "linux");
        assert_eq!(body["server_profile"]["tier"], "gold");
    }

    #[test]
    fn invalid_profile_fails_when_enabled() {
        let config = FlumeConfigBuilder::new()
            .include_client_profile(true)
            .build()
            .unwrap();
        let batch = batch().with_client_profile("{broken");
        let result = FlumeEventBuilder::from_config(identity(), &config).build(&batch);
        assert!(matches!(result, Err(SerializationError::Encode(_))));
    }

    #[test]
    fn oversized_body_is_rejected() {
        let config = FlumeConfigBuilder::new().max_event_size(16).build().unwrap();
        let err = FlumeEventBuilder::from_config(identity(), &config)
            .build(&batch())
            .unwrap_err();
        assert!(matches!(err, SerializationError::TooLarge { max: 16, .. }));
    }

    /// 본문 길이가 정확히 `target`이 되도록 레코드 문자열 길이를 맞춘 배치
    fn batch_with_body_len(builder: &FlumeEventBuilder, target: usize) -> LogEventBatch {
        let make = |len: usize| {
            let metadata = BatchMetadata {
                source_application: "app-token".to_owned(),
                endpoint_key_hash: "key-hash".to_owned(),
                created_at: std::time::UNIX_EPOCH + std::time::Duration::from_millis(1_700_000_000_000),
            };
            let record = format!("\"{}\"", "a".repeat(len));
            LogEventBatch::new(metadata, LogSchema::default())
                .with_record(LogRecord::new(record.into_bytes()))
        };
        let overhead = builder.build(&make(0)).unwrap().body_len();
        make(target - overhead)
    }

    #[test]
    fn body_at_limit_overflowing_frame_is_too_large() {
        let config = FlumeConfigBuilder::new()
            .max_event_size(MAX_FRAME_SIZE)
            .build()
            .unwrap();
        let builder = FlumeEventBuilder::from_config(identity(), &config);
        let batch = batch_with_body_len(&builder, MAX_FRAME_SIZE);

        let err = builder.build(&batch).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::TooLarge { max: MAX_FRAME_SIZE, size } if size > MAX_FRAME_SIZE
        ));
    }

    #[test]
    fn built_event_always_encodes() {
        let builder = FlumeEventBuilder::new(identity());
        let event = builder.build(&batch()).unwrap();
        assert!(crate::codec::encode_frame(&event).is_ok());
    }
}
