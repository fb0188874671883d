//! 메트릭 상수 및 설명 등록
//!
//! 어펜더 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더(exporter) 설치는 호스트 프로세스의 몫입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `kaa_appender_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 어펜더 이름 레이블 키
pub const LABEL_APPENDER: &str = "appender";

/// 노드 레이블 키 (`host:port`)
pub const LABEL_NODE: &str = "node";

/// 결과 레이블 키 (delivered, skipped, dropped, failed)
pub const LABEL_RESULT: &str = "result";

// ─── 어펜더 메트릭 ────────────────────────────────────────────────

/// `append` 호출 수 (counter, labels: appender, result)
///
/// 건너뛴 append는 `result="skipped"`로 집계됩니다.
pub const APPENDER_APPENDS_TOTAL: &str = "kaa_appender_appends_total";

/// 전송 성공한 로그 레코드 수 (counter, label: appender)
pub const APPENDER_RECORDS_DELIVERED_TOTAL: &str = "kaa_appender_records_delivered_total";

/// 직렬화 실패로 버려진 배치 수 (counter, label: appender)
pub const APPENDER_SERIALIZATION_ERRORS_TOTAL: &str = "kaa_appender_serialization_errors_total";

// ─── 클라이언트 매니저 메트릭 ─────────────────────────────────────

/// 노드별 전송 실패 수 (counter, label: node)
pub const CLIENT_DELIVERY_FAILURES_TOTAL: &str = "kaa_appender_client_delivery_failures_total";

/// 노드 연결 수립 횟수 (counter, label: node)
pub const CLIENT_NODE_CONNECTS_TOTAL: &str = "kaa_appender_client_node_connects_total";

/// 노드 전송 소요 시간 (histogram, 초, label: node)
pub const CLIENT_SEND_DURATION_SECONDS: &str = "kaa_appender_client_send_duration_seconds";

/// 전체 메트릭 이름 목록
pub const ALL_METRIC_NAMES: [&str; 6] = [
    APPENDER_APPENDS_TOTAL,
    APPENDER_RECORDS_DELIVERED_TOTAL,
    APPENDER_SERIALIZATION_ERRORS_TOTAL,
    CLIENT_DELIVERY_FAILURES_TOTAL,
    CLIENT_NODE_CONNECTS_TOTAL,
    CLIENT_SEND_DURATION_SECONDS,
];

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        APPENDER_APPENDS_TOTAL,
        "Total number of append calls by outcome"
    );
    describe_counter!(
        APPENDER_RECORDS_DELIVERED_TOTAL,
        "Total number of log records acknowledged by a flume node"
    );
    describe_counter!(
        APPENDER_SERIALIZATION_ERRORS_TOTAL,
        "Total number of batches dropped because they could not be serialized"
    );
    describe_counter!(
        CLIENT_DELIVERY_FAILURES_TOTAL,
        "Total number of failed send attempts per node"
    );
    describe_counter!(
        CLIENT_NODE_CONNECTS_TOTAL,
        "Total number of connections established per node"
    );
    describe_histogram!(
        CLIENT_SEND_DURATION_SECONDS,
        "Time to send one event and receive the acknowledgement in seconds"
    );
}
