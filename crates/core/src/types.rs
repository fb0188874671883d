//! 도메인 타입 -- 어펜더 전역에서 사용되는 공통 타입
//!
//! 노드 엔드포인트, 노드 풀, 어펜더 식별 정보, 헬스 상태를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 원격 Flume 노드 엔드포인트
///
/// 생성 후 변경할 수 없으며, `(host, port)` 쌍이 식별자입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeEndpoint {
    host: String,
    port: u16,
}

impl NodeEndpoint {
    /// 새 엔드포인트를 생성합니다.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// 호스트명
    pub fn host(&self) -> &str {
        &self.host
    }

    /// 포트
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for NodeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// 노드 풀 -- 어펜더가 전송할 수 있는 엔드포인트의 순서 있는 집합
///
/// 비어 있을 수 있습니다 (degraded 모드). 이 경우 모든 전송은
/// [`DeliveryError::NoAvailableNodes`](crate::error::DeliveryError::NoAvailableNodes)로 끝납니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePool {
    endpoints: Vec<NodeEndpoint>,
}

impl NodePool {
    /// 엔드포인트 목록으로 노드 풀을 생성합니다. 순서는 유지됩니다.
    pub fn new(endpoints: Vec<NodeEndpoint>) -> Self {
        Self { endpoints }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NodeEndpoint> {
        self.endpoints.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeEndpoint> {
        self.endpoints.iter()
    }

    pub fn contains(&self, endpoint: &NodeEndpoint) -> bool {
        self.endpoints.contains(endpoint)
    }
}

impl<'a> IntoIterator for &'a NodePool {
    type Item = &'a NodeEndpoint;
    type IntoIter = std::slice::Iter<'a, NodeEndpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.iter()
    }
}

/// 어펜더 식별 정보
///
/// 로깅과 메트릭에서 어펜더 인스턴스를 구분하는 데 사용됩니다.
/// 생성 시 설정되며 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppenderIdentity {
    /// 어펜더 이름
    pub name: String,
    /// 어펜더 ID
    pub appender_id: String,
    /// 애플리케이션 ID
    pub application_id: String,
}

impl AppenderIdentity {
    pub fn new(
        name: impl Into<String>,
        appender_id: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            appender_id: appender_id.into(),
            application_id: application_id.into(),
        }
    }
}

impl fmt::Display for AppenderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.appender_id)
    }
}

/// 컴포넌트 건강 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 성능 또는 기능 저하
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}
