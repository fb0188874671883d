//! Flume 어펜더 설정
//!
//! [`FlumeConfig`]는 어펜더 `init`에 전달되는 원시 설정 바이트(JSON)에서
//! 디코딩됩니다.
//!
//! # 설정 예시
//! ```json
//! {
//!   "nodes": [
//!     { "host": "localhost", "port": 12121 },
//!     { "host": "localhost", "port": 12122 }
//!   ],
//!   "balancing": "round_robin",
//!   "connect_timeout_ms": 3000,
//!   "request_timeout_ms": 5000
//! }
//! ```

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use kaa_appender_core::error::ConfigError;
use kaa_appender_core::types::{NodeEndpoint, NodePool};

use crate::codec::MAX_FRAME_SIZE;

/// 노드 선택 전략
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancingStrategy {
    /// 순환 선택 (기본값)
    #[default]
    RoundRobin,
    /// 무작위 선택
    Random,
    /// 설정 순서(우선순위)대로 시도
    Failover,
}

/// Flume 어펜더 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlumeConfig {
    /// 노드 목록. 비어 있으면 degraded 모드로 동작합니다.
    pub nodes: Vec<NodeEndpoint>,
    /// 노드 선택 전략
    pub balancing: BalancingStrategy,
    /// 연결 타임아웃 (밀리초)
    pub connect_timeout_ms: u64,
    /// 전송 + 확인 응답 타임아웃 (밀리초)
    pub request_timeout_ms: u64,
    /// 직렬화된 이벤트 최대 크기 (바이트)
    pub max_event_size: usize,
    /// 클라이언트 프로파일을 본문에 포함할지 여부
    pub include_client_profile: bool,
    /// 서버 프로파일을 본문에 포함할지 여부
    pub include_server_profile: bool,
}

impl Default for FlumeConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            balancing: BalancingStrategy::RoundRobin,
            connect_timeout_ms: 3_000,
            request_timeout_ms: 5_000,
            max_event_size: 4 * 1024 * 1024, // 4MB
            include_client_profile: false,
            include_server_profile: false,
        }
    }
}

impl FlumeConfig {
    /// 원시 설정 바이트(JSON)를 디코딩하고 검증합니다.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(raw).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 설정을 JSON 바이트로 인코딩합니다.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        serde_json::to_vec(self).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 노드 목록이 비어 있는 것은 허용됩니다 (degraded 모드).
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MAX_TIMEOUT_MS: u64 = 300_000; // 5 minutes

        let mut seen = HashSet::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if node.host().trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("nodes[{i}].host"),
                    reason: "host must not be empty".to_owned(),
                });
            }
            if node.port() == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("nodes[{i}].port"),
                    reason: "port must be 1-65535".to_owned(),
                });
            }
            if !seen.insert(node) {
                return Err(ConfigError::InvalidValue {
                    field: format!("nodes[{i}]"),
                    reason: format!("duplicate node '{node}'"),
                });
            }
        }

        if self.connect_timeout_ms == 0 || self.connect_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::InvalidValue {
                field: "connect_timeout_ms".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_MS}"),
            });
        }

        if self.request_timeout_ms == 0 || self.request_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_MS}"),
            });
        }

        if self.max_event_size == 0 || self.max_event_size > MAX_FRAME_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "max_event_size".to_owned(),
                reason: format!("must be 1-{MAX_FRAME_SIZE}"),
            });
        }

        if self.nodes.is_empty() {
            tracing::warn!("no flume nodes configured, appender will run in degraded mode");
        }

        Ok(())
    }

    /// 노드 풀을 생성합니다.
    pub fn node_pool(&self) -> NodePool {
        NodePool::new(self.nodes.clone())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Flume 설정 빌더
#[derive(Default)]
pub struct FlumeConfigBuilder {
    config: FlumeConfig,
}

impl FlumeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 노드를 추가합니다.
    pub fn node(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.nodes.push(NodeEndpoint::new(host, port));
        self
    }

    /// 노드 목록을 교체합니다.
    pub fn nodes(mut self, nodes: Vec<NodeEndpoint>) -> Self {
        self.config.nodes = nodes;
        self
    }

    pub fn balancing(mut self, strategy: BalancingStrategy) -> Self {
        self.config.balancing = strategy;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn max_event_size(mut self, size: usize) -> Self {
        self.config.max_event_size = size;
        self
    }

    pub fn include_client_profile(mut self, include: bool) -> Self {
        self.config.include_client_profile = include;
        self
    }

    pub fn include_server_profile(mut self, include: bool) -> Self {
        self.config.include_server_profile = include;
        self
    }

    /// 설정을 검증하고 `FlumeConfig`를 생성합니다.
    pub fn build(self) -> Result<FlumeConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_node_config_decodes() {
        let raw = br#"{
            "nodes": [
                {"host": "localhost", "port": 12121},
                {"host": "localhost", "port": 12122}
            ],
            "balancing": "round_robin"
        }"#;
        let config = FlumeConfig::from_bytes(raw).unwrap();
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.balancing, BalancingStrategy::RoundRobin);
        assert_eq!(config.connect_timeout_ms, 3_000);
        assert_eq!(config.node_pool().get(1).unwrap().port(), 12122);
    }

    #[test]
    fn strategy_names_are_snake_case() {
        let config = FlumeConfig::from_bytes(br#"{"balancing": "failover"}"#).unwrap();
        assert_eq!(config.balancing, BalancingStrategy::Failover);
        let config = FlumeConfig::from_bytes(br#"{"balancing": "random"}"#).unwrap();
        assert_eq!(config.balancing, BalancingStrategy::Random);
    }

    #[test]
    fn empty_node_list_is_degraded_not_invalid() {
        let config = FlumeConfig::from_bytes(br#"{"nodes": []}"#).unwrap();
        assert!(config.node_pool().is_empty());
    }

    #[test]
    fn malformed_bytes_fail_to_parse() {
        let err = FlumeConfig::from_bytes(b"\x00\x01not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn unknown_strategy_fails_to_parse() {
        let err = FlumeConfig::from_bytes(br#"{"balancing": "least_loaded"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn port_zero_is_rejected() {
        let err = FlumeConfig::from_bytes(br#"{"nodes": [{"host": "a", "port": 0}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("nodes[0].port"));
    }

    #[test]
    fn out_of_range_port_fails_to_parse() {
        let err = FlumeConfig::from_bytes(br#"{"nodes": [{"host": "a", "port": 70000}]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn empty_host_is_rejected() {
        let result = FlumeConfigBuilder::new().node("  ", 4141).build();
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_nodes_are_rejected() {
        let err = FlumeConfigBuilder::new()
            .node("flume", 4141)
            .node("flume", 4141)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = FlumeConfigBuilder::new()
            .node("flume", 4141)
            .request_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn oversized_event_limit_is_rejected() {
        let result = FlumeConfigBuilder::new()
            .max_event_size(MAX_FRAME_SIZE + 1)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn bytes_roundtrip_through_builder() {
        let config = FlumeConfigBuilder::new()
            .node("10.0.0.1", 4141)
            .balancing(BalancingStrategy::Failover)
            .include_client_profile(true)
            .build()
            .unwrap();
        let decoded = FlumeConfig::from_bytes(&config.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, config);
    }
}
