#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`config`]: 원시 설정 바이트(JSON) 디코딩 및 검증
//! - [`codec`]: 길이 접두사 프레임 인코딩/디코딩
//! - [`balancer`]: 노드 선택 정책 (round robin, random, failover)
//! - [`client`]: 노드별 지연 연결 TCP 클라이언트
//! - [`manager`]: 노드 풀 클라이언트 매니저 (`ClientManager` 구현)
//! - [`event_builder`]: 로그 배치 -> 레코드 데이터 이벤트 변환
//! - [`appender`]: 생명주기와 append 조율 (`LogAppender` 구현)
//!
//! # 아키텍처
//!
//! ```text
//! init(raw config) -> FlumeConfig -> FlumeClientManager (NodeClient x N)
//! append(batch) -> FlumeEventBuilder -> encode_frame -> BalancingPolicy -> NodeClient
//! ```

pub mod appender;
pub mod balancer;
pub mod client;
pub mod codec;
pub mod config;
pub mod event_builder;
pub mod manager;

// --- 주요 타입 re-export ---

// 어펜더
pub use appender::{FlumeLogAppender, FlumeLogAppenderBuilder};

// 설정
pub use config::{BalancingStrategy, FlumeConfig, FlumeConfigBuilder};

// 클라이언트 매니저
pub use manager::FlumeClientManager;

// 이벤트 빌더
pub use event_builder::FlumeEventBuilder;

// 밸런싱
pub use balancer::{BalancingPolicy, FailoverPolicy, RandomPolicy, RoundRobinPolicy};
