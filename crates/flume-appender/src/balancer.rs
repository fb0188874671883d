//! 노드 선택 정책
//!
//! [`BalancingPolicy`]는 전송마다 시도할 노드 인덱스 후보를 순서대로 돌려줍니다.
//! 클라이언트 매니저는 후보를 차례로 시도하고 첫 확인 응답에서 멈춥니다.
//!
//! - [`RoundRobinPolicy`]: 후보 1개, 호출마다 다음 노드
//! - [`RandomPolicy`]: 후보 1개, 균등 무작위
//! - [`FailoverPolicy`]: 모든 노드, 설정 순서(우선순위)대로
//!
//! 반환되는 인덱스는 항상 `pool_len` 미만입니다.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::config::BalancingStrategy;

/// 노드 선택 정책 trait
pub trait BalancingPolicy: Send + Sync {
    /// 정책 이름
    fn name(&self) -> &'static str;

    /// 이번 전송에서 시도할 노드 인덱스를 순서대로 반환합니다.
    ///
    /// 풀이 비어 있으면 빈 Vec을 반환합니다.
    fn candidates(&self, pool_len: usize) -> Vec<usize>;
}

/// 순환 선택 정책
#[derive(Debug, Default)]
pub struct RoundRobinPolicy {
    cursor: AtomicUsize,
}

impl RoundRobinPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalancingPolicy for RoundRobinPolicy {
    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn candidates(&self, pool_len: usize) -> Vec<usize> {
        if pool_len == 0 {
            return Vec::new();
        }
        let next = self.cursor.fetch_add(1, Ordering::Relaxed);
        vec![next % pool_len]
    }
}

/// 무작위 선택 정책
#[derive(Debug, Default)]
pub struct RandomPolicy;

impl BalancingPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn candidates(&self, pool_len: usize) -> Vec<usize> {
        if pool_len == 0 {
            return Vec::new();
        }
        vec![rand::rng().random_range(0..pool_len)]
    }
}

/// 우선순위 기반 failover 정책
///
/// 항상 첫 번째(최우선) 노드부터 시도합니다.
#[derive(Debug, Default)]
pub struct FailoverPolicy;

impl BalancingPolicy for FailoverPolicy {
    fn name(&self) -> &'static str {
        "failover"
    }

    fn candidates(&self, pool_len: usize) -> Vec<usize> {
        (0..pool_len).collect()
    }
}

/// 설정 전략에 맞는 정책을 생성합니다.
pub fn policy_for(strategy: BalancingStrategy) -> Box<dyn BalancingPolicy> {
    match strategy {
        BalancingStrategy::RoundRobin => Box::new(RoundRobinPolicy::new()),
        BalancingStrategy::Random => Box::new(RandomPolicy),
        BalancingStrategy::Failover => Box::new(FailoverPolicy),
    }
}
