//! 키-값 캐시 추상화.
//!
//! 토큰과 재개 커서를 저장하는 원격 캐시의 경계입니다. 모든 연산은
//! 키 단위로 원자적이어야 하며, 프로세스 내 잠금은 필요하지 않습니다.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 캐시 에러.
///
/// 키가 없는 경우는 에러가 아니라 `Ok(None)`으로 표현됩니다.
/// 이 타입은 그 외의 인프라 장애만 나타냅니다.
#[derive(Debug, Error)]
pub enum CacheError {
    /// 백엔드 연결/명령 실패
    #[error("캐시 백엔드 에러: {0}")]
    Backend(String),

    /// 저장된 값의 형식 오류
    #[error("캐시 값 형식 에러: {0}")]
    InvalidValue(String),
}

/// TTL을 지원하는 키-값 캐시.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// 키의 값을 조회합니다. 없거나 만료되었으면 `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// TTL과 함께 값을 저장합니다.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// 키를 삭제합니다. 삭제된 키가 있었으면 `true`.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}
