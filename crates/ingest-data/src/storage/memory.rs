//! 프로세스 내 키-값 캐시.
//!
//! Redis가 없는 로컬 실행과 테스트용입니다. 만료는 조회 시점에 판정하며
//! `tokio::time`을 기준으로 하므로 일시정지된 테스트 시계를 따릅니다.

use async_trait::async_trait;
use ingest_core::{CacheError, KeyValueCache};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Duration,
    expires_at: Instant,
}

/// 메모리 캐시.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    /// 빈 캐시 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 키를 저장할 때 지정된 TTL (만료되었으면 `None`).
    pub async fn ttl_of(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.ttl)
    }

    /// 만료되지 않은 키 개수.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    /// 비어 있는지 확인.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value: value.to_string(),
            ttl,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.lock().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("ingest:cursor:daily", "1301", Duration::from_secs(7200))
            .await
            .unwrap();

        assert_eq!(cache.get("ingest:cursor:daily").await.unwrap().as_deref(), Some("1301"));
        assert_eq!(cache.ttl_of("ingest:cursor:daily").await, Some(Duration::from_secs(7200)));

        tokio::time::advance(Duration::from_secs(7201)).await;

        assert_eq!(cache.get("ingest:cursor:daily").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_overwrite_and_delete() {
        let cache = MemoryCache::new();
        cache.set_with_ttl("k", "a", Duration::from_secs(60)).await.unwrap();
        cache.set_with_ttl("k", "b", Duration::from_secs(30)).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("b"));
        assert_eq!(cache.ttl_of("k").await, Some(Duration::from_secs(30)));
        assert!(cache.delete("k").await.unwrap());
        assert!(!cache.delete("k").await.unwrap());
    }
}
