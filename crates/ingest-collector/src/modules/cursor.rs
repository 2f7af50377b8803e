//! 재개 커서 관리 모듈.
//!
//! 작업별로 마지막으로 처리 완료된 종목 코드를 캐시에 저장합니다.
//! 커서는 페이지가 모두 저장된 뒤에만 전진하고, TTL이 지나면 사라져
//! 다음 실행은 처음(`""`)부터 다시 시작합니다.

use ingest_core::{JobKind, KeyValueCache};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::Result;

/// 커서가 없을 때의 시작 값. 모든 종목 코드보다 앞에 정렬됩니다.
pub const CURSOR_START: &str = "";

/// 캐시 기반 재개 커서.
#[derive(Clone)]
pub struct ResumeCursor {
    cache: Arc<dyn KeyValueCache>,
    ttl: Duration,
}

impl ResumeCursor {
    pub fn new(cache: Arc<dyn KeyValueCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// 현재 커서 조회 (없으면 [`CURSOR_START`]).
    pub async fn load(&self, job: JobKind) -> Result<String> {
        let cursor = self
            .cache
            .get(&job.cursor_key())
            .await?
            .unwrap_or_else(|| CURSOR_START.to_string());
        debug!(job = %job, cursor = %cursor, "Cursor loaded");
        Ok(cursor)
    }

    /// 커서 전진.
    pub async fn advance(&self, job: JobKind, code: &str) -> Result<()> {
        self.cache
            .set_with_ttl(&job.cursor_key(), code, self.ttl)
            .await?;
        info!(job = %job, cursor = code, ttl_secs = self.ttl.as_secs(), "Cursor advanced");
        Ok(())
    }

    /// 커서 삭제. 삭제된 커서가 있었으면 `true`.
    pub async fn reset(&self, job: JobKind) -> Result<bool> {
        let removed = self.cache.delete(&job.cursor_key()).await?;
        info!(job = %job, removed, "Cursor reset");
        Ok(removed)
    }
}
