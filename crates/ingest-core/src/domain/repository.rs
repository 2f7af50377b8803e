//! 종목 저장소와 가격 저장소(sink) 추상화.
//!
//! 두 sink 모두 자연 키 `(code, date)`로 멱등 upsert를 구현해야 합니다.
//! 파이프라인은 크래시 후 재시도 시 같은 레코드를 두 번 쓸 수 있습니다.

use async_trait::async_trait;
use thiserror::Error;

use super::{AnalysisProjection, PriceRecord};
use crate::Symbol;

/// 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 조회 실패
    #[error("조회 실패: {0}")]
    Read(String),

    /// 쓰기 실패
    #[error("쓰기 실패: {0}")]
    Write(String),

    /// 연결 불가
    #[error("저장소 연결 불가: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// 메시지 앞에 대상(테이블/sink 이름)을 붙입니다. 종류는 유지됩니다.
    pub fn with_target(self, target: &str) -> Self {
        match self {
            StoreError::Read(msg) => StoreError::Read(format!("{target}: {msg}")),
            StoreError::Write(msg) => StoreError::Write(format!("{target}: {msg}")),
            StoreError::Unavailable(msg) => StoreError::Unavailable(format!("{target}: {msg}")),
        }
    }
}

/// 종목 마스터 저장소.
#[async_trait]
pub trait SymbolRepository: Send + Sync {
    /// `cursor`보다 큰 종목을 코드 오름차순으로 최대 `limit`개 반환합니다.
    ///
    /// `cursor`는 포함하지 않습니다. 빈 문자열은 처음부터 조회합니다.
    async fn find_page_from_cursor(
        &self,
        cursor: &str,
        limit: usize,
    ) -> Result<Vec<Symbol>, StoreError>;

    /// 종목 마스터를 upsert 합니다. 반영된 행 수를 반환합니다.
    async fn upsert_symbols(&self, symbols: &[Symbol]) -> Result<usize, StoreError>;
}

/// 원본 일봉 가격 저장소.
#[async_trait]
pub trait PriceSink: Send + Sync {
    /// `(code, date)` 기준 멱등 일괄 upsert.
    async fn upsert_batch(&self, records: &[PriceRecord]) -> Result<(), StoreError>;
}

/// 분석용 프로젝션 저장소.
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    /// `(code, date)` 기준 멱등 일괄 upsert.
    async fn upsert_batch(&self, records: &[AnalysisProjection]) -> Result<(), StoreError>;
}
