//! 종목별 일봉 가격 소스 추상화.
//!
//! 파이프라인은 인증에 대해 알지 못합니다. 토큰 수명 주기는 구현체가
//! 투명하게 처리하고, 복구 불가능한 실패만 치명적 에러로 구분해 돌려줍니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use super::PriceRecord;

/// 가격 소스 에러.
#[derive(Debug, Error)]
pub enum SourceError {
    /// 재인증 후에도 인증 실패, 또는 자격증명 교환 실패
    #[error("인증 실패: {0}")]
    Unauthorized(String),

    /// 토큰 캐시 인프라 장애
    #[error("캐시 에러: {0}")]
    Cache(String),

    /// 종목 단위 조회 실패
    #[error("조회 실패: {0}")]
    Fetch(String),
}

impl SourceError {
    /// 실행 전체를 중단해야 하는 에러인지 확인합니다.
    ///
    /// 인증/캐시 장애는 이후의 모든 종목 조회를 무효화하므로 치명적입니다.
    /// 그 외는 해당 종목만 건너뜁니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Unauthorized(_) | SourceError::Cache(_))
    }

    /// 메시지 앞에 종목 코드를 붙입니다. 종류는 유지됩니다.
    pub fn with_symbol(self, code: &str) -> Self {
        match self {
            SourceError::Unauthorized(msg) => SourceError::Unauthorized(format!("{code}: {msg}")),
            SourceError::Cache(msg) => SourceError::Cache(format!("{code}: {msg}")),
            SourceError::Fetch(msg) => SourceError::Fetch(format!("{code}: {msg}")),
        }
    }
}

/// 종목별 일봉 가격 소스.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// `from..=to` 기간의 일봉을 조회합니다.
    async fn daily_prices(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceRecord>, SourceError>;
}
