//! 에러 타입 정의.

use ingest_core::{CacheError, CoreError, SourceError, StoreError};
use ingest_data::DataError;
use ingest_upstream::UpstreamError;
use std::fmt;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러
    Config(String),
    /// 저장소 에러 (종목 조회, sink 쓰기)
    Data(StoreError),
    /// 가격 소스 에러 (파이프라인 워커)
    Source(SourceError),
    /// 업스트림 API 에러 (종목 동기화, 재무제표)
    Upstream(UpstreamError),
    /// 캐시 에러 (커서)
    Cache(CacheError),
    /// 취소됨
    Cancelled,
    /// 일반 에러
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl CollectorError {
    /// 데몬 루프를 멈춰야 하는 에러인지 확인.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Cancelled => true,
            Self::Source(e) => e.is_fatal(),
            Self::Upstream(e) => e.is_fatal(),
            _ => false,
        }
    }
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Data(e) => write!(f, "Storage error: {}", e),
            Self::Source(e) => write!(f, "Price source error: {}", e),
            Self::Upstream(e) => write!(f, "Upstream error: {}", e),
            Self::Cache(e) => write!(f, "Cache error: {}", e),
            Self::Cancelled => write!(f, "Run cancelled"),
            Self::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<StoreError> for CollectorError {
    fn from(err: StoreError) -> Self {
        Self::Data(err)
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Data(err.into())
    }
}

impl From<SourceError> for CollectorError {
    fn from(err: SourceError) -> Self {
        Self::Source(err)
    }
}

impl From<UpstreamError> for CollectorError {
    fn from(err: UpstreamError) -> Self {
        Self::Upstream(err)
    }
}

impl From<CacheError> for CollectorError {
    fn from(err: CacheError) -> Self {
        Self::Cache(err)
    }
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CollectorError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
