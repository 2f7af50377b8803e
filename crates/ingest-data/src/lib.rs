//! 저장소 어댑터.
//!
//! 이 crate는 다음을 제공합니다:
//! - PostgreSQL 종목/가격/분석 저장소 (UNNEST 일괄 upsert)
//! - Redis 키-값 캐시 (토큰, 재개 커서)
//! - 로컬 실행과 테스트용 메모리 캐시

pub mod error;
pub mod storage;

pub use error::{DataError, Result};

pub use storage::memory::MemoryCache;
pub use storage::postgres::{
    Database, DatabaseConfig, PgAnalysisStore, PgPriceStore, PgSymbolRepository,
};
pub use storage::redis::{RedisCache, RedisConfig};
