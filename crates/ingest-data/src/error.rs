//! 데이터 모듈 오류 타입.

use ingest_core::{CacheError, StoreError};
use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 데이터 삽입 오류
    #[error("Insert error: {0}")]
    InsertError(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 캐시 오류
    #[error("Cache error: {0}")]
    CacheError(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                DataError::ConnectionError(err.to_string())
            }
            // 제약 조건 위반은 upsert 배치 쓰기 실패
            sqlx::Error::Database(db_err) if db_err.constraint().is_some() => {
                DataError::InsertError(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for DataError {
    fn from(err: redis::RedisError) -> Self {
        DataError::CacheError(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<DataError> for StoreError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::ConnectionError(_) | DataError::PoolExhausted => {
                StoreError::Unavailable(err.to_string())
            }
            DataError::InsertError(_) => StoreError::Write(err.to_string()),
            other => StoreError::Read(other.to_string()),
        }
    }
}

impl From<DataError> for CacheError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::SerializationError(msg) => CacheError::InvalidValue(msg),
            other => CacheError::Backend(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_exhaustion_is_unavailable() {
        let store: StoreError = DataError::PoolExhausted.into();
        assert!(matches!(store, StoreError::Unavailable(_)));

        let store: StoreError = DataError::InsertError("constraint".into()).into();
        assert!(matches!(store, StoreError::Write(_)));
    }

    #[test]
    fn test_closed_pool_is_connection_error() {
        let err: DataError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DataError::ConnectionError(_)));
        assert!(matches!(StoreError::from(err), StoreError::Unavailable(_)));
    }

    #[test]
    fn test_cache_error_mapping() {
        let cache: CacheError = DataError::CacheError("refused".into()).into();
        assert!(matches!(cache, CacheError::Backend(_)));
    }
}
