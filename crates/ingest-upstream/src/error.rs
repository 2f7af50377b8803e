//! 업스트림 API 에러 타입.

use ingest_core::{CacheError, SourceError};
use thiserror::Error;

/// 업스트림 관련 에러.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// 네트워크/연결 에러
    #[error("Network error ({url}): {message}")]
    Network { url: String, message: String },

    /// 인증 실패 (재인증 후에도 401, 또는 자격증명 교환 실패)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 401 이외의 비정상 HTTP 상태
    #[error("HTTP {status} from {url}: {body}")]
    Status { status: u16, url: String, body: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    Parse(String),

    /// 토큰 캐시 에러
    #[error("Token cache error: {0}")]
    Cache(#[from] CacheError),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),
}

impl UpstreamError {
    /// reqwest 에러를 요청 URL과 함께 변환.
    pub fn network(url: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("timeout: {}", err)
        } else {
            err.to_string()
        };
        UpstreamError::Network {
            url: url.to_string(),
            message,
        }
    }

    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, UpstreamError::Unauthorized(_))
    }

    /// 실행 전체를 중단해야 하는 에러인지 확인.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            UpstreamError::Unauthorized(_) | UpstreamError::Cache(_) | UpstreamError::Config(_)
        )
    }

    /// HTTP 상태 코드 (있는 경우).
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<UpstreamError> for SourceError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unauthorized(msg) => SourceError::Unauthorized(msg),
            UpstreamError::Config(msg) => SourceError::Unauthorized(msg),
            UpstreamError::Cache(e) => SourceError::Cache(e.to_string()),
            other => SourceError::Fetch(other.to_string()),
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, UpstreamError>;
