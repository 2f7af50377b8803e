//! 수집기 설정 모듈.
//!
//! 파일/`INGEST__*` 환경변수 기반 [`IngestConfig`] 위에 수집기 전용 값을
//! 더합니다. 연결 문자열은 관례적인 `DATABASE_URL`, `REDIS_URL`도 읽습니다.

use ingest_core::IngestConfig;
use std::path::Path;
use std::time::Duration;

use crate::{CollectorError, Result};

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 공통 수집 설정
    pub ingest: IngestConfig,
    /// 데이터베이스 URL
    pub database_url: Option<String>,
    /// Redis URL (없으면 메모리 캐시)
    pub redis_url: Option<String>,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 워크플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 설정 파일(선택)과 환경변수에서 설정 로드
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let ingest = IngestConfig::load(path)?;
        let database_url = ingest
            .storage
            .database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok());
        let redis_url = ingest
            .storage
            .redis_url
            .clone()
            .or_else(|| std::env::var("REDIS_URL").ok())
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            ingest,
            database_url,
            redis_url,
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 60),
            },
        })
    }

    /// 데이터베이스 URL (필수인 명령용)
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })
    }
}

impl DaemonConfig {
    /// 워크플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1) * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
