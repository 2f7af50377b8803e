//! 설정 관리.
//!
//! 선택적 TOML 파일과 `INGEST__` 접두사 환경 변수에서 설정을 로드합니다.
//! 모든 항목에 기본값이 있으므로 파일 없이도 실행할 수 있습니다.
//!
//! ```text
//! INGEST__JOBS__DAILY__PAGE_LIMIT=4000
//! INGEST__PIPELINE__WORKERS=8
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{CoreError, CoreResult, JobKind};

/// 전체 수집 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestConfig {
    /// 업스트림 API 설정
    pub upstream: UpstreamSettings,
    /// 캐시 TTL 설정
    pub cache: CacheSettings,
    /// 파이프라인 설정
    pub pipeline: PipelineConfig,
    /// 작업 유형별 설정
    pub jobs: JobsConfig,
    /// 종목 마스터 동기화 설정
    pub symbol_sync: SymbolSyncConfig,
    /// 저장소 연결 설정
    pub storage: StorageConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 업스트림 API 설정 (자격증명 제외).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.jquants.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

/// 캐시 TTL 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// 리프레시 토큰 TTL (초, 기본 7일)
    pub refresh_token_ttl_secs: u64,
    /// 세션 토큰 TTL (초, 기본 24시간)
    pub session_token_ttl_secs: u64,
    /// 재개 커서 TTL (초, 기본 2시간)
    pub cursor_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            refresh_token_ttl_secs: 7 * 24 * 60 * 60,
            session_token_ttl_secs: 24 * 60 * 60,
            cursor_ttl_secs: 2 * 60 * 60,
        }
    }
}

impl CacheSettings {
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }

    pub fn session_token_ttl(&self) -> Duration {
        Duration::from_secs(self.session_token_ttl_secs)
    }

    pub fn cursor_ttl(&self) -> Duration {
        Duration::from_secs(self.cursor_ttl_secs)
    }
}

/// 파이프라인 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 워커 수 (미지정 시 사용 가능한 CPU 코어 수)
    pub workers: Option<usize>,
    /// sink 플러시 단위
    pub batch_size: usize,
    /// 워커당 출력 채널 버퍼
    pub output_buffer_per_worker: usize,
    /// 출력 채널 버퍼 상한
    pub output_buffer_max: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: None,
            batch_size: 100,
            output_buffer_per_worker: 10,
            output_buffer_max: 1000,
        }
    }
}

impl PipelineConfig {
    /// 실제 워커 수를 반환합니다.
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|w| *w > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }

    /// 출력 채널 용량: `min(workers × per_worker, max)`.
    pub fn output_capacity(&self, workers: usize) -> usize {
        (workers * self.output_buffer_per_worker)
            .min(self.output_buffer_max)
            .max(1)
    }
}

/// 작업 하나의 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobConfig {
    /// 한 번의 실행에서 처리할 최대 종목 수
    pub page_limit: usize,
    /// 조회 기간 (일)
    pub lookback_days: i64,
}

/// 작업 유형별 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JobsConfig {
    /// 일일 수집: 전체 종목을 한 페이지로, 약 1개월
    pub daily: JobConfig,
    /// 과거 수집: 종목당 비용이 크므로 작은 페이지, 약 5년
    pub historical: JobConfig,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            daily: JobConfig {
                page_limit: 4000,
                lookback_days: 31,
            },
            historical: JobConfig {
                page_limit: 200,
                lookback_days: 5 * 365 + 1,
            },
        }
    }
}

impl JobsConfig {
    /// 작업 유형에 해당하는 설정.
    pub fn for_job(&self, job: JobKind) -> &JobConfig {
        match job {
            JobKind::Daily => &self.daily,
            JobKind::Historical => &self.historical,
        }
    }
}

/// 종목 마스터 동기화 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SymbolSyncConfig {
    /// 동기화할 시장 코드 (비어 있으면 전체)
    pub market_codes: Vec<String>,
}

/// 저장소 연결 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// PostgreSQL URL
    pub database_url: Option<String>,
    /// Redis URL (미지정 시 인메모리 캐시)
    pub redis_url: Option<String>,
    /// 최대 DB 연결 수
    pub max_connections: u32,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl IngestConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let jobs = JobsConfig::default();
        // 작업별 기본값은 부분 오버라이드 시에도 유지되어야 함
        let mut builder = config::Config::builder()
            .set_default("jobs.daily.page_limit", jobs.daily.page_limit as i64)?
            .set_default("jobs.daily.lookback_days", jobs.daily.lookback_days)?
            .set_default("jobs.historical.page_limit", jobs.historical.page_limit as i64)?
            .set_default("jobs.historical.lookback_days", jobs.historical.lookback_days)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        // 환경 변수로 오버라이드
        builder = builder.add_source(
            config::Environment::with_prefix("INGEST")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("symbol_sync.market_codes")
                .try_parsing(true),
        );

        let config: IngestConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 설정 값의 일관성을 검증합니다.
    pub fn validate(&self) -> CoreResult<()> {
        for job in JobKind::ALL {
            let job_config = self.jobs.for_job(job);
            if job_config.page_limit == 0 {
                return Err(CoreError::Config(format!(
                    "jobs.{}.page_limit must be positive",
                    job
                )));
            }
            if job_config.lookback_days <= 0 {
                return Err(CoreError::Config(format!(
                    "jobs.{}.lookback_days must be positive",
                    job
                )));
            }
        }

        if self.pipeline.batch_size == 0 {
            return Err(CoreError::Config(
                "pipeline.batch_size must be positive".to_string(),
            ));
        }

        if self.cache.cursor_ttl_secs == 0 {
            return Err(CoreError::Config(
                "cache.cursor_ttl_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
