//! 일봉 수집기 CLI.

use clap::{Parser, Subcommand};
use ingest_collector::modules::{self, BatchScheduler, Pipeline, ResumeCursor};
use ingest_collector::{CollectorConfig, CollectorError};
use ingest_core::{init_logging, JobKind, KeyValueCache, LogConfig};
use ingest_data::{Database, DatabaseConfig, MemoryCache, RedisCache, RedisConfig};
use ingest_upstream::{UpstreamClient, UpstreamConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "ingest-collector")]
#[command(about = "Resumable daily equity price collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로 (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 일일 수집 (최근 약 1개월)
    Daily,

    /// 과거 수집 (약 5년)
    Historical,

    /// 종목 마스터 동기화
    SyncSymbols,

    /// 재무제표 조회 (JSON 출력)
    Statements {
        /// 종목 코드 (예: "7203")
        #[arg(long)]
        code: String,
    },

    /// 재개 커서 조회/초기화
    Cursor {
        #[command(subcommand)]
        action: CursorAction,
    },

    /// 데이터베이스 마이그레이션 실행
    Migrate,

    /// 데몬 모드: 주기적으로 종목 동기화 → 일일 수집 실행
    Daemon {
        /// 실행 주기 (분). 미지정 시 DAEMON_INTERVAL_MINUTES
        #[arg(long)]
        interval_minutes: Option<u64>,
    },
}

#[derive(Subcommand)]
enum CursorAction {
    /// 현재 커서 출력
    Show {
        /// 작업 유형 (daily, historical). 미지정 시 전체
        #[arg(long)]
        job: Option<JobKind>,
    },
    /// 커서 삭제 (다음 실행은 처음부터)
    Reset {
        #[arg(long)]
        job: Option<JobKind>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 설정 로드 (.env 포함)
    let config = CollectorConfig::load(cli.config.as_deref())?;

    // 로깅 초기화
    let mut log_config = LogConfig::from_settings(&config.ingest.logging);
    if let Some(level) = cli.log_level.clone() {
        log_config.filter = level;
    }
    init_logging(log_config)?;

    tracing::info!("Ingest Collector 시작");

    // Ctrl-C → 실행 취소
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("종료 신호 수신, 실행 취소 중...");
                cancel.cancel();
            }
        });
    }

    let cache = connect_cache(&config).await?;

    match cli.command {
        Commands::Daily => {
            run_job(&config, cache, JobKind::Daily, &cancel).await?;
        }
        Commands::Historical => {
            run_job(&config, cache, JobKind::Historical, &cancel).await?;
        }
        Commands::SyncSymbols => {
            let db = connect_database(&config).await?;
            let client = build_client(&config, cache)?;
            let stats =
                modules::sync_symbols(&client, &db.symbols(), &config.ingest.symbol_sync).await?;
            stats.log_summary("종목 동기화");
            db.pool().close().await;
        }
        Commands::Statements { code } => {
            let client = build_client(&config, cache)?;
            let statements = modules::fetch_statements(&client, &code).await?;
            println!("{}", serde_json::to_string_pretty(&statements)?);
        }
        Commands::Cursor { action } => {
            let cursor = ResumeCursor::new(cache, config.ingest.cache.cursor_ttl());
            match action {
                CursorAction::Show { job } => {
                    for job in selected_jobs(job) {
                        let value = cursor.load(job).await?;
                        println!("{}\t{}", job, if value.is_empty() { "<start>" } else { value.as_str() });
                    }
                }
                CursorAction::Reset { job } => {
                    for job in selected_jobs(job) {
                        let removed = cursor.reset(job).await?;
                        println!("{}\t{}", job, if removed { "reset" } else { "not set" });
                    }
                }
            }
        }
        Commands::Migrate => {
            let db = connect_database(&config).await?;
            db.migrate().await?;
            db.pool().close().await;
        }
        Commands::Daemon { interval_minutes } => {
            let mut daemon = config.daemon.clone();
            if let Some(minutes) = interval_minutes {
                daemon.interval_minutes = minutes;
            }
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                daemon.interval_minutes
            );

            let db = connect_database(&config).await?;
            let client = Arc::new(build_client(&config, cache.clone())?);
            let scheduler = build_scheduler(&config, &db, client.clone(), cache);

            let mut interval = tokio::time::interval(daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::info!("=== 워크플로우 실행 시작 ===");

                        match modules::sync_symbols(&client, &db.symbols(), &config.ingest.symbol_sync).await {
                            Ok(stats) => stats.log_summary("종목 동기화"),
                            Err(e) => tracing::error!("종목 동기화 실패: {}", e),
                        }

                        match scheduler.run(JobKind::Daily, &cancel).await {
                            Ok(report) => report.stats.log_summary(JobKind::Daily.as_str()),
                            Err(CollectorError::Cancelled) => break,
                            Err(e) if e.is_fatal() => {
                                tracing::error!("치명적 오류로 데몬 종료: {}", e);
                                return Err(e.into());
                            }
                            Err(e) => tracing::error!("일일 수집 실패: {}", e),
                        }

                        tracing::info!(
                            "=== 워크플로우 완료, 다음 실행: {}분 후 ===",
                            daemon.interval_minutes
                        );
                    }
                }
            }

            db.pool().close().await;
        }
    }

    tracing::info!("Ingest Collector 종료");
    Ok(())
}

fn selected_jobs(job: Option<JobKind>) -> Vec<JobKind> {
    job.map(|j| vec![j]).unwrap_or_else(|| JobKind::ALL.to_vec())
}

/// Redis가 설정되어 있으면 Redis, 아니면 프로세스 메모리 캐시.
async fn connect_cache(
    config: &CollectorConfig,
) -> Result<Arc<dyn KeyValueCache>, CollectorError> {
    match &config.redis_url {
        Some(url) => {
            let redis = RedisCache::connect(&RedisConfig::new(url.clone())).await?;
            // 토큰/커서 저장소이므로 시작 시점에 응답을 확인
            if !redis.health_check().await? {
                return Err(CollectorError::Config(
                    "Redis PING에 PONG 응답이 없습니다".to_string(),
                ));
            }
            Ok(Arc::new(redis))
        }
        None => {
            tracing::warn!(
                "REDIS_URL이 설정되지 않아 메모리 캐시를 사용합니다 (토큰/커서가 프로세스 종료 시 사라짐)"
            );
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}

async fn connect_database(config: &CollectorConfig) -> Result<Database, CollectorError> {
    let url = config.require_database_url()?;
    let db_config = DatabaseConfig::new(url, config.ingest.storage.max_connections);
    let db = Database::connect(&db_config).await?;
    tracing::info!("데이터베이스 연결 성공");
    Ok(db)
}

fn build_client(
    config: &CollectorConfig,
    cache: Arc<dyn KeyValueCache>,
) -> Result<UpstreamClient, CollectorError> {
    let settings = &config.ingest.upstream;
    let mut upstream = UpstreamConfig::from_env()?.with_timeout_secs(settings.timeout_secs);
    if std::env::var("JQUANTS_BASE_URL").is_err() {
        upstream = upstream.with_base_url(settings.base_url.clone());
    }

    let cache_settings = &config.ingest.cache;
    Ok(UpstreamClient::with_token_ttl(
        upstream,
        cache,
        cache_settings.refresh_token_ttl(),
        cache_settings.session_token_ttl(),
    )?)
}

fn build_scheduler(
    config: &CollectorConfig,
    db: &Database,
    client: Arc<UpstreamClient>,
    cache: Arc<dyn KeyValueCache>,
) -> BatchScheduler {
    let pipeline = Pipeline::new(
        client,
        Arc::new(db.prices()),
        Arc::new(db.analysis()),
        config.ingest.pipeline.clone(),
    );
    BatchScheduler::new(
        Arc::new(db.symbols()),
        ResumeCursor::new(cache, config.ingest.cache.cursor_ttl()),
        pipeline,
        config.ingest.jobs.clone(),
    )
}

async fn run_job(
    config: &CollectorConfig,
    cache: Arc<dyn KeyValueCache>,
    job: JobKind,
    cancel: &CancellationToken,
) -> Result<(), CollectorError> {
    let db = connect_database(config).await?;
    let client = Arc::new(build_client(config, cache.clone())?);
    let scheduler = build_scheduler(config, &db, client, cache);

    let result = scheduler.run(job, cancel).await;
    db.pool().close().await;

    let report = result?;
    report.stats.log_summary(job.as_str());
    tracing::info!(
        job = %report.job,
        cursor_before = %report.cursor_before,
        cursor_after = %report.cursor_after,
        page_size = report.page_size,
        "실행 완료"
    );
    Ok(())
}
