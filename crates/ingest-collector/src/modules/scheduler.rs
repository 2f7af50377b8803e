//! 커서 기반 배치 스케줄러.
//!
//! 실행 한 번은 다음 순서를 따릅니다:
//! 1. 작업의 커서 조회 (없으면 처음부터)
//! 2. 커서 다음 종목을 최대 `page_limit`개 조회
//! 3. 페이지를 파이프라인에 전달
//! 4. 파이프라인이 성공한 경우에만 커서를 페이지의 마지막 종목으로 전진
//!
//! 빈 페이지는 성공입니다. 커서는 그대로 두고 sink도 호출하지 않습니다.

use chrono::NaiveDate;
use ingest_core::{JobKind, JobsConfig, SymbolRepository};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use super::cursor::ResumeCursor;
use super::pipeline::{DateWindow, Pipeline};
use crate::{CollectionStats, Result};

/// 실행 결과 보고.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub job: JobKind,
    pub cursor_before: String,
    pub cursor_after: String,
    /// 이번 실행에서 처리한 종목 수
    pub page_size: usize,
    pub stats: CollectionStats,
}

impl RunReport {
    /// 커서가 전진했는지 확인.
    pub fn advanced(&self) -> bool {
        self.cursor_after != self.cursor_before
    }
}

/// 배치 스케줄러.
pub struct BatchScheduler {
    symbols: Arc<dyn SymbolRepository>,
    cursor: ResumeCursor,
    pipeline: Pipeline,
    jobs: JobsConfig,
    end_date: Option<NaiveDate>,
}

impl BatchScheduler {
    pub fn new(
        symbols: Arc<dyn SymbolRepository>,
        cursor: ResumeCursor,
        pipeline: Pipeline,
        jobs: JobsConfig,
    ) -> Self {
        Self {
            symbols,
            cursor,
            pipeline,
            jobs,
            end_date: None,
        }
    }

    /// 조회 종료일 고정 (기본: 도쿄 기준 오늘).
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// 작업 한 번 실행.
    pub async fn run(&self, job: JobKind, cancel: &CancellationToken) -> Result<RunReport> {
        let span = ingest_core::ingest_span!("batch_run", job);
        self.run_inner(job, cancel).instrument(span).await
    }

    async fn run_inner(&self, job: JobKind, cancel: &CancellationToken) -> Result<RunReport> {
        let job_config = self.jobs.for_job(job);
        let cursor_before = self.cursor.load(job).await?;

        let page = self
            .symbols
            .find_page_from_cursor(&cursor_before, job_config.page_limit)
            .await?;

        let Some(last_code) = page.last().map(|s| s.code.clone()) else {
            info!(cursor = %cursor_before, "수집할 종목이 없습니다");
            return Ok(RunReport {
                job,
                cursor_after: cursor_before.clone(),
                cursor_before,
                page_size: 0,
                stats: CollectionStats::new(),
            });
        };

        let page_size = page.len();
        let end = self
            .end_date
            .unwrap_or_else(ingest_upstream::calendar::market_today);
        let window = DateWindow::lookback(end, job_config.lookback_days);

        info!(
            cursor = %cursor_before,
            page_size,
            last = %last_code,
            from = %window.from,
            to = %window.to,
            "Page dispatched"
        );

        let stats = self.pipeline.run(page, window, cancel).await?;

        let cursor_after = if last_code > cursor_before {
            self.cursor.advance(job, &last_code).await?;
            last_code
        } else {
            warn!(cursor = %cursor_before, last = %last_code, "Page did not move past cursor");
            cursor_before.clone()
        };

        Ok(RunReport {
            job,
            cursor_before,
            cursor_after,
            page_size,
            stats,
        })
    }

    /// 현재 커서 조회.
    pub async fn cursor(&self, job: JobKind) -> Result<String> {
        self.cursor.load(job).await
    }

    /// 커서 초기화.
    pub async fn reset_cursor(&self, job: JobKind) -> Result<bool> {
        self.cursor.reset(job).await
    }
}
