//! Fan-out / fan-in 수집 파이프라인.
//!
//! 한 페이지의 종목을 고정 크기 워커 풀에 분배하고(fan-out), 워커가 보낸
//! 레코드를 단일 소비자가 두 개의 배치 버퍼로 모아 각 sink에 씁니다(fan-in).
//!
//! # 동시성 규칙
//!
//! - 입력 채널 용량 = 페이지 길이, 출력 채널 용량 = `min(workers × 10, 1000)`
//! - 모든 채널 송수신과 가격 조회는 취소 토큰과 함께 `select!` 됩니다
//! - 종목 단위 조회 실패는 건너뛰고, 인증/캐시 장애와 sink 실패는 실행 전체를 중단합니다
//! - 출력 채널이 닫힌 뒤에만 남은 배치를 플러시합니다
//!
//! 업스트림 호출 속도 제한은 없습니다. 동시 요청 수는 워커 수로만 제한됩니다.

use chrono::NaiveDate;
use ingest_core::{
    AnalysisProjection, AnalysisSink, PipelineConfig, PriceRecord, PriceSink, PriceSource, Symbol,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use super::batch::BatchBuffer;
use crate::{CollectionStats, CollectorError, Result};

type Row = (PriceRecord, AnalysisProjection);

/// 조회 기간 (양 끝 포함).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// `to`에서 `lookback_days`만큼 거슬러 올라간 기간.
    pub fn lookback(to: NaiveDate, lookback_days: i64) -> Self {
        let from = to
            .checked_sub_signed(chrono::Duration::days(lookback_days))
            .unwrap_or(NaiveDate::MIN);
        Self { from, to }
    }
}

/// 수집 파이프라인.
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn PriceSource>,
    price_sink: Arc<dyn PriceSink>,
    analysis_sink: Arc<dyn AnalysisSink>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn PriceSource>,
        price_sink: Arc<dyn PriceSink>,
        analysis_sink: Arc<dyn AnalysisSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            price_sink,
            analysis_sink,
            config,
        }
    }

    /// 한 페이지를 처리합니다.
    ///
    /// 성공은 모든 워커가 종료되고 두 버퍼가 모두 플러시되었음을 뜻합니다.
    /// 실패 시 일부 배치는 이미 쓰였을 수 있으나 되돌리지 않습니다.
    pub async fn run(
        &self,
        symbols: Vec<Symbol>,
        window: DateWindow,
        cancel: &CancellationToken,
    ) -> Result<CollectionStats> {
        let start = Instant::now();
        if cancel.is_cancelled() {
            return Err(CollectorError::Cancelled);
        }
        if symbols.is_empty() {
            return Ok(CollectionStats::new());
        }

        let workers = self.config.worker_count().min(symbols.len()).max(1);
        let output_capacity = self.config.output_capacity(workers);
        let token = cancel.child_token();

        info!(
            symbols = symbols.len(),
            workers,
            output_capacity,
            from = %window.from,
            to = %window.to,
            "Pipeline started"
        );

        // fan-out: 페이지 전체가 입력 채널에 들어갑니다
        let (input_tx, input_rx) = mpsc::channel::<Symbol>(symbols.len());
        for symbol in symbols {
            tokio::select! {
                _ = token.cancelled() => return Err(CollectorError::Cancelled),
                sent = input_tx.send(symbol) => {
                    if sent.is_err() {
                        return Err(CollectorError::Cancelled);
                    }
                }
            }
        }
        drop(input_tx);

        let input_rx = Arc::new(Mutex::new(input_rx));
        let (output_tx, output_rx) = mpsc::channel::<Row>(output_capacity);

        let mut join_set = JoinSet::new();
        for worker_id in 0..workers {
            let worker = Worker {
                source: self.source.clone(),
                input: input_rx.clone(),
                output: output_tx.clone(),
                token: token.clone(),
                window,
            };
            join_set.spawn(
                worker
                    .run()
                    .instrument(tracing::debug_span!("price_worker", worker_id)),
            );
        }
        drop(output_tx);

        // fan-in
        let fan_in = self.fan_in(output_rx, &token).await;
        if fan_in.is_err() {
            token.cancel();
        }

        let mut stats = CollectionStats::new();
        let mut worker_error: Option<CollectorError> = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(worker_stats)) => stats.merge(&worker_stats),
                Ok(Err(e)) => {
                    token.cancel();
                    worker_error.get_or_insert(e);
                }
                Err(join_err) => {
                    token.cancel();
                    worker_error.get_or_insert(CollectorError::Other(Box::new(join_err)));
                }
            }
        }

        let (records_written, projections_written) = match fan_in {
            // 워커가 먼저 실패했다면 그 에러가 취소의 원인
            Err(CollectorError::Cancelled) => {
                return Err(worker_error.unwrap_or(CollectorError::Cancelled))
            }
            Err(e) => return Err(e),
            Ok(written) => written,
        };
        if let Some(e) = worker_error {
            return Err(e);
        }

        stats.records_written = records_written;
        stats.projections_written = projections_written;
        stats.elapsed = start.elapsed();
        Ok(stats)
    }

    /// 출력 채널을 비우며 두 버퍼에 분배합니다. 쓴 (레코드, 프로젝션) 수를 반환합니다.
    async fn fan_in(
        &self,
        mut output: mpsc::Receiver<Row>,
        token: &CancellationToken,
    ) -> Result<(usize, usize)> {
        let batch_size = self.config.batch_size;
        let mut prices = BatchBuffer::new(self.price_sink.clone(), batch_size);
        let mut projections = BatchBuffer::new(self.analysis_sink.clone(), batch_size);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(CollectorError::Cancelled),
                row = output.recv() => match row {
                    Some((record, projection)) => {
                        prices.push(record).await?;
                        projections.push(projection).await?;
                    }
                    None => break,
                },
            }
        }

        prices.flush().await?;
        projections.flush().await?;

        debug!(
            records = prices.written(),
            projections = projections.written(),
            "Fan-in drained"
        );
        Ok((prices.written(), projections.written()))
    }
}

/// 입력 채널에서 종목을 꺼내 가격을 조회하는 워커.
struct Worker {
    source: Arc<dyn PriceSource>,
    input: Arc<Mutex<mpsc::Receiver<Symbol>>>,
    output: mpsc::Sender<Row>,
    token: CancellationToken,
    window: DateWindow,
}

impl Worker {
    async fn run(self) -> Result<CollectionStats> {
        let mut stats = CollectionStats::new();

        loop {
            let next = {
                let mut input = self.input.lock().await;
                tokio::select! {
                    _ = self.token.cancelled() => None,
                    symbol = input.recv() => symbol,
                }
            };
            let Some(symbol) = next else {
                break;
            };
            stats.total += 1;

            let fetched = tokio::select! {
                _ = self.token.cancelled() => break,
                result = self.source.daily_prices(&symbol.code, self.window.from, self.window.to) => result,
            };

            let records = match fetched {
                Ok(records) if records.is_empty() => {
                    stats.empty += 1;
                    debug!(symbol = %symbol.code, "데이터 없음");
                    continue;
                }
                Ok(records) => records,
                Err(e) if e.is_fatal() => {
                    warn!(symbol = %symbol.code, error = %e, "Fatal price source error, aborting run");
                    self.token.cancel();
                    return Err(e.with_symbol(&symbol.code).into());
                }
                Err(e) => {
                    stats.errors += 1;
                    warn!(symbol = %symbol.code, error = %e, "조회 실패, 건너뜀");
                    continue;
                }
            };

            stats.success += 1;
            debug!(symbol = %symbol.code, rows = records.len(), "Fetched daily prices");

            for record in records {
                let projection = record.to_projection();
                tokio::select! {
                    _ = self.token.cancelled() => return Ok(stats),
                    sent = self.output.send((record, projection)) => {
                        if sent.is_err() {
                            return Ok(stats);
                        }
                    }
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookback_window() {
        let to = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let window = DateWindow::lookback(to, 31);
        assert_eq!(window.from, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(window.to, to);
    }
}
