//! 파이프라인 통합 테스트.

mod common;

use common::*;
use ingest_collector::modules::{DateWindow, Pipeline};
use ingest_collector::CollectorError;
use ingest_core::{SourceError, StoreError, Symbol};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn window() -> DateWindow {
    DateWindow::lookback(date(2024, 1, 31), 31)
}

fn symbols(codes: &[&str]) -> Vec<Symbol> {
    codes.iter().map(|c| Symbol::new(*c, "test")).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_concurrency_is_bounded() {
    let codes: Vec<String> = (1..=20).map(|i| format!("{}", 1000 + i)).collect();
    let code_refs: Vec<&str> = codes.iter().map(String::as_str).collect();

    let mut source = StaticPriceSource::new().with_delay(Duration::from_millis(20));
    for code in &code_refs {
        source = source.with_rows(code, 1);
    }
    let source = Arc::new(source);
    let prices = Arc::new(PriceStore::default());
    let analysis = Arc::new(AnalysisStore::default());

    let pipeline = Pipeline::new(
        source.clone(),
        prices.clone(),
        analysis.clone(),
        pipeline_config(3, 100),
    );
    let stats = pipeline
        .run(symbols(&code_refs), window(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(source.calls(), 20);
    assert!(source.max_in_flight() <= 3, "max in flight {}", source.max_in_flight());
    assert!(source.max_in_flight() >= 1);
    assert_eq!(stats.total, 20);
    assert_eq!(stats.success, 20);
    assert_eq!(prices.row_count().await, 20);
    assert_eq!(analysis.row_count().await, 20);
}

#[tokio::test]
async fn test_buffers_flush_at_batch_size_and_remainder() {
    let source = Arc::new(StaticPriceSource::new().with_rows("1301", 7));
    let prices = Arc::new(PriceStore::default());
    let analysis = Arc::new(AnalysisStore::default());

    let pipeline = Pipeline::new(source, prices.clone(), analysis.clone(), pipeline_config(2, 3));
    let stats = pipeline
        .run(symbols(&["1301"]), window(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(prices.batch_sizes().await, vec![3, 3, 1]);
    assert_eq!(analysis.batch_sizes().await, vec![3, 3, 1]);
    assert_eq!(stats.records_written, 7);
    assert_eq!(stats.projections_written, 7);
}

#[tokio::test]
async fn test_buffers_flush_to_their_own_sink() {
    let source = Arc::new(StaticPriceSource::new().with_rows("1301", 7));
    let prices = Arc::new(PriceStore::default());
    let analysis = Arc::new(AnalysisStore::failing());

    let pipeline = Pipeline::new(source, prices.clone(), analysis.clone(), pipeline_config(1, 3));
    let err = pipeline
        .run(symbols(&["1301"]), window(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CollectorError::Data(StoreError::Write(_))));
    assert!(err.to_string().contains("daily_price_analysis"), "{err}");
    // 분석 sink 실패와 무관하게 원본 배치는 이미 쓰였고 되돌리지 않음
    assert_eq!(prices.batch_sizes().await, vec![3]);
    assert_eq!(analysis.calls().await, 0);
}

#[tokio::test]
async fn test_empty_and_failed_symbols_are_counted_and_skipped() {
    let source = Arc::new(
        StaticPriceSource::new()
            .with_rows("1001", 2)
            .with_transient_failure("1002"),
    );
    let prices = Arc::new(PriceStore::default());
    let analysis = Arc::new(AnalysisStore::default());

    let pipeline = Pipeline::new(source, prices.clone(), analysis.clone(), pipeline_config(2, 100));
    let stats = pipeline
        .run(symbols(&["1001", "1002", "1003"]), window(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.empty, 1);
    assert_eq!(prices.row_count().await, 2);
}

#[tokio::test]
async fn test_fatal_source_error_aborts_run() {
    let source = Arc::new(
        StaticPriceSource::new()
            .with_rows("1001", 2)
            .with_fatal_failure("1002"),
    );
    let prices = Arc::new(PriceStore::default());
    let analysis = Arc::new(AnalysisStore::default());

    let pipeline = Pipeline::new(source, prices.clone(), analysis, pipeline_config(1, 100));
    let err = pipeline
        .run(symbols(&["1001", "1002", "1003"]), window(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CollectorError::Source(SourceError::Unauthorized(_))));
    assert!(err.to_string().contains("1002"), "{err}");
    // 남은 배치는 플러시되지 않음
    assert_eq!(prices.calls().await, 0);
}

#[tokio::test]
async fn test_cancelled_token_aborts_before_dispatch() {
    let source = Arc::new(StaticPriceSource::new().with_rows("1001", 1));
    let prices = Arc::new(PriceStore::default());
    let analysis = Arc::new(AnalysisStore::default());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let pipeline = Pipeline::new(source.clone(), prices.clone(), analysis, pipeline_config(2, 100));
    let err = pipeline
        .run(symbols(&["1001"]), window(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, CollectorError::Cancelled));
    assert_eq!(source.calls(), 0);
    assert_eq!(prices.calls().await, 0);
}

#[tokio::test]
async fn test_cancellation_interrupts_blocked_workers() {
    let prices = Arc::new(PriceStore::default());
    let analysis = Arc::new(AnalysisStore::default());
    let pipeline = Pipeline::new(
        Arc::new(PendingSource),
        prices.clone(),
        analysis,
        pipeline_config(2, 100),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline.run(symbols(&["1001", "1002", "1003"]), window(), &cancel),
    )
    .await
    .expect("pipeline did not observe cancellation");

    assert!(matches!(result, Err(CollectorError::Cancelled)));
    assert_eq!(prices.calls().await, 0);
}

#[tokio::test]
async fn test_empty_page_touches_nothing() {
    let source = Arc::new(StaticPriceSource::new());
    let prices = Arc::new(PriceStore::default());
    let analysis = Arc::new(AnalysisStore::default());

    let pipeline = Pipeline::new(source.clone(), prices.clone(), analysis.clone(), pipeline_config(2, 100));
    let stats = pipeline
        .run(Vec::new(), window(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.total, 0);
    assert_eq!(source.calls(), 0);
    assert_eq!(prices.calls().await, 0);
    assert_eq!(analysis.calls().await, 0);
}
