//! 통합 테스트용 in-memory 협력자.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use ingest_core::{
    AnalysisProjection, AnalysisSink, PipelineConfig, PriceRecord, PriceSink, PriceSource,
    SourceError, StoreError, Symbol, SymbolRepository,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn record(code: &str, day: NaiveDate, close: i64) -> PriceRecord {
    let close = Decimal::from(close);
    PriceRecord {
        code: code.to_string(),
        date: day,
        open: close,
        high: close,
        low: close,
        close,
        volume: Decimal::from(1000),
        turnover_value: close * Decimal::from(1000),
        adjustment_factor: Decimal::ONE,
        adjusted_close: close,
    }
}

pub fn pipeline_config(workers: usize, batch_size: usize) -> PipelineConfig {
    PipelineConfig {
        workers: Some(workers),
        batch_size,
        ..Default::default()
    }
}

// =============================================================================
// 종목 저장소
// =============================================================================

#[derive(Default)]
pub struct MemorySymbolRepository {
    symbols: Mutex<BTreeMap<String, Symbol>>,
}

impl MemorySymbolRepository {
    pub fn with_codes(codes: &[&str]) -> Self {
        let symbols = codes
            .iter()
            .map(|code| (code.to_string(), Symbol::new(*code, format!("Company {code}"))))
            .collect();
        Self {
            symbols: Mutex::new(symbols),
        }
    }

    pub async fn codes(&self) -> Vec<String> {
        self.symbols.lock().await.keys().cloned().collect()
    }

    pub async fn get(&self, code: &str) -> Option<Symbol> {
        self.symbols.lock().await.get(code).cloned()
    }
}

#[async_trait]
impl SymbolRepository for MemorySymbolRepository {
    async fn find_page_from_cursor(
        &self,
        cursor: &str,
        limit: usize,
    ) -> Result<Vec<Symbol>, StoreError> {
        let symbols = self.symbols.lock().await;
        Ok(symbols
            .range::<str, _>((Bound::Excluded(cursor), Bound::Unbounded))
            .take(limit)
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn upsert_symbols(&self, symbols: &[Symbol]) -> Result<usize, StoreError> {
        let mut stored = self.symbols.lock().await;
        for symbol in symbols {
            stored.insert(symbol.code.clone(), symbol.clone());
        }
        Ok(symbols.len())
    }
}

// =============================================================================
// sink
// =============================================================================

/// `(code, date)` 키로 upsert 하는 기록용 sink. 두 sink trait 모두 구현합니다.
pub struct RecordingSink<T> {
    rows: Mutex<BTreeMap<(String, NaiveDate), T>>,
    batches: Mutex<Vec<usize>>,
    fail: AtomicBool,
}

impl<T> Default for RecordingSink<T> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            batches: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }
}

impl<T: Clone> RecordingSink<T> {
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn row_count(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn rows(&self) -> Vec<T> {
        self.rows.lock().await.values().cloned().collect()
    }

    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().await.clone()
    }

    pub async fn calls(&self) -> usize {
        self.batches.lock().await.len()
    }

    async fn store(&self, items: Vec<((String, NaiveDate), T)>) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Write("sink unavailable".to_string()));
        }
        self.batches.lock().await.push(items.len());
        self.rows.lock().await.extend(items);
        Ok(())
    }
}

pub type PriceStore = RecordingSink<PriceRecord>;
pub type AnalysisStore = RecordingSink<AnalysisProjection>;

#[async_trait]
impl PriceSink for RecordingSink<PriceRecord> {
    async fn upsert_batch(&self, records: &[PriceRecord]) -> Result<(), StoreError> {
        self.store(
            records
                .iter()
                .map(|r| ((r.code.clone(), r.date), r.clone()))
                .collect(),
        )
        .await
    }
}

#[async_trait]
impl AnalysisSink for RecordingSink<AnalysisProjection> {
    async fn upsert_batch(&self, records: &[AnalysisProjection]) -> Result<(), StoreError> {
        self.store(
            records
                .iter()
                .map(|r| ((r.code.clone(), r.date), r.clone()))
                .collect(),
        )
        .await
    }
}

// =============================================================================
// 가격 소스
// =============================================================================

/// 고정 응답을 돌려주며 동시 호출 수를 기록하는 소스.
#[derive(Default)]
pub struct StaticPriceSource {
    prices: HashMap<String, Vec<PriceRecord>>,
    transient_failures: HashSet<String>,
    fatal_failures: HashSet<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// `code`에 `days`개의 연속 일봉을 등록합니다.
    pub fn with_rows(mut self, code: &str, days: u32) -> Self {
        let rows = (1..=days)
            .map(|d| record(code, date(2024, 1, d), 1000 + i64::from(d)))
            .collect();
        self.prices.insert(code.to_string(), rows);
        self
    }

    pub fn with_transient_failure(mut self, code: &str) -> Self {
        self.transient_failures.insert(code.to_string());
        self
    }

    pub fn with_fatal_failure(mut self, code: &str) -> Self {
        self.fatal_failures.insert(code.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    async fn daily_prices(
        &self,
        code: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PriceRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fatal_failures.contains(code) {
            return Err(SourceError::Unauthorized(format!("{code}: 401 after re-authentication")));
        }
        if self.transient_failures.contains(code) {
            return Err(SourceError::Fetch(format!("{code}: HTTP 500")));
        }
        Ok(self.prices.get(code).cloned().unwrap_or_default())
    }
}

/// 응답하지 않는 소스 (취소 테스트용).
pub struct PendingSource;

#[async_trait]
impl PriceSource for PendingSource {
    async fn daily_prices(
        &self,
        _code: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PriceRecord>, SourceError> {
        std::future::pending().await
    }
}
