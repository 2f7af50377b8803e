//! sink 쓰기용 배치 버퍼.
//!
//! 원본 레코드와 분석 프로젝션은 각자의 버퍼에 쌓이고, 버퍼가 가득 차면
//! 자기 sink로만 독립적으로 플러시됩니다. 두 버퍼는 같은 타입
//! [`BatchBuffer`]이며 같은 `flush()`로 비워집니다.

use async_trait::async_trait;
use ingest_core::{AnalysisProjection, AnalysisSink, PriceRecord, PriceSink, StoreError};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// 항목 묶음을 받아 쓰는 대상.
#[async_trait]
pub trait BatchWriter<T: Sync>: Send + Sync {
    /// 대상 이름 (로그용)
    fn target(&self) -> &'static str;

    async fn write_batch(&self, items: &[T]) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: PriceSink + ?Sized> BatchWriter<PriceRecord> for S {
    fn target(&self) -> &'static str {
        "daily_price"
    }

    async fn write_batch(&self, items: &[PriceRecord]) -> Result<(), StoreError> {
        self.upsert_batch(items).await
    }
}

#[async_trait]
impl<S: AnalysisSink + ?Sized> BatchWriter<AnalysisProjection> for S {
    fn target(&self) -> &'static str {
        "daily_price_analysis"
    }

    async fn write_batch(&self, items: &[AnalysisProjection]) -> Result<(), StoreError> {
        self.upsert_batch(items).await
    }
}

/// 고정 크기 배치 버퍼.
pub struct BatchBuffer<T, W: ?Sized> {
    items: Vec<T>,
    capacity: usize,
    written: usize,
    writer: Arc<W>,
    _marker: PhantomData<fn(T)>,
}

impl<T, W> BatchBuffer<T, W>
where
    T: Send + Sync,
    W: BatchWriter<T> + ?Sized,
{
    pub fn new(writer: Arc<W>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            written: 0,
            writer,
            _marker: PhantomData,
        }
    }

    /// 항목 추가. 가득 차면 즉시 플러시합니다.
    pub async fn push(&mut self, item: T) -> Result<(), StoreError> {
        self.items.push(item);
        if self.items.len() >= self.capacity {
            self.flush().await?;
        }
        Ok(())
    }

    /// 남은 항목을 모두 씁니다. 비어 있으면 sink를 호출하지 않습니다.
    ///
    /// 실패 시 버퍼는 유지되며 이미 쓴 배치는 되돌리지 않습니다.
    pub async fn flush(&mut self) -> Result<usize, StoreError> {
        if self.items.is_empty() {
            return Ok(0);
        }

        let count = self.items.len();
        let target = self.writer.target();
        self.writer
            .write_batch(&self.items)
            .await
            .map_err(|e| e.with_target(target))?;
        self.items.clear();
        self.written += count;

        debug!(target_table = target, count, "Batch flushed");
        Ok(count)
    }

    /// 대기 중인 항목 수.
    pub fn pending(&self) -> usize {
        self.items.len()
    }

    /// 지금까지 쓴 항목 수.
    pub fn written(&self) -> usize {
        self.written
    }
}
