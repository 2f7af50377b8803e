//! 종목 마스터 동기화 모듈.
//!
//! 업스트림 상장 종목 목록을 종목 저장소에 upsert 합니다. 배치 스케줄러는
//! 이 저장소를 페이지 단위로 읽으므로, 수집 전에 한 번 이상 실행되어야 합니다.

use ingest_core::{SymbolRepository, SymbolSyncConfig};
use ingest_upstream::UpstreamClient;
use std::time::Instant;

use crate::{CollectionStats, Result};

/// 종목 정보 동기화
///
/// `market_codes`가 비어 있으면 모든 시장을 받아들입니다.
pub async fn sync_symbols(
    client: &UpstreamClient,
    repository: &dyn SymbolRepository,
    config: &SymbolSyncConfig,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!(markets = ?config.market_codes, "종목 동기화 시작");

    let listed = client.listed_symbols().await?;
    stats.total = listed.len();

    let symbols: Vec<_> = listed
        .into_iter()
        .filter(|s| s.is_in_markets(&config.market_codes))
        .collect();
    stats.skipped = stats.total - symbols.len();

    if symbols.is_empty() {
        tracing::warn!("동기화할 종목이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let affected = repository.upsert_symbols(&symbols).await?;
    stats.success = symbols.len();

    tracing::info!(
        listed = stats.total,
        kept = symbols.len(),
        affected,
        "종목 동기화 완료"
    );

    stats.elapsed = start.elapsed();
    Ok(stats)
}
