//! 종목 동기화 / 재무제표 조회 통합 테스트 (모의 업스트림 서버).

mod common;

use common::*;
use ingest_collector::modules::{fetch_statements, sync_symbols};
use ingest_collector::CollectorError;
use ingest_core::{KeyValueCache, SymbolSyncConfig};
use ingest_data::MemoryCache;
use ingest_upstream::{TokenKind, UpstreamClient, UpstreamConfig};
use mockito::{Matcher, Server, ServerGuard};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn client(server: &ServerGuard) -> UpstreamClient {
    let cache = Arc::new(MemoryCache::new());
    cache
        .set_with_ttl(TokenKind::Refresh.cache_key(), "refresh-1", Duration::from_secs(600))
        .await
        .unwrap();
    cache
        .set_with_ttl(TokenKind::Session.cache_key(), "session-1", Duration::from_secs(600))
        .await
        .unwrap();

    let config = UpstreamConfig::new("ops@example.com", "pw").with_base_url(server.url());
    UpstreamClient::new(config, cache).unwrap()
}

#[tokio::test]
async fn test_sync_keeps_configured_markets() {
    let mut server = Server::new_async().await;
    let listed = server
        .mock("GET", "/listed/info")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer session-1")
        .with_status(200)
        .with_body(
            json!({
                "info": [
                    {"Code": "13010", "CompanyName": "極洋", "MarketCode": "0111", "MarketCodeName": "プライム"},
                    {"Code": "72030", "CompanyName": "トヨタ自動車", "CompanyNameEnglish": "TOYOTA MOTOR", "MarketCode": "0111"},
                    {"Code": "99990", "CompanyName": "Growth Co", "MarketCode": "0113"}
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = client(&server).await;
    let repository = MemorySymbolRepository::default();
    let config = SymbolSyncConfig {
        market_codes: vec!["0111".to_string()],
    };

    let stats = sync_symbols(&client, &repository, &config).await.unwrap();

    listed.assert_async().await;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.success, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(repository.codes().await, vec!["1301", "7203"]);

    let toyota = repository.get("7203").await.unwrap();
    assert_eq!(toyota.name_en.as_deref(), Some("TOYOTA MOTOR"));
    assert_eq!(toyota.market_code.as_deref(), Some("0111"));
}

#[tokio::test]
async fn test_sync_without_market_filter_keeps_all() {
    let mut server = Server::new_async().await;
    let _listed = server
        .mock("GET", "/listed/info")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "info": [
                    {"Code": "13010", "CompanyName": "A", "MarketCode": "0111"},
                    {"Code": "99990", "CompanyName": "B", "MarketCode": "0113"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client(&server).await;
    let repository = MemorySymbolRepository::with_codes(&["1301"]);

    let stats = sync_symbols(&client, &repository, &SymbolSyncConfig::default())
        .await
        .unwrap();

    assert_eq!(stats.success, 2);
    assert_eq!(stats.skipped, 0);
    assert_eq!(repository.codes().await, vec!["1301", "9999"]);
    assert_eq!(repository.get("1301").await.unwrap().name, "A");
}

#[tokio::test]
async fn test_statements_sorted_by_disclosure() {
    let mut server = Server::new_async().await;
    let _statements = server
        .mock("GET", "/fins/statements")
        .match_query(Matcher::UrlEncoded("code".into(), "7203".into()))
        .with_status(200)
        .with_body(
            json!({
                "statements": [
                    {"DisclosedDate": "2024-05-08", "LocalCode": "72030", "TypeOfCurrentPeriod": "FY",
                     "NetSales": "45095325000000", "OperatingProfit": "5352934000000", "Profit": "",
                     "EarningsPerShare": "365.94"},
                    {"DisclosedDate": "2024-02-06", "LocalCode": "72030", "TypeOfCurrentPeriod": "3Q",
                     "NetSales": "34040200000000"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client(&server).await;
    let statements = fetch_statements(&client, "7203").await.unwrap();

    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].disclosed_date, date(2024, 2, 6));
    assert_eq!(statements[0].type_of_current_period, "3Q");
    assert_eq!(statements[1].code, "7203");
    assert_eq!(statements[1].earnings_per_share, Some(dec!(365.94)));
    assert_eq!(statements[1].profit, None);
}

#[tokio::test]
async fn test_statements_require_code() {
    let server = Server::new_async().await;
    let client = client(&server).await;

    let err = fetch_statements(&client, "  ").await.unwrap_err();
    assert!(matches!(err, CollectorError::Config(_)));
}
