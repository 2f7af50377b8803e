//! 시세 API 클라이언트.
//!
//! 모든 호출은 [`AuthorizedTransport`]를 거치므로 401 재인증 프로토콜이
//! 동일하게 적용됩니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use ingest_core::{
    FinancialStatement, KeyValueCache, PriceRecord, PriceSource, SourceError, Symbol, TradingDay,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::calendar::DATE_FORMAT;
use crate::mapping::{
    map_daily_quotes, DailyQuotesResponse, ListedInfoResponse, StatementsResponse,
};
use crate::token::{REFRESH_TOKEN_TTL, SESSION_TOKEN_TTL};
use crate::{
    AuthorizedTransport, Result, TokenManager, TradingCalendar, UpstreamConfig, UpstreamError,
};

/// 시세 API 클라이언트.
pub struct UpstreamClient {
    transport: Arc<AuthorizedTransport>,
    calendar: TradingCalendar,
}

impl UpstreamClient {
    /// 새로운 클라이언트 생성.
    ///
    /// 토큰은 주입된 캐시에 보관되며, 같은 캐시를 공유하는 프로세스들은
    /// 토큰을 재사용합니다.
    pub fn new(config: UpstreamConfig, cache: Arc<dyn KeyValueCache>) -> Result<Self> {
        Self::with_token_ttl(config, cache, REFRESH_TOKEN_TTL, SESSION_TOKEN_TTL)
    }

    /// 토큰 TTL을 지정하여 생성.
    pub fn with_token_ttl(
        config: UpstreamConfig,
        cache: Arc<dyn KeyValueCache>,
        refresh_ttl: Duration,
        session_ttl: Duration,
    ) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        let config = Arc::new(config);
        let tokens = Arc::new(
            TokenManager::new(config.clone(), http.clone(), cache).with_ttl(refresh_ttl, session_ttl),
        );
        Ok(Self::with_transport(Arc::new(AuthorizedTransport::new(
            config, http, tokens,
        ))))
    }

    /// 기존 전송 계층으로 생성.
    pub fn with_transport(transport: Arc<AuthorizedTransport>) -> Self {
        let calendar = TradingCalendar::new(transport.clone());
        Self {
            transport,
            calendar,
        }
    }

    /// 토큰 관리자 반환.
    pub fn tokens(&self) -> &Arc<TokenManager> {
        self.transport.tokens()
    }

    /// 거래일 캘린더 반환.
    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// 상장 종목 전체 조회.
    #[instrument(skip(self))]
    pub async fn listed_symbols(&self) -> Result<Vec<Symbol>> {
        let response: ListedInfoResponse = self.transport.get_json("/listed/info", &[]).await?;
        let symbols: Vec<Symbol> = response.info.into_iter().map(Symbol::from).collect();
        debug!(count = symbols.len(), "Fetched listed symbols");
        Ok(symbols)
    }

    /// 종목의 기간 일봉 조회.
    ///
    /// 종료일은 그 이하의 가장 최근 거래일로 보정되며, 보정 후 시작일이
    /// 종료일보다 늦으면 요청 없이 빈 목록을 반환합니다.
    #[instrument(skip(self))]
    pub async fn daily_prices(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceRecord>> {
        let to = self.calendar.latest_business_day(to).await?;
        if from > to {
            debug!(code, "Empty window after business-day adjustment");
            return Ok(Vec::new());
        }

        let mut rows = Vec::new();
        let mut pagination_key: Option<String> = None;
        loop {
            let mut query = vec![
                ("code", code.to_string()),
                ("from", from.format(DATE_FORMAT).to_string()),
                ("to", to.format(DATE_FORMAT).to_string()),
            ];
            if let Some(key) = pagination_key.take() {
                query.push(("pagination_key", key));
            }

            let page: DailyQuotesResponse = self
                .transport
                .get_json("/prices/daily_quotes", &query)
                .await?;
            rows.extend(page.daily_quotes);

            match page.pagination_key.filter(|k| !k.is_empty()) {
                Some(next) => pagination_key = Some(next),
                None => break,
            }
        }

        Ok(map_daily_quotes(rows))
    }

    /// 종목의 재무제표 조회.
    #[instrument(skip(self))]
    pub async fn statements(&self, code: &str) -> Result<Vec<FinancialStatement>> {
        let mut statements = Vec::new();
        let mut pagination_key: Option<String> = None;
        loop {
            let mut query = vec![("code", code.to_string())];
            if let Some(key) = pagination_key.take() {
                query.push(("pagination_key", key));
            }

            let page: StatementsResponse = self.transport.get_json("/fins/statements", &query).await?;
            statements.extend(page.statements.into_iter().map(FinancialStatement::from));

            match page.pagination_key.filter(|k| !k.is_empty()) {
                Some(next) => pagination_key = Some(next),
                None => break,
            }
        }
        Ok(statements)
    }

    /// 기간 내 거래일 캘린더 조회.
    pub async fn trading_calendar(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<TradingDay>> {
        self.calendar.fetch(from, to).await
    }
}

#[async_trait]
impl PriceSource for UpstreamClient {
    async fn daily_prices(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> std::result::Result<Vec<PriceRecord>, SourceError> {
        UpstreamClient::daily_prices(self, code, from, to)
            .await
            .map_err(SourceError::from)
    }
}
