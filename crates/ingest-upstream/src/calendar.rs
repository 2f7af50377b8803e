//! 거래일 캘린더와 조회 종료일 보정.
//!
//! 주말은 항상 휴장입니다. 공휴일은 업스트림 캘린더에서 연 단위로 받아
//! 프로세스 메모리에 캐시합니다. 캘린더가 아직 공개되지 않은 연도는
//! 주말만 휴장으로 취급합니다.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use ingest_core::TradingDay;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::mapping::TradingCalendarResponse;
use crate::{AuthorizedTransport, Result, UpstreamError};

/// 종료일 보정 시 최대 후퇴 일수.
pub const MAX_LOOKBACK_STEPS: u32 = 31;

/// 업스트림 날짜 형식.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// 도쿄 시장 기준 오늘 날짜.
pub fn market_today() -> NaiveDate {
    Utc::now().with_timezone(&chrono_tz::Asia::Tokyo).date_naive()
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 거래일 캘린더.
pub struct TradingCalendar {
    transport: Arc<AuthorizedTransport>,
    /// 연도별 현물 휴장일 (주말 제외)
    closed: RwLock<HashMap<i32, HashSet<NaiveDate>>>,
    /// 연도 캘린더 조회를 프로세스 내에서 한 번으로 직렬화
    fill_lock: Mutex<()>,
}

impl TradingCalendar {
    /// 새로운 캘린더 생성.
    pub fn new(transport: Arc<AuthorizedTransport>) -> Self {
        Self {
            transport,
            closed: RwLock::new(HashMap::new()),
            fill_lock: Mutex::new(()),
        }
    }

    /// 기간 내 캘린더 조회.
    pub async fn fetch(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<TradingDay>> {
        let query = [
            ("from", from.format(DATE_FORMAT).to_string()),
            ("to", to.format(DATE_FORMAT).to_string()),
        ];
        let response: TradingCalendarResponse = self
            .transport
            .get_json("/markets/trading_calendar", &query)
            .await?;

        Ok(response
            .trading_calendar
            .into_iter()
            .filter_map(|row| row.into_trading_day())
            .collect())
    }

    /// 현물 거래일인지 확인.
    pub async fn is_trading_day(&self, date: NaiveDate) -> Result<bool> {
        if is_weekend(date) {
            return Ok(false);
        }

        let year = date.year();
        if let Some(is_open) = self.cached_is_open(year, date).await {
            return Ok(is_open);
        }

        let _guard = self.fill_lock.lock().await;

        // 대기하는 동안 다른 워커가 같은 연도를 채웠을 수 있음
        if let Some(is_open) = self.cached_is_open(year, date).await {
            return Ok(is_open);
        }

        let days = self.load_year(year).await?;
        let is_open = !days.contains(&date);

        self.closed.write().await.insert(year, days);
        Ok(is_open)
    }

    async fn cached_is_open(&self, year: i32, date: NaiveDate) -> Option<bool> {
        self.closed
            .read()
            .await
            .get(&year)
            .map(|days| !days.contains(&date))
    }

    /// `date` 이하의 가장 최근 거래일.
    ///
    /// [`MAX_LOOKBACK_STEPS`]일 안에 거래일이 없으면 캘린더 데이터 이상으로 봅니다.
    pub async fn latest_business_day(&self, date: NaiveDate) -> Result<NaiveDate> {
        let mut candidate = date;
        for _ in 0..=MAX_LOOKBACK_STEPS {
            if self.is_trading_day(candidate).await? {
                if candidate != date {
                    debug!(requested = %date, adjusted = %candidate, "Adjusted end date to business day");
                }
                return Ok(candidate);
            }
            match candidate.pred_opt() {
                Some(prev) => candidate = prev,
                None => break,
            }
        }
        Err(UpstreamError::Parse(format!(
            "no business day within {} days before {}",
            MAX_LOOKBACK_STEPS, date
        )))
    }

    async fn load_year(&self, year: i32) -> Result<HashSet<NaiveDate>> {
        let (Some(from), Some(to)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return Ok(HashSet::new());
        };

        let days = self.fetch(from, to).await?;
        let closed: HashSet<NaiveDate> = days
            .into_iter()
            .filter(|d| !d.division.is_equity_trading() && !is_weekend(d.date))
            .map(|d| d.date)
            .collect();

        info!(year, holidays = closed.len(), "Trading calendar loaded");
        Ok(closed)
    }
}
