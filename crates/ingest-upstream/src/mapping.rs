//! 업스트림 JSON 응답 → 도메인 레코드 변환.
//!
//! 업스트림의 종목 코드는 4자리 종목에 패딩 숫자 `0`을 붙인 5자리로 내려옵니다
//! (예: "72030" → "7203"). 끝의 `0`을 **정확히 한 개만** 제거합니다. 이 규칙은
//! 실제로 0으로 끝나는 코드와 패딩을 구분할 수 없는 휴리스틱이며,
//! 업스트림의 공식 패딩 규약을 확인하기 전에는 바꾸지 않습니다.

use chrono::NaiveDate;
use ingest_core::{DayDivision, FinancialStatement, PriceRecord, Symbol, TradingDay};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

/// 끝의 패딩 `0`을 최대 한 개 제거합니다.
///
/// ```
/// use ingest_upstream::trim_padding_zero;
///
/// assert_eq!(trim_padding_zero("10010"), "1001");
/// assert_eq!(trim_padding_zero("1000"), "100");
/// assert_eq!(trim_padding_zero("1001"), "1001");
/// ```
pub fn trim_padding_zero(code: &str) -> String {
    code.strip_suffix('0').unwrap_or(code).to_string()
}

// =============================================================================
// 일봉
// =============================================================================

/// 일봉 응답.
#[derive(Debug, Deserialize)]
pub struct DailyQuotesResponse {
    #[serde(default)]
    pub daily_quotes: Vec<DailyQuoteRow>,
    #[serde(default)]
    pub pagination_key: Option<String>,
}

/// 일봉 한 행. 거래가 없으면 가격 필드가 `null`로 내려옵니다.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DailyQuoteRow {
    pub date: NaiveDate,
    pub code: String,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub turnover_value: Option<Decimal>,
    pub adjustment_factor: Option<Decimal>,
    pub adjustment_close: Option<Decimal>,
}

impl DailyQuoteRow {
    /// 도메인 레코드로 변환. `null` 가격은 0, 조정 계수는 1로 채웁니다.
    pub fn into_record(self) -> PriceRecord {
        let close = self.close.unwrap_or_default();
        PriceRecord {
            code: trim_padding_zero(&self.code),
            date: self.date,
            open: self.open.unwrap_or_default(),
            high: self.high.unwrap_or_default(),
            low: self.low.unwrap_or_default(),
            close,
            volume: self.volume.unwrap_or_default(),
            turnover_value: self.turnover_value.unwrap_or_default(),
            adjustment_factor: self.adjustment_factor.unwrap_or(Decimal::ONE),
            adjusted_close: self.adjustment_close.unwrap_or(close),
        }
    }
}

/// 일봉 행들을 레코드로 변환하고 OHLC가 모두 0인 자리표시 행을 제거합니다.
pub fn map_daily_quotes(rows: Vec<DailyQuoteRow>) -> Vec<PriceRecord> {
    let total = rows.len();
    let records: Vec<PriceRecord> = rows
        .into_iter()
        .map(DailyQuoteRow::into_record)
        .filter(|r| !r.is_placeholder())
        .collect();

    if records.len() < total {
        debug!(
            dropped = total - records.len(),
            kept = records.len(),
            "Dropped non-trading placeholder rows"
        );
    }
    records
}

// =============================================================================
// 종목 마스터
// =============================================================================

/// 상장 종목 응답.
#[derive(Debug, Deserialize)]
pub struct ListedInfoResponse {
    #[serde(default)]
    pub info: Vec<ListedInfoRow>,
}

/// 상장 종목 한 행.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListedInfoRow {
    pub code: String,
    pub company_name: String,
    #[serde(default)]
    pub company_name_english: Option<String>,
    #[serde(default)]
    pub sector17_code: Option<String>,
    #[serde(default)]
    pub sector33_code: Option<String>,
    #[serde(default)]
    pub market_code: Option<String>,
    #[serde(default)]
    pub market_code_name: Option<String>,
}

impl From<ListedInfoRow> for Symbol {
    fn from(row: ListedInfoRow) -> Self {
        Symbol {
            code: trim_padding_zero(&row.code),
            name: row.company_name,
            name_en: row.company_name_english.filter(|s| !s.is_empty()),
            market_code: row.market_code,
            market_name: row.market_code_name,
            sector17_code: row.sector17_code,
            sector33_code: row.sector33_code,
        }
    }
}

// =============================================================================
// 재무제표
// =============================================================================

/// 재무제표 응답.
#[derive(Debug, Deserialize)]
pub struct StatementsResponse {
    #[serde(default)]
    pub statements: Vec<StatementRow>,
    #[serde(default)]
    pub pagination_key: Option<String>,
}

/// 재무제표 한 행. 숫자는 문자열, 미공시 항목은 빈 문자열입니다.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatementRow {
    pub disclosed_date: NaiveDate,
    pub local_code: String,
    #[serde(default)]
    pub type_of_current_period: String,
    #[serde(default)]
    pub net_sales: String,
    #[serde(default)]
    pub operating_profit: String,
    #[serde(default)]
    pub profit: String,
    #[serde(default)]
    pub earnings_per_share: String,
    #[serde(default)]
    pub equity: String,
    #[serde(default)]
    pub total_assets: String,
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

impl From<StatementRow> for FinancialStatement {
    fn from(row: StatementRow) -> Self {
        FinancialStatement {
            code: trim_padding_zero(&row.local_code),
            disclosed_date: row.disclosed_date,
            type_of_current_period: row.type_of_current_period,
            net_sales: parse_amount(&row.net_sales),
            operating_profit: parse_amount(&row.operating_profit),
            profit: parse_amount(&row.profit),
            earnings_per_share: parse_amount(&row.earnings_per_share),
            equity: parse_amount(&row.equity),
            total_assets: parse_amount(&row.total_assets),
        }
    }
}

// =============================================================================
// 거래일 캘린더
// =============================================================================

/// 거래일 캘린더 응답.
#[derive(Debug, Deserialize)]
pub struct TradingCalendarResponse {
    #[serde(default)]
    pub trading_calendar: Vec<TradingCalendarRow>,
}

/// 캘린더 한 행.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TradingCalendarRow {
    pub date: NaiveDate,
    pub holiday_division: String,
}

impl TradingCalendarRow {
    /// 알 수 없는 구분 코드는 `None`.
    pub fn into_trading_day(self) -> Option<TradingDay> {
        DayDivision::from_code(&self.holiday_division).map(|division| TradingDay {
            date: self.date,
            division,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trim_exactly_one_trailing_zero() {
        assert_eq!(trim_padding_zero("10010"), "1001");
        assert_eq!(trim_padding_zero("1000"), "100");
        assert_eq!(trim_padding_zero("1001"), "1001");
        assert_eq!(trim_padding_zero("72030"), "7203");
        assert_eq!(trim_padding_zero(""), "");
    }

    proptest! {
        #[test]
        fn prop_trim_removes_at_most_one_char(code in "[0-9]{1,6}") {
            let trimmed = trim_padding_zero(&code);
            prop_assert!(code.starts_with(&trimmed));
            if code.ends_with('0') {
                prop_assert_eq!(trimmed.len() + 1, code.len());
            } else {
                prop_assert_eq!(&trimmed, &code);
            }
        }
    }

    #[test]
    fn test_daily_quotes_mapping_drops_all_zero_rows() {
        let body = r#"{
            "daily_quotes": [
                {"Date":"2024-03-01","Code":"13010","Open":3500.0,"High":3600.0,"Low":3400.0,"Close":3550.0,
                 "Volume":12000.0,"TurnoverValue":42000000.0,"AdjustmentFactor":1.0,"AdjustmentClose":3550.0},
                {"Date":"2024-03-04","Code":"13010","Open":null,"High":null,"Low":null,"Close":null,
                 "Volume":null,"TurnoverValue":null,"AdjustmentFactor":1.0,"AdjustmentClose":null},
                {"Date":"2024-03-05","Code":"13010","Open":0,"High":0,"Low":0,"Close":3560.0,
                 "Volume":100.0,"TurnoverValue":356000.0,"AdjustmentFactor":1.0,"AdjustmentClose":3560.0}
            ]
        }"#;

        let response: DailyQuotesResponse = serde_json::from_str(body).unwrap();
        assert!(response.pagination_key.is_none());

        let records = map_daily_quotes(response.daily_quotes);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.code == "1301"));
        assert_eq!(records[0].close, dec!(3550));
        assert_eq!(records[1].close, dec!(3560));
    }

    #[test]
    fn test_missing_adjustment_fields_default() {
        let row = DailyQuoteRow {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            code: "72030".to_string(),
            open: Some(dec!(2500)),
            high: Some(dec!(2550)),
            low: Some(dec!(2480)),
            close: Some(dec!(2530)),
            volume: Some(dec!(1000)),
            turnover_value: None,
            adjustment_factor: None,
            adjustment_close: None,
        };

        let record = row.into_record();
        assert_eq!(record.code, "7203");
        assert_eq!(record.adjustment_factor, Decimal::ONE);
        assert_eq!(record.adjusted_close, dec!(2530));
        assert_eq!(record.turnover_value, Decimal::ZERO);
    }

    #[test]
    fn test_listed_info_to_symbol() {
        let body = r#"{"info":[{"Date":"2024-03-01","Code":"86970","CompanyName":"日本取引所グループ",
            "CompanyNameEnglish":"Japan Exchange Group,Inc.","Sector17Code":"16","Sector17CodeName":"金融",
            "Sector33Code":"7200","Sector33CodeName":"その他金融業","ScaleCategory":"TOPIX Large70",
            "MarketCode":"0111","MarketCodeName":"プライム"}]}"#;

        let response: ListedInfoResponse = serde_json::from_str(body).unwrap();
        let symbol: Symbol = response.info.into_iter().next().unwrap().into();

        assert_eq!(symbol.code, "8697");
        assert_eq!(symbol.market_code.as_deref(), Some("0111"));
        assert_eq!(symbol.sector33_code.as_deref(), Some("7200"));
    }

    #[test]
    fn test_statement_empty_strings_are_absent() {
        let body = r#"{"statements":[{"DisclosedDate":"2024-02-06","LocalCode":"86970",
            "TypeOfCurrentPeriod":"3Q","NetSales":"114000000000","OperatingProfit":"",
            "Profit":"43000000000","EarningsPerShare":"82.15","Equity":"","TotalAssets":"not-a-number"}]}"#;

        let response: StatementsResponse = serde_json::from_str(body).unwrap();
        let statement: FinancialStatement = response.statements.into_iter().next().unwrap().into();

        assert_eq!(statement.code, "8697");
        assert_eq!(statement.net_sales, Some(dec!(114000000000)));
        assert_eq!(statement.operating_profit, None);
        assert_eq!(statement.earnings_per_share, Some(dec!(82.15)));
        assert_eq!(statement.total_assets, None);
    }

    #[test]
    fn test_calendar_row_unknown_division_is_skipped() {
        let row = TradingCalendarRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            holiday_division: "7".to_string(),
        };
        assert!(row.into_trading_day().is_none());
    }
}
