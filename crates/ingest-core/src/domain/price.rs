//! 일봉 가격 레코드와 분석용 프로젝션.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 하루치 OHLCV 및 수정주가.
///
/// `(code, date)`로 유일하게 식별됩니다. 생성 후 변경되지 않으며
/// 저장소에서는 이 키로 upsert 됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// 종목 코드
    pub code: String,
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: Decimal,
    /// 거래대금
    pub turnover_value: Decimal,
    /// 조정 계수 (분할/병합)
    pub adjustment_factor: Decimal,
    /// 수정 종가
    pub adjusted_close: Decimal,
}

impl PriceRecord {
    /// OHLC가 모두 0인 비거래 자리표시 행인지 확인합니다.
    ///
    /// 업스트림은 거래가 없던 날에도 행을 돌려주므로 저장 전에 걸러냅니다.
    /// 하나라도 0이 아니면 정상 행으로 취급합니다.
    pub fn is_placeholder(&self) -> bool {
        self.open.is_zero() && self.high.is_zero() && self.low.is_zero() && self.close.is_zero()
    }

    /// 분석용 프로젝션으로 변환합니다.
    pub fn to_projection(&self) -> AnalysisProjection {
        AnalysisProjection::from(self)
    }
}

/// 분석 저장소용 비정규화 프로젝션.
///
/// 쓰기 시점에 [`PriceRecord`]에서 1:1로 생성되며 `(code, date)` 외의
/// 독립적인 식별자를 갖지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisProjection {
    pub code: String,
    pub date: NaiveDate,
    pub close: Decimal,
    pub adjusted_close: Decimal,
    pub volume: Decimal,
    pub turnover_value: Decimal,
}

impl From<&PriceRecord> for AnalysisProjection {
    fn from(record: &PriceRecord) -> Self {
        Self {
            code: record.code.clone(),
            date: record.date,
            close: record.close,
            adjusted_close: record.adjusted_close,
            volume: record.volume,
            turnover_value: record.turnover_value,
        }
    }
}
