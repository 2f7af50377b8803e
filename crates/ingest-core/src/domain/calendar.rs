//! 거래일 캘린더 타입.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 거래일 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayDivision {
    /// 휴장일
    NonBusiness,
    /// 영업일
    Business,
    /// 반일 거래 (도쿄 시장)
    HalfDay,
    /// 휴일 거래 (파생상품 전용, 현물 휴장)
    HolidayTrading,
}

impl DayDivision {
    /// 업스트림 구분 코드에서 변환합니다.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "0" => Some(DayDivision::NonBusiness),
            "1" => Some(DayDivision::Business),
            "2" => Some(DayDivision::HalfDay),
            "3" => Some(DayDivision::HolidayTrading),
            _ => None,
        }
    }

    /// 현물 주식이 거래되는 날인지 확인합니다.
    pub fn is_equity_trading(&self) -> bool {
        matches!(self, DayDivision::Business | DayDivision::HalfDay)
    }
}

/// 캘린더의 하루.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingDay {
    pub date: NaiveDate,
    pub division: DayDivision,
}
