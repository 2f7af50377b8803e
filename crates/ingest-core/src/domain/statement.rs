//! 재무제표 요약.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 공시된 재무제표 요약 한 건.
///
/// 업스트림은 숫자를 문자열로 내려주며 빈 문자열은 미공시 항목입니다.
/// 미공시 항목은 `None`으로 표현합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub code: String,
    /// 공시일
    pub disclosed_date: NaiveDate,
    /// 회계기간 구분 (1Q, 2Q, 3Q, FY 등)
    pub type_of_current_period: String,
    /// 매출액
    pub net_sales: Option<Decimal>,
    /// 영업이익
    pub operating_profit: Option<Decimal>,
    /// 당기순이익
    pub profit: Option<Decimal>,
    /// 주당순이익
    pub earnings_per_share: Option<Decimal>,
    /// 순자산
    pub equity: Option<Decimal>,
    /// 총자산
    pub total_assets: Option<Decimal>,
}
