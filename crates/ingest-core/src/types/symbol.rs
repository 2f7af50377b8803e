//! 종목(Symbol) 정의.
//!
//! 업스트림 종목 마스터에서 가져온 상장 종목 정보입니다.
//! 한 번의 수집 실행 동안에는 변경되지 않습니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 거래 가능한 상장 종목.
///
/// `code`가 정렬 키이며, 배치 스케줄러의 커서는 이 값을 기준으로
/// 오름차순 페이지를 가져옵니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// 종목 코드 (예: "7203", "1301")
    pub code: String,
    /// 종목명
    pub name: String,
    /// 영문 종목명
    #[serde(default)]
    pub name_en: Option<String>,
    /// 시장 구분 코드 (예: "0111" = 프라임)
    #[serde(default)]
    pub market_code: Option<String>,
    /// 시장 구분명
    #[serde(default)]
    pub market_name: Option<String>,
    /// 17업종 코드
    #[serde(default)]
    pub sector17_code: Option<String>,
    /// 33업종 코드
    #[serde(default)]
    pub sector33_code: Option<String>,
}

impl Symbol {
    /// 코드와 이름만으로 종목을 생성합니다.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            name_en: None,
            market_code: None,
            market_name: None,
            sector17_code: None,
            sector33_code: None,
        }
    }

    /// 시장 구분 코드를 설정합니다.
    pub fn with_market(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.market_code = Some(code.into());
        self.market_name = Some(name.into());
        self
    }

    /// 주어진 시장 코드 목록에 속하는지 확인합니다.
    ///
    /// 목록이 비어 있으면 모든 시장을 허용합니다.
    pub fn is_in_markets(&self, market_codes: &[String]) -> bool {
        if market_codes.is_empty() {
            return true;
        }
        self.market_code
            .as_ref()
            .map(|code| market_codes.iter().any(|m| m == code))
            .unwrap_or(false)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}
