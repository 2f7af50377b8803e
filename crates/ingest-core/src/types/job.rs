//! 수집 작업 유형.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// 수집 작업 유형.
///
/// 작업 유형마다 독립된 재개 커서를 가지며, 페이지 크기와
/// 조회 기간이 다릅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// 일일 수집 (최근 약 1개월)
    Daily,
    /// 과거 수집 (약 5년)
    Historical,
}

impl JobKind {
    /// 모든 작업 유형.
    pub const ALL: [JobKind; 2] = [JobKind::Daily, JobKind::Historical];

    /// 문자열 식별자.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Daily => "daily",
            JobKind::Historical => "historical",
        }
    }

    /// 재개 커서를 저장하는 캐시 키.
    pub fn cursor_key(&self) -> String {
        format!("ingest:cursor:{}", self.as_str())
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(JobKind::Daily),
            "historical" | "history" => Ok(JobKind::Historical),
            other => Err(CoreError::InvalidInput(format!("unknown job kind: {}", other))),
        }
    }
}
