//! 재무제표 조회 모듈.

use ingest_core::FinancialStatement;
use ingest_upstream::UpstreamClient;

use crate::{CollectorError, Result};

/// 종목의 재무제표를 공시일 순으로 조회
pub async fn fetch_statements(
    client: &UpstreamClient,
    code: &str,
) -> Result<Vec<FinancialStatement>> {
    let code = code.trim();
    if code.is_empty() {
        return Err(CollectorError::Config("종목 코드가 비어 있습니다".to_string()));
    }

    let mut statements = client.statements(code).await?;
    statements.sort_by(|a, b| a.disclosed_date.cmp(&b.disclosed_date));

    tracing::info!(code, count = statements.len(), "재무제표 조회 완료");
    Ok(statements)
}
