//! 인증된 HTTP 호출과 401 재시도 프로토콜.
//!
//! 모든 데이터 호출은 다음 순서를 따릅니다:
//! 1. 현재 세션 토큰으로 요청
//! 2. 401이면 리프레시/세션 토큰을 모두 재발급
//! 3. 원래 요청을 정확히 한 번 더 보냄
//!
//! 두 번째 401은 치명적 인증 에러입니다. 401 이외의 비정상 응답은
//! 상태 코드와 URL을 담은 에러로 변환되며 재시도하지 않습니다.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::token::{error_message, TokenManager};
use crate::{Result, UpstreamConfig, UpstreamError};

/// 최초 요청 + 재인증 후 재요청.
const MAX_ATTEMPTS: usize = 2;

/// 토큰 관리자를 품은 HTTP 전송 계층.
pub struct AuthorizedTransport {
    config: Arc<UpstreamConfig>,
    http: Client,
    tokens: Arc<TokenManager>,
}

impl AuthorizedTransport {
    /// 새로운 전송 계층 생성.
    pub fn new(config: Arc<UpstreamConfig>, http: Client, tokens: Arc<TokenManager>) -> Self {
        Self {
            config,
            http,
            tokens,
        }
    }

    /// 토큰 관리자 반환.
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// 인증된 GET 요청을 보내고 JSON 응답을 역직렬화합니다.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.config.endpoint(path);
        let label = request_label(&url, query);
        let mut token = self.tokens.session_token().await?;

        for attempt in 1..=MAX_ATTEMPTS {
            debug!(request = %label, attempt, "Sending authorized request");

            let response = self
                .http
                .get(&url)
                .query(query)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| UpstreamError::network(&label, e))?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                if attempt < MAX_ATTEMPTS {
                    warn!(request = %label, "401 Unauthorized, re-authenticating and retrying once");
                    token = self.tokens.reauthenticate(&token).await?;
                }
                continue;
            }

            let body = response
                .text()
                .await
                .map_err(|e| UpstreamError::network(&label, e))?;

            if !status.is_success() {
                return Err(UpstreamError::Status {
                    status: status.as_u16(),
                    url: label,
                    body: error_message(&body),
                });
            }

            return serde_json::from_str(&body)
                .map_err(|e| UpstreamError::Parse(format!("{}: {}", label, e)));
        }

        Err(UpstreamError::Unauthorized(format!(
            "{} still returned 401 after re-authentication",
            label
        )))
    }
}

/// 에러 메시지용 요청 표기. 쿼리(종목 코드, 기간)를 포함합니다.
fn request_label(url: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let params: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}?{}", url, params.join("&"))
}
