//! 토큰 수명 주기 관리.
//!
//! 두 종류의 토큰을 캐시에 독립된 만료 시간으로 보관합니다:
//! - 리프레시 토큰: 메일/비밀번호로 발급 (기본 7일)
//! - 세션 토큰: 리프레시 토큰에서 파생, API 호출의 Bearer 토큰 (기본 24시간)
//!
//! 세션 토큰은 유효한 리프레시 토큰 없이 생성되지 않습니다. 캐시 미스는
//! 업스트림에서 발급/파생하여 해결하고, "없음" 이외의 캐시 에러는
//! 재인증으로 덮지 않고 그대로 전파합니다.

use ingest_core::KeyValueCache;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{Result, UpstreamConfig, UpstreamError};

/// 리프레시 토큰 기본 TTL (7일).
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// 세션 토큰 기본 TTL (24시간).
pub const SESSION_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// 캐시된 토큰 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// 장기 리프레시 토큰
    Refresh,
    /// 단기 세션(ID) 토큰
    Session,
}

impl TokenKind {
    /// 캐시 키.
    pub fn cache_key(&self) -> &'static str {
        match self {
            TokenKind::Refresh => "ingest:token:refresh",
            TokenKind::Session => "ingest:token:session",
        }
    }
}

#[derive(Serialize)]
struct CredentialRequest<'a> {
    mailaddress: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RefreshTokenResponse {
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

#[derive(Deserialize)]
struct SessionTokenResponse {
    #[serde(rename = "idToken")]
    id_token: String,
}

/// 업스트림 에러 응답 본문.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub message: String,
}

/// 에러 응답 본문에서 메시지를 추출 (실패 시 원문).
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string())
}

/// 토큰 관리자.
///
/// 캐시 핸들과 자격증명은 생성자로 주입됩니다. 발급 경로는 프로세스 내에서
/// 직렬화되어, 여러 워커가 동시에 캐시 미스를 만나도 업스트림 인증은 한 번만
/// 일어납니다.
pub struct TokenManager {
    config: Arc<UpstreamConfig>,
    http: Client,
    cache: Arc<dyn KeyValueCache>,
    refresh_ttl: Duration,
    session_ttl: Duration,
    acquire_lock: Mutex<()>,
}

impl TokenManager {
    /// 새로운 토큰 관리자 생성.
    pub fn new(config: Arc<UpstreamConfig>, http: Client, cache: Arc<dyn KeyValueCache>) -> Self {
        Self {
            config,
            http,
            cache,
            refresh_ttl: REFRESH_TOKEN_TTL,
            session_ttl: SESSION_TOKEN_TTL,
            acquire_lock: Mutex::new(()),
        }
    }

    /// 토큰 TTL 설정.
    pub fn with_ttl(mut self, refresh_ttl: Duration, session_ttl: Duration) -> Self {
        self.refresh_ttl = refresh_ttl;
        self.session_ttl = session_ttl;
        self
    }

    /// 유효한 세션 토큰 반환, 필요시 발급.
    pub async fn session_token(&self) -> Result<String> {
        if let Some(token) = self.cached(TokenKind::Session).await? {
            return Ok(token);
        }

        let _guard = self.acquire_lock.lock().await;

        // 대기하는 동안 다른 워커가 발급했을 수 있음
        if let Some(token) = self.cached(TokenKind::Session).await? {
            return Ok(token);
        }

        info!("No cached session token found, deriving from refresh token...");
        let refresh = self.refresh_token_locked().await?;

        match self.exchange_session_token(&refresh).await {
            Ok(session) => Ok(session),
            Err(e) if e.is_auth_error() => {
                // 캐시의 리프레시 토큰이 업스트림에서 무효화된 경우
                warn!(error = %e, "Cached refresh token rejected, re-authenticating with credentials");
                self.reauthenticate_locked().await
            }
            Err(e) => Err(e),
        }
    }

    /// 유효한 리프레시 토큰 반환, 필요시 자격증명으로 발급.
    pub async fn refresh_token(&self) -> Result<String> {
        let _guard = self.acquire_lock.lock().await;
        self.refresh_token_locked().await
    }

    /// 강제 재인증.
    ///
    /// 캐시된 리프레시 토큰이 유효해 보여도 자격증명으로 새로 발급하고,
    /// 세션 토큰도 새로 파생합니다. `rejected`는 401을 받은 세션 토큰으로,
    /// 대기 중 다른 워커가 이미 갱신했다면 그 토큰을 그대로 반환합니다.
    pub async fn reauthenticate(&self, rejected: &str) -> Result<String> {
        let _guard = self.acquire_lock.lock().await;

        if let Some(current) = self.cached(TokenKind::Session).await? {
            if current != rejected {
                debug!("Session token already renewed by another worker");
                return Ok(current);
            }
        }

        self.reauthenticate_locked().await
    }

    async fn cached(&self, kind: TokenKind) -> Result<Option<String>> {
        Ok(self.cache.get(kind.cache_key()).await?)
    }

    async fn refresh_token_locked(&self) -> Result<String> {
        if let Some(token) = self.cached(TokenKind::Refresh).await? {
            debug!("Using cached refresh token");
            return Ok(token);
        }

        info!("No cached refresh token found, requesting with credentials...");
        self.request_refresh_token().await
    }

    async fn reauthenticate_locked(&self) -> Result<String> {
        let refresh = self.request_refresh_token().await?;
        self.exchange_session_token(&refresh).await
    }

    /// 자격증명으로 리프레시 토큰 발급 후 캐시에 저장.
    async fn request_refresh_token(&self) -> Result<String> {
        let url = self.config.endpoint("/token/auth_user");

        let response = self
            .http
            .post(&url)
            .json(&CredentialRequest {
                mailaddress: &self.config.mail,
                password: self.config.password.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| UpstreamError::network(&url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::network(&url, e))?;

        if !status.is_success() {
            error!(status = %status, url = %url, "Credential exchange failed");
            return Err(UpstreamError::Unauthorized(format!(
                "credential exchange failed: HTTP {} from {}: {}",
                status.as_u16(),
                url,
                error_message(&body)
            )));
        }

        let parsed: RefreshTokenResponse = serde_json::from_str(&body).map_err(|e| {
            UpstreamError::Parse(format!("Failed to parse refresh token response: {}", e))
        })?;

        self.cache
            .set_with_ttl(
                TokenKind::Refresh.cache_key(),
                &parsed.refresh_token,
                self.refresh_ttl,
            )
            .await?;

        info!(ttl_secs = self.refresh_ttl.as_secs(), "Refresh token obtained");
        Ok(parsed.refresh_token)
    }

    /// 리프레시 토큰으로 세션 토큰 파생 후 캐시에 저장.
    async fn exchange_session_token(&self, refresh_token: &str) -> Result<String> {
        let url = self.config.endpoint("/token/auth_refresh");

        let response = self
            .http
            .post(&url)
            .query(&[("refreshtoken", refresh_token)])
            .send()
            .await
            .map_err(|e| UpstreamError::network(&url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::network(&url, e))?;

        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(UpstreamError::Unauthorized(format!(
                "refresh token rejected: HTTP {} from {}: {}",
                status.as_u16(),
                url,
                error_message(&body)
            )));
        }

        if !status.is_success() {
            error!(status = %status, url = %url, "Session token request failed");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url,
                body: error_message(&body),
            });
        }

        let parsed: SessionTokenResponse = serde_json::from_str(&body).map_err(|e| {
            UpstreamError::Parse(format!("Failed to parse session token response: {}", e))
        })?;

        self.cache
            .set_with_ttl(TokenKind::Session.cache_key(), &parsed.id_token, self.session_ttl)
            .await?;

        info!(ttl_secs = self.session_ttl.as_secs(), "Session token obtained");
        Ok(parsed.id_token)
    }
}
