//! 시세 API 접속 설정.
//!
//! 업스트림은 메일 주소/비밀번호로 리프레시 토큰을 발급받고,
//! 리프레시 토큰으로 세션(ID) 토큰을 파생하는 2단계 인증을 사용합니다.
//! 자격증명은 프로세스 시작 시 한 번 로드되고 이후 읽기 전용입니다.

use secrecy::SecretString;

use crate::{Result, UpstreamError};

/// 기본 API URL.
pub const DEFAULT_BASE_URL: &str = "https://api.jquants.com/v1";

/// 업스트림 API 설정.
#[derive(Debug)]
pub struct UpstreamConfig {
    /// API 기본 URL (끝의 `/` 제외)
    pub base_url: String,
    /// 로그인 메일 주소
    pub mail: String,
    /// 로그인 비밀번호
    pub password: SecretString,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// 새로운 설정 생성.
    pub fn new(mail: impl Into<String>, password: impl Into<String>) -> Self {
        let password: String = password.into();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            mail: mail.into(),
            password: SecretString::new(password.into_boxed_str()),
            timeout_secs: 30,
        }
    }

    /// 기본 URL 설정 (테스트 서버, 스테이징 등).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 요청 타임아웃 설정.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// 환경 변수에서 설정 생성.
    ///
    /// # 환경 변수
    /// - `JQUANTS_MAIL`, `JQUANTS_PASSWORD` (필수)
    /// - `JQUANTS_BASE_URL` (선택)
    pub fn from_env() -> Result<Self> {
        let mail = std::env::var("JQUANTS_MAIL").map_err(|_| {
            UpstreamError::Config("JQUANTS_MAIL 환경변수가 설정되지 않았습니다".to_string())
        })?;
        let password = std::env::var("JQUANTS_PASSWORD").map_err(|_| {
            UpstreamError::Config("JQUANTS_PASSWORD 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let mut config = Self::new(mail, password);
        if let Ok(base_url) = std::env::var("JQUANTS_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        config.validate()?;
        Ok(config)
    }

    /// 자격증명 형식 검증.
    pub fn validate(&self) -> Result<()> {
        if self.mail.trim().is_empty() || !self.mail.contains('@') {
            return Err(UpstreamError::Config(format!(
                "유효하지 않은 메일 주소: '{}'",
                self.mail
            )));
        }
        if self.base_url.is_empty() {
            return Err(UpstreamError::Config("base_url이 비어 있습니다".to_string()));
        }
        Ok(())
    }

    /// 엔드포인트 경로를 전체 URL로 변환.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = UpstreamConfig::new("ops@example.com", "pw").with_base_url("http://localhost:1234/");
        assert_eq!(
            config.endpoint("/token/auth_user"),
            "http://localhost:1234/token/auth_user"
        );
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let config = UpstreamConfig::new("ops@example.com", "super-secret");
        assert_eq!(config.password.expose_secret(), "super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_validate_rejects_bad_mail() {
        assert!(UpstreamConfig::new("not-a-mail", "pw").validate().is_err());
        assert!(UpstreamConfig::new("ops@example.com", "pw").validate().is_ok());
    }
}
