//! 시세 API 클라이언트.
//!
//! 처리 기능:
//! - 리프레시 토큰 / 세션 토큰 수명 주기 관리 (캐시 기반)
//! - 401 응답 시 1회 재인증 후 재시도
//! - 종목 마스터, 일봉, 재무제표, 거래일 캘린더 조회
//! - 업스트림 JSON 응답을 도메인 레코드로 변환

pub mod calendar;
pub mod client;
pub mod config;
pub mod error;
pub mod mapping;
pub mod token;
pub mod transport;

pub use calendar::TradingCalendar;
pub use client::UpstreamClient;
pub use config::UpstreamConfig;
pub use error::{Result, UpstreamError};
pub use mapping::trim_padding_zero;
pub use token::{TokenKind, TokenManager};
pub use transport::AuthorizedTransport;
