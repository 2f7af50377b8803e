//! # Ingest Core
//!
//! 가격 수집 파이프라인의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 수집 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 종목(Symbol) 및 수집 작업 유형(JobKind)
//! - 일봉 가격 레코드와 분석용 프로젝션
//! - 재무제표 및 거래일 캘린더 타입
//! - 외부 협력자 trait (캐시, 저장소, 가격 소스)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
