//! 재개 가능한 일봉 수집기.
//!
//! 이 crate는 수집 파이프라인과 이를 구동하는 바이너리를 제공합니다:
//! - 캐시 기반 재개 커서와 페이지 단위 배치 스케줄러
//! - 고정 워커 풀 기반 fan-out / fan-in 파이프라인
//! - 종목 마스터 동기화, 재무제표 조회

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::{CollectorConfig, DaemonConfig};
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
