//! 수집 시스템 전반에서 사용되는 기본 타입.

mod job;
mod symbol;

pub use job::*;
pub use symbol::*;
