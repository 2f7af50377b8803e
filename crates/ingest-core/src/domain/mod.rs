//! 가격 수집을 위한 도메인 모델과 외부 협력자 trait.

mod cache;
mod calendar;
mod price;
mod price_source;
mod repository;
mod statement;

pub use cache::*;
pub use calendar::*;
pub use price::*;
pub use price_source::*;
pub use repository::*;
pub use statement::*;
