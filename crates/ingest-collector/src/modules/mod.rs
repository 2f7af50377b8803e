//! 데이터 수집 모듈.

pub mod batch;
pub mod cursor;
pub mod pipeline;
pub mod scheduler;
pub mod statements;
pub mod symbol_sync;

pub use batch::{BatchBuffer, BatchWriter};
pub use cursor::{ResumeCursor, CURSOR_START};
pub use pipeline::{DateWindow, Pipeline};
pub use scheduler::{BatchScheduler, RunReport};
pub use statements::fetch_statements;
pub use symbol_sync::sync_symbols;
