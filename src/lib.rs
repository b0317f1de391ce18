pub mod bench;
pub mod board;
pub mod book;
pub mod error;
pub mod options;
pub mod search;
pub mod time;
pub mod uci;

pub use error::{EngineError, Result};
