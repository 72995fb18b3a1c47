//! API 模块
//!
//! 对外提供的 HTTP 接口

pub mod search;

pub use search::router;
