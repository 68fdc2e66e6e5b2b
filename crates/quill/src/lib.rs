#![doc = include_str!("../README.md")]

pub mod config;
pub mod content;
pub mod date;
pub mod markdown;
pub mod pagination;
pub mod search;
pub mod server;
mod service;
pub mod storage;

pub use config::*;
pub use service::*;
