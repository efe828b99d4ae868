#![forbid(unsafe_code)]

pub mod cli;
pub mod compose;
pub mod config;
pub mod embedded_config;
pub mod fetch;
pub mod fragment;
pub mod logging;
pub mod markup;
pub mod menu;
pub mod rewrite;
pub mod sanitize;
pub mod server;
pub mod styles;
