// Library surface for the binary and the integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod input;
pub mod kv;
pub mod runtime;
pub mod session;
pub mod store;
pub mod timer;
pub mod ui;
pub mod util;
