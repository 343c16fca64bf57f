pub mod badge;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod fetcher;
pub mod format;
pub mod metrics;
pub mod page;
pub mod refresh;
pub mod render;
