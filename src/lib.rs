//! quant-engine - Core Library
//! Event-driven decision engine for trend and multi-leg arbitrage strategies

// Public modules
pub mod bar;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod indicator;
pub mod market;
pub mod series;
pub mod strategy;
pub mod types;

// Re-exports
pub use config::AppConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use market::{MarketSnapshotStore, Quote};
pub use series::TimeSeriesBuffer;
