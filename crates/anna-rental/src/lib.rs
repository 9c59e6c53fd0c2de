pub mod config;
pub mod dates;
pub mod error;
pub mod identity;
pub mod marketplace;
pub mod storage;
pub mod telemetry;
