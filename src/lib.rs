pub mod api;
pub mod calendar;
pub mod config;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod migrator;
pub mod routes;
pub mod scoring;
pub mod telemetry;
pub mod time;

pub use sea_orm;
