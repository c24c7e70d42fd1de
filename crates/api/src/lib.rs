//! `cuadre-api` — HTTP surface for the cash drawer reconciliation engine.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
pub mod telemetry;
