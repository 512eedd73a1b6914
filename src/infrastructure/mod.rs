//! Infrastructure layer - Store backends, persistence, services and observability

pub mod cache;
pub mod logging;
pub mod observability;
pub mod organization;
pub mod storage;
pub mod user;
