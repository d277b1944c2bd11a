//! ShopScope Backend Library
//!
//! Shop intelligence pipeline: ads-library keyword search, storefront
//! fingerprinting, catalog sizing, multi-factor scoring, change
//! detection and a ranked read model, chained through a durable task
//! queue.

pub mod api;
pub mod domain;
pub mod models;
pub mod ports;
pub mod queue;
pub mod scrapers;
pub mod services;
pub mod storage;
pub mod usecases;

pub use models::Config;
pub use services::Services;
