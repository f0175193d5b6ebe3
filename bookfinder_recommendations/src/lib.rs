pub mod api;
pub mod filter_engine;
pub mod normalization;
pub mod query;
pub mod size_range;

#[cfg(any(feature = "client", test))]
pub mod client;

#[cfg(any(feature = "server", test))]
pub mod app_config;
#[cfg(any(feature = "server", test))]
pub mod books_catalog;
#[cfg(any(feature = "server", test))]
mod handlers;
