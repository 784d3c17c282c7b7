pub mod app;
pub mod auth;
pub mod bids;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod logging;
pub mod session;
pub mod state;
pub mod transporters;
pub mod users;
pub mod extract;
mod validate;
