pub mod booking;
pub mod config;
pub mod database;
pub mod notify;
pub mod server;
pub mod timing;
