pub mod api;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod services;
pub mod state;
