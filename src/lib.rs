pub mod app;
pub mod browser;
pub mod config;
pub mod envelope;
pub mod error;
pub mod models;
pub mod tmdb;
