pub mod analytics;
pub mod config;
pub mod content;
pub mod db;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod repository;
pub mod services;
pub mod state;
