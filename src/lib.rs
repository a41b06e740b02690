pub mod analytics;
pub mod api;
pub mod auth;
pub mod codegen;
pub mod config;
pub mod models;
pub mod redirect;
pub mod storage;
