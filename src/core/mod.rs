pub mod config;
pub mod database;
pub mod error;
pub mod exception;
pub mod extractor;
pub mod i18n;
pub mod middleware;
pub mod openapi;
pub mod response;
