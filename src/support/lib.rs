pub mod app;
pub mod backend;
pub mod config;
pub mod logger;
pub mod sample;
pub mod window;
