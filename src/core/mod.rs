pub mod app;
pub mod clipboard;
pub mod config;
pub mod encode;
pub mod error;
pub mod gemini;
pub mod state;
