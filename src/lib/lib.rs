//! A todo table behind sqlx plus an axum server that answers HTMX form posts
//! with Tera-rendered HTML fragments.

pub mod adapters;
pub mod config;
pub mod core;
pub mod render;
pub mod seed;
pub mod storage;
