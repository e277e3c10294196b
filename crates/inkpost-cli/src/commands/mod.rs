//! Command handlers

pub mod article;
pub mod config;
pub mod favorite;
pub mod tag;
