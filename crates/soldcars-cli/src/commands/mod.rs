//! Command handlers

pub mod cars;
pub mod config;
pub mod fake;
pub mod replica;
