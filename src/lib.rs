// ABOUTME: Library module for table-copy
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod database;
pub mod endpoint;
pub mod error;
pub mod migration;
pub mod postgres;
pub mod template;
pub mod utils;
