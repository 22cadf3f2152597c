//! MusicFinder Library
//!
//! This library exposes modules for integration testing

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod services;
pub mod session;
pub mod state;
pub mod test_utils;
