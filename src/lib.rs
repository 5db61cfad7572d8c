//! Library exports for the Damayanti API client, shared between the binary and tests.

pub mod client;
pub mod config;
pub mod models;
pub mod resources;
pub mod session;
pub mod startup;
pub mod state;
pub mod storage;
pub mod theme;
pub mod utils;
