//! Shared utilities for the demo commands

pub mod config;
