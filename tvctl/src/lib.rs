//! # tvctl
//!
//! Command-line front end for `tvctl-core`: TOML configuration with
//! token persistence, and a session driver that pairs with the TV and
//! presses a list of keys.

pub mod config;
pub mod session;
