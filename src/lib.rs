//! getgo library
//!
//! Downloads Go release archives, unpacks them into versioned directories
//! and wires up the environment. The `getgo` binary is a thin CLI over
//! [`commands::install`].

pub mod commands;
pub mod core;
pub mod error;
pub mod utils;
