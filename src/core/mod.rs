pub mod archive;
pub mod config;
pub mod download;
pub mod install;
pub mod platform;
pub mod progress;
pub mod releases;
pub mod version;
