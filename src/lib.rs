//! Publishes the folder tree of a shared drive as a JSON map file inside that
//! same drive, on every HTTP trigger.

pub mod apis;
pub mod config;
pub mod drive;
pub mod error_utils;
pub mod folder_map;
pub mod goauth;
pub mod handler;
pub mod publish;
pub mod tracer;

pub type AppResult<T, E = anyhow::Error> = std::result::Result<T, E>;
