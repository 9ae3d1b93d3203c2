pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod desk;
pub mod error;
pub mod filters;
pub mod forms;
pub mod notify;
pub mod pagination;
pub mod paths;
pub mod query;
pub mod router;
pub mod screens;
pub mod session;
pub mod tui;
pub mod utils;

pub use error::{DeskError, Result};
