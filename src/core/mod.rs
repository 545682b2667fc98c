// src/core/mod.rs

pub mod command_line;
pub mod config_loader;
pub mod tables;
pub mod translator;
