// src/lib.rs

pub mod artifact;
pub mod config;
pub mod extract;
pub mod render;
pub mod serve;
pub mod store;
