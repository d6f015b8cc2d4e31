// src/lib.rs

pub mod app_state;
pub mod config;
pub mod gateway;
pub mod origin;
pub mod render;
pub mod service;
pub mod storage;
