// src/types/mod.rs

pub mod date;

pub use date::{from_epoch_millis, from_epoch_millis_value};
