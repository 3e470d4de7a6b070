//! storereach - Estimate how far, on average, anywhere in a neighborhood is
//! from the nearest store of a retail chain

pub mod analysis;
pub mod api;
pub mod boundary;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod geometry;

pub use error::{Result, StoreReachError};
