//! Data model shared by the service and server crates.

pub mod price;

pub use price::{Price, PriceCategory, PriceItem};
