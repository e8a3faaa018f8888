//! Service layer: spreadsheet access, the price cache and print pagination.
//! - `sheets` talks to the remote spreadsheet behind the `PriceSource` trait.
//! - `price_cache` keeps one time-boxed snapshot of the whole price set.
//! - `pagination` splits a category into printable pages.

pub mod errors;
pub mod observability;
pub mod pagination;
pub mod price_cache;
pub mod sheets;
pub mod storage;

pub use errors::PriceError;
pub use price_cache::PriceCache;
