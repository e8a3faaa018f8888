//! Remote price source: the spreadsheet the price lists are maintained in.

pub mod client;
pub mod credentials;

use async_trait::async_trait;
use models::PriceCategory;

use crate::errors::PriceError;

pub use client::GoogleSheetsClient;
pub use credentials::ServiceAccountCredentials;

/// Anything that can produce the full category mapping in one round-trip.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch every named category together. The result keeps the order of
    /// `categories`.
    async fn fetch_categories(&self, categories: &[String]) -> Result<PriceCategory, PriceError>;
}

/// A1 range covering service, price, prefix and note columns from row 2.
pub fn category_range(sheet: &str) -> String {
    format!("'{}'!A2:D", sheet.replace('\'', "''"))
}

/// In-memory source for tests.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    pub struct MockPriceSource {
        response: Mutex<Result<PriceCategory, String>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl MockPriceSource {
        pub fn with_data(data: PriceCategory) -> Self {
            Self { response: Mutex::new(Ok(data)), calls: AtomicUsize::new(0), delay: None }
        }

        pub fn failing(msg: &str) -> Self {
            Self { response: Mutex::new(Err(msg.to_string())), calls: AtomicUsize::new(0), delay: None }
        }

        /// Make every fetch take `delay` (on the tokio clock).
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn set_data(&self, data: PriceCategory) {
            *self.response.lock().unwrap() = Ok(data);
        }

        pub fn set_failure(&self, msg: &str) {
            *self.response.lock().unwrap() = Err(msg.to_string());
        }

        /// Number of fetches performed so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for MockPriceSource {
        async fn fetch_categories(&self, _categories: &[String]) -> Result<PriceCategory, PriceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.response.lock().unwrap().clone().map_err(PriceError::Upstream)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::category_range;

    #[test]
    fn range_quotes_sheet_names() {
        assert_eq!(category_range("Маникюр"), "'Маникюр'!A2:D");
        assert_eq!(category_range("Услуги бровиста"), "'Услуги бровиста'!A2:D");
        assert_eq!(category_range("Mike's"), "'Mike''s'!A2:D");
    }
}
