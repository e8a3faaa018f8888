use std::sync::Arc;

use configs::RenderConfig;
use service::pagination::PageLayout;
use service::PriceCache;

/// Shared by every handler; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<PriceCache>,
    pub layout: PageLayout,
    pub render: Arc<RenderConfig>,
}
