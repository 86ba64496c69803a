//! Shared server state

use linguadeck_core::Storage;
use std::sync::Arc;

/// Shared application state for the API.
///
/// `Storage` takes `&self` everywhere, so a plain `Arc` is enough; no mutex
/// at this layer.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
}

impl AppState {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}
