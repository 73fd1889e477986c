use crate::api::ApiClient;
use crate::models::OfficeRecord;
use crate::storage::{load_cached_office, load_identity};
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// Acting user; every backend call is scoped by it.
    pub identity: RwSignal<Option<String>>,

    /// Office defaults used to prefill notices. Seeded from local storage,
    /// replaced once `use_office` hears from the backend.
    pub office: RwSignal<Option<OfficeRecord>>,
}

impl AppState {
    pub fn new() -> Self {
        let stored_client = ApiClient::load_from_storage();
        let identity = load_identity();
        let office = identity.as_deref().and_then(load_cached_office);

        Self {
            api_client: RwSignal::new(stored_client),
            identity: RwSignal::new(identity),
            office: RwSignal::new(office),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.with(|i| i.is_some()) && self.api_client.with(|c| c.is_authenticated())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
