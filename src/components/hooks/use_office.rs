use crate::api::SaveOfficeRequest;
use crate::models::OfficeRecord;
use crate::state::AppContext;
use crate::storage::save_cached_office;
use leptos::logging::{error, log};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[derive(Clone, Copy)]
pub(crate) struct OfficeHandle {
    /// Shared with `AppState::office`.
    pub office: RwSignal<Option<OfficeRecord>>,
    pub loading: RwSignal<bool>,
    pub saving: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    pub status: RwSignal<Option<String>>,
    ctx: StoredValue<AppContext>,
}

impl OfficeHandle {
    pub fn save(self, office: OfficeRecord) {
        let Some(identity) = self.ctx.with_value(|c| c.0.identity.get_untracked()) else {
            self.error.set(Some("Not signed in".to_string()));
            return;
        };
        if self.saving.get_untracked() {
            return;
        }

        self.saving.set(true);
        self.error.set(None);
        self.status.set(None);

        let api_client = self.ctx.with_value(|c| c.0.api_client.get_untracked());
        spawn_local(async move {
            let req = SaveOfficeRequest {
                identity: identity.clone(),
                office: office.clone(),
            };
            match api_client.save_office(&req).await {
                Ok(()) => {
                    save_cached_office(&identity, &office);
                    self.office.set(Some(office));
                    self.status.set(Some("Office details saved".to_string()));
                }
                Err(e) => {
                    error!("[office] save failed: {e}");
                    self.error
                        .set(Some(e.user_message("Failed to save office details")));
                }
            }
            self.saving.set(false);
        });
    }
}

/// Office defaults for the signed-in identity.
///
/// The cached copy stays in place when the backend has none or fails.
pub(crate) fn use_office() -> OfficeHandle {
    let app_state = expect_context::<AppContext>();
    let identity = app_state.0.identity;

    let handle = OfficeHandle {
        office: app_state.0.office,
        loading: RwSignal::new(false),
        saving: RwSignal::new(false),
        error: RwSignal::new(None),
        status: RwSignal::new(None),
        ctx: StoredValue::new(app_state),
    };

    Effect::new(move |_| {
        let Some(identity) = identity.get() else {
            return;
        };

        handle.loading.set(true);
        let api_client = handle.ctx.with_value(|c| c.0.api_client.get_untracked());
        spawn_local(async move {
            match api_client.get_office(&identity).await {
                Ok(Some(office)) => {
                    save_cached_office(&identity, &office);
                    handle.office.set(Some(office));
                }
                Ok(None) => log!("[office] no office details for {identity}"),
                Err(e) => {
                    error!("[office] load failed: {e}");
                    handle
                        .error
                        .set(Some(e.user_message("Failed to load office details")));
                }
            }
            handle.loading.set(false);
        });
    });

    handle
}
