use crate::models::CaseRecord;
use crate::state::AppContext;
use leptos::logging::error;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Case list for the signed-in identity.
#[derive(Clone, Copy)]
pub(crate) struct CasesHandle {
    pub cases: RwSignal<Vec<CaseRecord>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    request_id: RwSignal<u64>,
    ctx: StoredValue<AppContext>,
}

impl CasesHandle {
    pub fn reload(self) {
        let identity = self.ctx.with_value(|c| c.0.identity.get_untracked());
        self.load(identity);
    }

    fn load(self, identity: Option<String>) {
        let Some(identity) = identity else {
            self.cases.set(vec![]);
            return;
        };

        let req_id = self.request_id.get_untracked().saturating_add(1);
        self.request_id.set(req_id);
        self.loading.set(true);
        self.error.set(None);

        let api_client = self.ctx.with_value(|c| c.0.api_client.get_untracked());
        spawn_local(async move {
            let result = api_client.list_cases(&identity).await;

            // Ignore stale responses.
            if self.request_id.get_untracked() != req_id {
                return;
            }

            match result {
                Ok(cases) => self.cases.set(cases),
                Err(e) => {
                    error!("[cases] load failed: {e}");
                    self.error.set(Some(e.user_message("Failed to load cases")));
                }
            }
            self.loading.set(false);
        });
    }
}

/// Loads the case list and reloads it whenever the identity changes.
pub(crate) fn use_cases() -> CasesHandle {
    let app_state = expect_context::<AppContext>();
    let identity = app_state.0.identity;

    let handle = CasesHandle {
        cases: RwSignal::new(vec![]),
        loading: RwSignal::new(false),
        error: RwSignal::new(None),
        request_id: RwSignal::new(0),
        ctx: StoredValue::new(app_state),
    };

    Effect::new(move |_| {
        let identity = identity.get();
        handle.load(identity);
    });

    handle
}

/// Cases whose code, certificate number, name or postal code contain `query`
/// (case-insensitive). A blank query keeps everything.
pub(crate) fn filter_cases(cases: &[CaseRecord], query: &str) -> Vec<CaseRecord> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return cases.to_vec();
    }
    cases
        .iter()
        .filter(|c| {
            [
                &c.establishment_code,
                &c.cert_no,
                &c.establishment_name,
                &c.postal_code,
            ]
            .iter()
            .any(|f| f.to_lowercase().contains(&q))
        })
        .cloned()
        .collect()
}
