use crate::models::OfficeRecord;
use crate::util::now_ms;
use serde::{Deserialize, Serialize};

pub(crate) const TOKEN_KEY: &str = "rrc_token";
pub(crate) const IDENTITY_KEY: &str = "rrc_identity";
pub(crate) const OFFICE_KEY: &str = "rrc_office";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = local_storage()?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, &json);
        }
    }
}

pub(crate) fn load_string(key: &str) -> Option<String> {
    local_storage()
        .and_then(|s| s.get_item(key).ok().flatten())
        .filter(|v| !v.trim().is_empty())
}

#[cfg(all(test, target_arch = "wasm32"))]
pub(crate) fn save_string(key: &str, value: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(key, value);
    }
}

pub(crate) fn remove_key(key: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(key);
    }
}

/// Acting user's identifier, written by the login flow.
pub(crate) fn load_identity() -> Option<String> {
    load_string(IDENTITY_KEY)
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct CachedOffice {
    identity: String,
    saved_ms: i64,
    office: OfficeRecord,
}

/// Last office defaults seen for `identity`, so popups can prefill before the
/// office request returns.
pub(crate) fn load_cached_office(identity: &str) -> Option<OfficeRecord> {
    load_json_from_storage::<CachedOffice>(OFFICE_KEY)
        .filter(|c| c.identity == identity)
        .map(|c| c.office)
}

pub(crate) fn save_cached_office(identity: &str, office: &OfficeRecord) {
    if identity.trim().is_empty() {
        return;
    }
    save_json_to_storage(
        OFFICE_KEY,
        &CachedOffice {
            identity: identity.to_string(),
            saved_ms: now_ms(),
            office: office.clone(),
        },
    );
}
