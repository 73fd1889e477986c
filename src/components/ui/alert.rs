use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {ErrorAlert, div, "relative w-full rounded-lg border border-destructive/30 px-3 py-2 text-xs text-destructive"}
    clx! {SuccessAlert, div, "relative w-full rounded-lg border border-success/30 bg-success/5 px-3 py-2 text-xs"}
}

#[allow(unused_imports)]
pub use components::*;
