use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, div, "bg-card text-card-foreground flex flex-col gap-4 rounded-xl border py-6 shadow-sm"}
    clx! {CardHeader, div, "flex flex-col items-start gap-1.5 px-6"}
    clx! {CardTitle, h2, "leading-none font-semibold"}
    clx! {CardContent, div, "px-6"}
    clx! {CardDescription, p, "text-muted-foreground text-sm"}

    // Modal shell: backdrop + centered scrollable panel.
    clx! {ModalBackdrop, div, "fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4"}
    clx! {ModalPanel, div, "max-h-[90vh] w-full max-w-2xl overflow-y-auto rounded-md border border-border bg-background p-4 shadow-lg"}
    clx! {ModalFooter, footer, "flex items-center justify-end gap-2 pt-2"}
}

#[allow(unused_imports)]
pub use components::*;
