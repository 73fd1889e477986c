use crate::components::hooks::{filter_cases, use_cases, use_office};
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription, CardHeader, CardTitle,
    ErrorAlert, Input, Label, Spinner, SuccessAlert,
};
use crate::models::{CaseRecord, OfficeRecord};
use crate::notice::{DocumentType, NoticePopup};
use crate::state::AppContext;
use leptos::prelude::*;
use strum::IntoEnumIterator;

#[component]
pub fn AppLayout(children: Children) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let identity = move || app_state.0.identity.get().unwrap_or_default();

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <header class="border-b border-border">
                <div class="mx-auto flex h-12 max-w-6xl items-center justify-between px-4">
                    <nav class="flex items-center gap-4 text-sm">
                        <a href="/" class="font-medium">"RRC Desk"</a>
                        <a href="/" class="text-muted-foreground hover:text-foreground">"Cases"</a>
                        <a href="/office" class="text-muted-foreground hover:text-foreground">"Office"</a>
                    </nav>
                    <div class="text-xs text-muted-foreground">{identity}</div>
                </div>
            </header>
            <main class="mx-auto max-w-6xl px-4 py-6">{children()}</main>
        </div>
    }
}

#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let signed_in = move || app_state.0.is_signed_in();

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=signed_in fallback=|| view! { <SignedOutNotice /> }>
            <AppLayout>
                {move || children.with_value(|c| c())}
            </AppLayout>
        </Show>
    }
}

#[component]
fn SignedOutNotice() -> impl IntoView {
    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Not signed in"</CardTitle>
                        <CardDescription class="text-xs">
                            "Sign in through the office portal, then reload this page."
                        </CardDescription>
                    </CardHeader>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn RootPage() -> impl IntoView {
    view! {
        <RootAuthed>
            <CasesPage />
        </RootAuthed>
    }
}

#[component]
pub fn CasesPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let cases = use_cases();
    // Keeps office defaults fresh for the popup.
    let office = use_office();

    let query: RwSignal<String> = RwSignal::new(String::new());
    let banner: RwSignal<Option<String>> = RwSignal::new(None);

    let popup_open: RwSignal<bool> = RwSignal::new(false);
    let popup_case: RwSignal<Option<CaseRecord>> = RwSignal::new(None);
    let popup_doc: RwSignal<DocumentType> = RwSignal::new(DocumentType::Cp3);

    let visible = Memo::new(move |_| cases.cases.with(|list| filter_cases(list, &query.get())));

    let open_popup = move |case: CaseRecord, doc: DocumentType| {
        banner.set(None);
        popup_case.set(Some(case));
        popup_doc.set(doc);
        popup_open.set(true);
    };

    view! {
        <div class="space-y-3">
            <div class="flex items-center justify-between gap-2">
                <div class="space-y-1">
                    <h1 class="text-xl font-semibold">"Cases"</h1>
                    <p class="text-xs text-muted-foreground">
                        {move || format!("{} certificates", cases.cases.with(|c| c.len()))}
                    </p>
                </div>
                <div class="flex items-center gap-2">
                    <Input bind_value=query placeholder="Search code, name, postal code" class="h-8 w-64 text-sm" />
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || cases.loading.get()
                        on:click=move |_| cases.reload()
                    >
                        "Reload"
                    </Button>
                </div>
            </div>

            {move || banner.get().map(|msg| view! {
                <SuccessAlert>{msg}</SuccessAlert>
            })}
            {move || cases.error.get().map(|e| view! {
                <ErrorAlert>{e}</ErrorAlert>
            })}

            <Show when=move || cases.loading.get() fallback=|| ().into_view()>
                <div class="flex items-center gap-2 text-xs text-muted-foreground">
                    <Spinner />
                    "Loading cases..."
                </div>
            </Show>

            <div class="overflow-x-auto rounded-md border border-border">
                <table class="w-full text-sm">
                    <thead class="bg-muted text-left text-xs text-muted-foreground">
                        <tr>
                            <th class="px-3 py-2">"Establishment"</th>
                            <th class="px-3 py-2">"RRC No."</th>
                            <th class="px-3 py-2">"Postal code"</th>
                            <th class="px-3 py-2">"Officer"</th>
                            <th class="px-3 py-2">"Remarks"</th>
                            <th class="px-3 py-2">"Notices"</th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=move || visible.get()
                            // Remarks/officer change after a notice; re-render those rows.
                            key=|c| (c.key(), c.remarks.clone(), c.enforcement_officer.clone())
                            let:case
                        >
                            <tr class="border-t border-border align-top">
                                <td class="px-3 py-2">
                                    <div class="font-medium">{case.establishment_name.clone()}</div>
                                    <div class="text-xs text-muted-foreground">{case.establishment_code.clone()}</div>
                                </td>
                                <td class="px-3 py-2">{case.cert_no.clone()}</td>
                                <td class="px-3 py-2">{case.postal_code.clone()}</td>
                                <td class="px-3 py-2">{case.enforcement_officer.clone()}</td>
                                <td class="max-w-xs whitespace-pre-line px-3 py-2 text-xs text-muted-foreground">
                                    {case.remarks.clone()}
                                </td>
                                <td class="px-3 py-2">
                                    <div class="flex flex-wrap gap-1">
                                        {DocumentType::iter()
                                            .map(|doc| {
                                                let case = case.clone();
                                                view! {
                                                    <Button
                                                        variant=ButtonVariant::Outline
                                                        size=ButtonSize::Badge
                                                        on:click=move |_| open_popup(case.clone(), doc)
                                                    >
                                                        {doc.label()}
                                                    </Button>
                                                }
                                            })
                                            .collect_view()}
                                    </div>
                                </td>
                            </tr>
                        </For>
                    </tbody>
                </table>
            </div>

            <NoticePopup
                is_open=popup_open
                target_case=popup_case
                identity=app_state.0.identity
                doc=popup_doc
                office=office.office
                on_close=move |_| popup_open.set(false)
                on_refresh=move |_| cases.reload()
                on_success=move |msg: String| banner.set(Some(msg))
            />
        </div>
    }
}

#[component]
pub fn OfficePage() -> impl IntoView {
    let office = use_office();

    let office_name: RwSignal<String> = RwSignal::new(String::new());
    let officer_name: RwSignal<String> = RwSignal::new(String::new());
    let officer_designation: RwSignal<String> = RwSignal::new(String::new());
    let address: RwSignal<String> = RwSignal::new(String::new());
    let phone: RwSignal<String> = RwSignal::new(String::new());
    let email: RwSignal<String> = RwSignal::new(String::new());

    // Mirror loaded defaults into the form fields.
    Effect::new(move |_| {
        let o = office.office.get().unwrap_or_default();
        office_name.set(o.office_name);
        officer_name.set(o.officer_name);
        officer_designation.set(o.officer_designation);
        address.set(o.address);
        phone.set(o.phone);
        email.set(o.email);
    });

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        office.save(OfficeRecord {
            office_name: office_name.get_untracked().trim().to_string(),
            officer_name: officer_name.get_untracked().trim().to_string(),
            officer_designation: officer_designation.get_untracked().trim().to_string(),
            address: address.get_untracked().trim().to_string(),
            phone: phone.get_untracked().trim().to_string(),
            email: email.get_untracked().trim().to_string(),
        });
    };

    let field = |id: &'static str, label: &'static str, value: RwSignal<String>| {
        view! {
            <div class="flex flex-col gap-1.5">
                <Label html_for=id class="text-xs">{label}</Label>
                <Input id=id bind_value=value class="h-8 text-sm" />
            </div>
        }
    };

    view! {
        <div class="max-w-lg space-y-3">
            <div class="space-y-1">
                <h1 class="text-xl font-semibold">"Office"</h1>
                <p class="text-xs text-muted-foreground">"Defaults printed on every notice."</p>
            </div>

            <Card>
                <CardContent>
                    <form class="flex flex-col gap-3" on:submit=on_submit>
                        {field("office-name", "Office name", office_name)}
                        {field("officer-name", "Recovery officer", officer_name)}
                        {field("officer-designation", "Designation", officer_designation)}
                        {field("office-address", "Address", address)}
                        {field("office-phone", "Phone", phone)}
                        {field("office-email", "Email", email)}

                        {move || office.error.get().map(|e| view! {
                            <ErrorAlert>{e}</ErrorAlert>
                        })}
                        {move || office.status.get().map(|m| view! {
                            <div class="text-xs text-muted-foreground">{m}</div>
                        })}

                        <Button
                            class="w-full"
                            size=ButtonSize::Sm
                            attr:disabled=move || office.saving.get() || office.loading.get()
                        >
                            <span class="inline-flex items-center gap-2">
                                <Show when=move || office.saving.get() fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || if office.saving.get() { "Saving..." } else { "Save" }}
                            </span>
                        </Button>
                    </form>
                </CardContent>
            </Card>
        </div>
    }
}
