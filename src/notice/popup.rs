use super::address::AddressMode;
use super::debounce::{Debouncer, POSTAL_SETTLE_MS, REMARK_SETTLE_MS};
use super::dialogs::BrowserDialogs;
use super::download::BrowserFileSaver;
use super::kind::DocumentType;
use super::runner::run_task;
use super::state::{update, Phase, PopupAction, PopupEffect, PopupState, SaveKind};
use crate::api::ApiClient;
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, ErrorAlert, Label, ModalBackdrop, ModalFooter, ModalPanel,
    Spinner,
};
use crate::models::{BankAccount, CaseRecord, OfficeRecord};
use crate::state::AppContext;
use crate::util::{format_iso, parse_iso, today_local};
use chrono::NaiveDate;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;

const FIELD_CLASS: &str = "h-8 w-full rounded-md border border-border bg-background px-2 text-sm outline-none focus-visible:ring-2 focus-visible:ring-ring/50";
const AREA_CLASS: &str = "min-h-16 w-full rounded-md border border-border bg-background px-2 py-1 text-sm outline-none focus-visible:ring-2 focus-visible:ring-ring/50";

/// Glue between the reducer and the browser: owns the state signal, the two
/// timers and the caller's callbacks.
#[derive(Clone, Copy)]
pub(crate) struct PopupDriver {
    state: RwSignal<PopupState>,
    api: RwSignal<ApiClient>,
    remark_timer: StoredValue<Debouncer>,
    postal_timer: StoredValue<Debouncer>,
    on_close: Callback<()>,
    on_refresh: Callback<()>,
    on_success: Callback<String>,
}

impl PopupDriver {
    pub fn dispatch(self, action: PopupAction) {
        // The signal is gone once the popup unmounts; late answers stop here.
        let Some(effects) = self.state.try_update(|s| update(s, action)) else {
            return;
        };
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(self, effect: PopupEffect) {
        match effect {
            PopupEffect::Run(task) => {
                let api = self.api.get_untracked();
                spawn_local(async move {
                    let action = run_task(&api, &BrowserDialogs, &BrowserFileSaver, task).await;
                    self.dispatch(action);
                });
            }
            PopupEffect::ScheduleRemark(ticket) => self.remark_timer.with_value(|t| {
                t.schedule(REMARK_SETTLE_MS, move || {
                    self.dispatch(PopupAction::RemarkTimerFired(ticket))
                })
            }),
            PopupEffect::CancelRemark => self.remark_timer.with_value(Debouncer::cancel),
            PopupEffect::SchedulePostalLookup(ticket) => self.postal_timer.with_value(|t| {
                t.schedule(POSTAL_SETTLE_MS, move || {
                    self.dispatch(PopupAction::PostalTimerFired(ticket))
                })
            }),
            PopupEffect::NotifyRefresh => self.on_refresh.run(()),
            PopupEffect::NotifySuccess(msg) => self.on_success.run(msg),
            PopupEffect::NotifyClose => {
                self.postal_timer.with_value(Debouncer::cancel);
                self.on_close.run(())
            }
        }
    }

    fn read<T>(self, f: impl FnOnce(&PopupState) -> T) -> T {
        self.state.with(f)
    }

    fn peek<T>(self, f: impl FnOnce(&PopupState) -> T) -> T {
        self.state.with_untracked(f)
    }
}

fn text_input(
    value: impl Fn() -> String + Send + 'static,
    on_input: impl Fn(String) + 'static,
    placeholder: &'static str,
) -> impl IntoView {
    view! {
        <input
            class=FIELD_CLASS
            placeholder=placeholder
            prop:value=value
            on:input=move |ev| on_input(event_target_value(&ev))
        />
    }
}

fn text_area(
    value: impl Fn() -> String + Send + 'static,
    on_input: impl Fn(String) + 'static,
    rows: u32,
) -> impl IntoView {
    view! {
        <textarea
            class=AREA_CLASS
            rows=rows
            prop:value=value
            on:input=move |ev| on_input(event_target_value(&ev))
        ></textarea>
    }
}

fn date_input(
    value: impl Fn() -> Option<NaiveDate> + Send + 'static,
    on_change: impl Fn(Option<NaiveDate>) + 'static,
) -> impl IntoView {
    view! {
        <input
            type="date"
            class=FIELD_CLASS
            prop:value=move || value().map(format_iso).unwrap_or_default()
            on:input=move |ev| on_change(parse_iso(&event_target_value(&ev)))
        />
    }
}

/// Notice generation popup for one case and one document type.
///
/// Renders nothing unless `is_open` and both `target_case` and `identity`
/// are present.
#[component]
pub fn NoticePopup(
    #[prop(into)] is_open: Signal<bool>,
    #[prop(into)] target_case: Signal<Option<CaseRecord>>,
    #[prop(into)] identity: Signal<Option<String>>,
    #[prop(into)] doc: Signal<DocumentType>,
    #[prop(into)] office: Signal<Option<OfficeRecord>>,
    #[prop(into)] on_close: Callback<()>,
    #[prop(into)] on_refresh: Callback<()>,
    #[prop(into)] on_success: Callback<String>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let driver = PopupDriver {
        state: RwSignal::new(PopupState::default()),
        api: app_state.0.api_client,
        remark_timer: StoredValue::new(Debouncer::default()),
        postal_timer: StoredValue::new(Debouncer::default()),
        on_close,
        on_refresh,
        on_success,
    };

    Effect::new(move |_| {
        let open = is_open.get();
        let case = target_case.get();
        let identity = identity.get();
        let doc = doc.get();

        if !open {
            driver.dispatch(PopupAction::Discard);
            return;
        }
        driver.dispatch(PopupAction::Open {
            doc,
            case,
            identity,
            office: office.get_untracked(),
            today: today_local(),
        });
    });

    on_cleanup(move || {
        driver.remark_timer.with_value(Debouncer::cancel);
        driver.postal_timer.with_value(Debouncer::cancel);
    });

    let visible = Memo::new(move |_| driver.read(|s| s.is_open()));
    let current_doc = Memo::new(move |_| driver.read(|s| s.doc));
    let in_flight = Memo::new(move |_| driver.read(|s| s.in_flight()));

    let title = move || {
        driver.read(|s| {
            let label = s.doc.map(|d| d.label()).unwrap_or_default();
            match &s.case {
                Some(c) if !c.establishment_name.trim().is_empty() => {
                    format!("{label} · {}", c.establishment_name)
                }
                Some(c) => format!("{label} · {}", c.establishment_code),
                None => label,
            }
        })
    };

    let close = move |_: web_sys::MouseEvent| driver.dispatch(PopupAction::Close);

    let _esc_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Escape" && visible.try_get_untracked() == Some(true) {
            driver.dispatch(PopupAction::Close);
        }
    });

    view! {
        <Show when=move || visible.get() fallback=|| ().into_view()>
            <ModalBackdrop on:click=close>
                <ModalPanel on:click=|ev: web_sys::MouseEvent| ev.stop_propagation()>
                    <div class="mb-3 flex items-start justify-between gap-2">
                        <div class="space-y-1">
                            <div class="text-sm font-medium">{title}</div>
                            <div class="text-xs text-muted-foreground">
                                {move || driver.read(|s| {
                                    s.case.as_ref().map(|c| c.cert_no.clone()).unwrap_or_default()
                                })}
                            </div>
                        </div>
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Icon
                            attr:disabled=move || in_flight.get()
                            attr:aria-label="Close"
                            on:click=close
                        >
                            "✕"
                        </Button>
                    </div>

                    <Show
                        when=move || driver.read(|s| s.phase == Phase::Loading)
                        fallback=|| ().into_view()
                    >
                        <div class="mb-2 flex items-center gap-2 text-xs text-muted-foreground">
                            <Spinner />
                            "Loading saved details..."
                        </div>
                    </Show>

                    <div class="space-y-4">
                        <div class="grid gap-3 sm:grid-cols-2">
                            <div class="space-y-1">
                                <Label class="text-xs">"Notice date"</Label>
                                {date_input(
                                    move || driver.read(|s| s.notice_date),
                                    move |d| driver.dispatch(PopupAction::SetNoticeDate(d)),
                                )}
                            </div>
                            <div class="space-y-1">
                                <Label class="text-xs">"Enforcement officer"</Label>
                                <div class="flex h-8 items-center text-sm">
                                    {move || driver.read(|s| {
                                        s.officer.clone().unwrap_or_else(|| "Not assigned".to_string())
                                    })}
                                </div>
                            </div>
                        </div>

                        <AddressSection driver=driver />

                        <Show
                            when=move || current_doc.get().is_some_and(DocumentType::is_multi_name)
                            fallback=|| ().into_view()
                        >
                            <NamesSection driver=driver />
                        </Show>

                        <DocumentFields driver=driver doc=current_doc />

                        <div class="grid gap-3 sm:grid-cols-2">
                            <div class="space-y-1">
                                <Label class="text-xs">"Office name"</Label>
                                {text_input(
                                    move || driver.read(|s| s.fields.office_name.clone()),
                                    move |v| driver.dispatch(PopupAction::SetOfficeName(v)),
                                    "",
                                )}
                            </div>
                            <div class="space-y-1">
                                <Label class="text-xs">"Officer designation"</Label>
                                {text_input(
                                    move || driver.read(|s| s.fields.officer_designation.clone()),
                                    move |v| driver.dispatch(PopupAction::SetOfficerDesignation(v)),
                                    "",
                                )}
                            </div>
                        </div>

                        <div class="space-y-1">
                            <Label class="text-xs">"Remark"</Label>
                            {text_area(
                                move || driver.read(|s| s.remark.clone()),
                                move |v| driver.dispatch(PopupAction::EditRemark(v)),
                                2,
                            )}
                        </div>

                        {move || driver.read(|s| s.error.clone()).map(|e| view! {
                            <ErrorAlert>{e}</ErrorAlert>
                        })}
                        {move || driver.read(|s| s.status.clone()).map(|m| view! {
                            <div class="text-xs text-muted-foreground">{m}</div>
                        })}

                        <ModalFooter>
                            <Button
                                variant=ButtonVariant::Outline
                                size=ButtonSize::Sm
                                attr:disabled=move || !driver.read(|s| s.can_cancel())
                                on:click=close
                            >
                                "Cancel"
                            </Button>
                            <Button
                                size=ButtonSize::Sm
                                attr:disabled=move || !driver.read(|s| s.can_generate())
                                on:click=move |_| driver.dispatch(PopupAction::Generate)
                            >
                                <span class="inline-flex items-center gap-2">
                                    <Show
                                        when=move || driver.read(|s| s.phase == Phase::Submitting)
                                        fallback=|| ().into_view()
                                    >
                                        <Spinner />
                                    </Show>
                                    {move || if driver.read(|s| s.phase == Phase::Submitting) {
                                        "Generating...".to_string()
                                    } else {
                                        format!(
                                            "Generate {}",
                                            current_doc.get().map(|d| d.label()).unwrap_or_default()
                                        )
                                    }}
                                </span>
                            </Button>
                        </ModalFooter>
                    </div>
                </ModalPanel>
            </ModalBackdrop>
        </Show>
    }
}

#[component]
fn AddressSection(driver: PopupDriver) -> impl IntoView {
    let mode = Memo::new(move |_| driver.read(|s| s.address_mode.clone()));
    let saved = Memo::new(move |_| driver.read(|s| s.saved_addresses.clone()));
    let busy = move || driver.read(|s| s.in_flight());

    let set_mode = move |m: AddressMode| driver.dispatch(PopupAction::SetAddressMode(m));

    view! {
        <div class="space-y-2">
            <Label class="text-xs">"Address"</Label>
            <div class="flex flex-wrap items-center gap-4 text-xs">
                <label class="inline-flex items-center gap-1.5">
                    <input
                        type="radio"
                        name="address-mode"
                        prop:checked=move || mode.get() == AddressMode::Existing
                        on:change=move |_| set_mode(AddressMode::Existing)
                    />
                    "Case address"
                </label>
                <label class="inline-flex items-center gap-1.5">
                    <input
                        type="radio"
                        name="address-mode"
                        prop:checked=move || matches!(mode.get(), AddressMode::Saved(_))
                        prop:disabled=move || saved.with(|s| s.is_empty())
                        on:change=move |_| {
                            if let Some(first) = saved.with(|s| s.first().map(|a| a.id.clone())) {
                                set_mode(AddressMode::Saved(first));
                            }
                        }
                    />
                    {move || format!("Saved address ({})", saved.with(|s| s.len()))}
                </label>
                <label class="inline-flex items-center gap-1.5">
                    <input
                        type="radio"
                        name="address-mode"
                        prop:checked=move || mode.get() == AddressMode::New
                        on:change=move |_| set_mode(AddressMode::New)
                    />
                    "New address"
                </label>
            </div>

            {move || match mode.get() {
                AddressMode::Existing => view! {
                    <div class="rounded-md border border-border bg-muted p-2 text-sm">
                        {move || {
                            let r = driver.read(|s| s.resolved_address());
                            if r.is_empty() {
                                "The case has no address on record".to_string()
                            } else {
                                format!("{} {}", r.address, r.postal_code)
                            }
                        }}
                    </div>
                }
                .into_any(),
                AddressMode::Saved(_) => view! {
                    <ul class="space-y-1">
                        {move || {
                            saved
                                .get()
                                .into_iter()
                                .map(|a| {
                                    let id_for_use = a.id.clone();
                                    let id_for_delete = a.id.clone();
                                    let id_for_check = a.id.clone();
                                    view! {
                                        <li class="flex items-center gap-2 text-sm">
                                            <input
                                                type="radio"
                                                name="saved-address"
                                                prop:checked=move || {
                                                    mode.get() == AddressMode::Saved(id_for_check.clone())
                                                }
                                                on:change=move |_| set_mode(AddressMode::Saved(id_for_use.clone()))
                                            />
                                            <span class="flex-1">{format!("{} {}", a.address, a.postal_code)}</span>
                                            <Button
                                                variant=ButtonVariant::Ghost
                                                size=ButtonSize::Sm
                                                class="text-destructive"
                                                attr:disabled=busy
                                                on:click=move |_| {
                                                    driver.dispatch(PopupAction::DeleteAddress(id_for_delete.clone()))
                                                }
                                            >
                                                "Delete"
                                            </Button>
                                        </li>
                                    }
                                })
                                .collect_view()
                        }}
                    </ul>
                }
                .into_any(),
                AddressMode::New => view! {
                    <div class="grid gap-2 sm:grid-cols-[1fr_8rem_auto]">
                        {text_area(
                            move || driver.read(|s| s.new_address.clone()),
                            move |v| driver.dispatch(PopupAction::SetNewAddress(v)),
                            2,
                        )}
                        {text_input(
                            move || driver.read(|s| s.new_postal_code.clone()),
                            move |v| driver.dispatch(PopupAction::SetNewPostalCode(v)),
                            "Postal code",
                        )}
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            attr:disabled=busy
                            on:click=move |_| driver.dispatch(PopupAction::SaveAddress)
                        >
                            {move || if driver.read(|s| s.saving == Some(SaveKind::Address)) {
                                "Saving..."
                            } else {
                                "Save address"
                            }}
                        </Button>
                    </div>
                }
                .into_any(),
            }}
        </div>
    }
}

#[component]
fn NamesSection(driver: PopupDriver) -> impl IntoView {
    let saved = Memo::new(move |_| driver.read(|s| s.saved_names.clone()));

    view! {
        <div class="space-y-2">
            <Label class="text-xs">"Persons named"</Label>
            <div class="flex flex-wrap gap-3 text-sm">
                {move || {
                    saved
                        .get()
                        .into_iter()
                        .map(|name| {
                            let for_check = name.clone();
                            let for_toggle = name.clone();
                            view! {
                                <label class="inline-flex items-center gap-1.5">
                                    <input
                                        type="checkbox"
                                        prop:checked=move || {
                                            driver.read(|s| s.selected_names.contains(&for_check))
                                        }
                                        on:change=move |_| {
                                            driver.dispatch(PopupAction::ToggleName(for_toggle.clone()))
                                        }
                                    />
                                    {name}
                                </label>
                            }
                        })
                        .collect_view()
                }}
            </div>
            <div class="flex items-center gap-2">
                {text_input(
                    move || driver.read(|s| s.name_input.clone()),
                    move |v| driver.dispatch(PopupAction::SetNameInput(v)),
                    "Another name",
                )}
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=move || driver.read(|s| s.in_flight())
                    on:click=move |_| driver.dispatch(PopupAction::SaveName)
                >
                    "Save name"
                </Button>
            </div>
        </div>
    }
}

#[component]
fn DocumentFields(driver: PopupDriver, doc: Memo<Option<DocumentType>>) -> impl IntoView {
    move || match doc.get() {
        Some(DocumentType::Cp3) => view! { <BankAccounts driver=driver /> }.into_any(),
        Some(DocumentType::Cp25) => view! {
            <div class="grid gap-3 sm:grid-cols-2">
                <div class="space-y-1">
                    <Label class="text-xs">"Hearing date"</Label>
                    {date_input(
                        move || driver.read(|s| s.fields.hearing_date),
                        move |d| driver.dispatch(PopupAction::SetHearingDate(d)),
                    )}
                </div>
                <div class="space-y-1">
                    <Label class="text-xs">"CP-1 date"</Label>
                    <div class="flex items-center gap-2">
                        {date_input(
                            move || driver.read(|s| s.fields.cp1_date),
                            move |d| driver.dispatch(PopupAction::SetCp1Date(d)),
                        )}
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            attr:disabled=move || driver.read(|s| s.in_flight())
                            on:click=move |_| driver.dispatch(PopupAction::SaveCp1Date)
                        >
                            "Save"
                        </Button>
                    </div>
                </div>
            </div>
        }
        .into_any(),
        Some(DocumentType::Cp26) => view! {
            <div class="space-y-1">
                <Label class="text-xs">"Show-cause notice reference"</Label>
                {text_input(
                    move || driver.read(|s| s.fields.show_cause_ref.clone()),
                    move |v| driver.dispatch(PopupAction::SetShowCauseRef(v)),
                    "CP-25 No.",
                )}
            </div>
        }
        .into_any(),
        Some(DocumentType::EstaLetter) => view! {
            <div class="space-y-2">
                <div class="space-y-1">
                    <Label class="text-xs">"Subject"</Label>
                    <div class="flex items-center gap-2">
                        {text_input(
                            move || driver.read(|s| s.fields.subject.clone()),
                            move |v| driver.dispatch(PopupAction::SetSubject(v)),
                            "",
                        )}
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            attr:disabled=move || driver.read(|s| s.in_flight())
                            on:click=move |_| driver.dispatch(PopupAction::DraftLetterBody)
                        >
                            {move || if driver.read(|s| s.saving == Some(SaveKind::LetterBody)) {
                                "Drafting..."
                            } else {
                                "Draft body"
                            }}
                        </Button>
                    </div>
                </div>
                <div class="space-y-1">
                    <Label class="text-xs">"Letter body"</Label>
                    {text_area(
                        move || driver.read(|s| s.fields.letter_body.clone()),
                        move |v| driver.dispatch(PopupAction::SetLetterBody(v)),
                        8,
                    )}
                </div>
            </div>
        }
        .into_any(),
        Some(DocumentType::IncomeTaxLetter) => view! {
            <div class="space-y-1">
                <Label class="text-xs">"PAN"</Label>
                {text_input(
                    move || driver.read(|s| s.fields.pan.clone()),
                    move |v| driver.dispatch(PopupAction::SetPan(v)),
                    "ABCDE1234F",
                )}
            </div>
        }
        .into_any(),
        None => ().into_any(),
    }
}

#[component]
fn BankAccounts(driver: PopupDriver) -> impl IntoView {
    let count = Memo::new(move |_| driver.read(|s| s.fields.bank_accounts.len()));

    let account = move |i: usize| {
        driver.read(|s| s.fields.bank_accounts.get(i).cloned().unwrap_or_default())
    };
    let current = move |i: usize| {
        driver.peek(|s| s.fields.bank_accounts.get(i).cloned().unwrap_or_default())
    };

    view! {
        <div class="space-y-2">
            <Label class="text-xs">"Bank accounts"</Label>
            <For each=move || 0..count.get() key=|i| *i let:i>
                <div class="flex items-center gap-2">
                    {text_input(
                        move || account(i).bank_name,
                        move |v| driver.dispatch(PopupAction::UpdateBankAccount(
                            i,
                            BankAccount { bank_name: v, ..current(i) },
                        )),
                        "Bank name",
                    )}
                    {text_input(
                        move || account(i).account_no,
                        move |v| driver.dispatch(PopupAction::UpdateBankAccount(
                            i,
                            BankAccount { account_no: v, ..current(i) },
                        )),
                        "Account number",
                    )}
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Sm
                        class="text-destructive"
                        on:click=move |_| driver.dispatch(PopupAction::RemoveBankAccount(i))
                    >
                        "Remove"
                    </Button>
                </div>
            </For>
            <Button
                variant=ButtonVariant::Outline
                size=ButtonSize::Sm
                on:click=move |_| driver.dispatch(PopupAction::AddBankAccount)
            >
                "Add account"
            </Button>
        </div>
    }
}
