//! Popup state and its reducer.
//!
//! `update(state, action)` is the only way popup state changes. It returns
//! effects for the host to execute: timers, backend tasks and caller
//! notifications. Backend tasks answer with another action that carries the
//! epoch it was issued under, so answers for a closed or reopened popup are
//! dropped here instead of being guarded at every call site.

use super::address::{is_already_saved, resolve_address, AddressMode, ResolvedAddress};
use super::debounce::DebounceSlot;
use super::kind::{DocumentType, HEARING_OFFSET_BUSINESS_DAYS};
use super::remark::derive_remark;
use super::validate::validate;
use crate::api::{SaveEmployerEntryRequest, UpdateCaseRequest};
use crate::models::{BankAccount, CaseRecord, OfficeRecord, SavedAddress};
use crate::util::{add_business_days, format_iso, is_valid_postal_code};
use chrono::NaiveDate;
use leptos::logging::warn;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Phase {
    #[default]
    Closed,
    /// Open, auxiliary lists still loading.
    Loading,
    Ready,
    Submitting,
}

/// Single-field saves running next to (never during) generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SaveKind {
    Name,
    Address,
    DeleteAddress,
    CaseDate,
    LetterBody,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct AuxLoads {
    pub addresses: bool,
    pub names: bool,
    pub officer: bool,
}

impl AuxLoads {
    fn any(&self) -> bool {
        self.addresses || self.names || self.officer
    }
}

/// Fields only some notice types use.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct NoticeFields {
    pub hearing_date: Option<NaiveDate>,
    /// Set once the user picks a hearing date; stops it following the notice date.
    pub hearing_date_manual: bool,
    pub cp1_date: Option<NaiveDate>,
    pub bank_accounts: Vec<BankAccount>,
    pub show_cause_ref: String,
    pub pan: String,
    pub subject: String,
    pub letter_body: String,
    pub office_name: String,
    pub officer_designation: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PopupState {
    pub phase: Phase,
    /// Bumped on every open/close; async answers from older epochs are dropped.
    pub epoch: u64,
    pub doc: Option<DocumentType>,
    pub case: Option<CaseRecord>,
    pub identity: String,

    pub notice_date: Option<NaiveDate>,

    pub address_mode: AddressMode,
    pub new_address: String,
    pub new_postal_code: String,
    pub saved_addresses: Vec<SavedAddress>,

    pub saved_names: Vec<String>,
    pub selected_names: Vec<String>,
    pub name_input: String,

    pub officer: Option<String>,
    /// Postal code the officer was last looked up for.
    pub officer_postal: Option<String>,

    pub fields: NoticeFields,

    pub remark: String,
    pub remark_manual: bool,

    pub loads: AuxLoads,
    pub saving: Option<SaveKind>,
    pub error: Option<String>,
    pub status: Option<String>,

    pub remark_slot: DebounceSlot,
    pub postal_slot: DebounceSlot,
}

impl PopupState {
    pub fn is_open(&self) -> bool {
        self.phase != Phase::Closed
    }

    pub fn in_flight(&self) -> bool {
        self.phase == Phase::Submitting || self.saving.is_some()
    }

    pub fn can_cancel(&self) -> bool {
        !self.in_flight()
    }

    pub fn can_generate(&self) -> bool {
        self.is_open() && !self.in_flight() && validate(self).is_ok()
    }

    pub fn resolved_address(&self) -> ResolvedAddress {
        resolve_address(
            &self.address_mode,
            self.case.as_ref(),
            &self.saved_addresses,
            &self.new_address,
            &self.new_postal_code,
        )
    }

    pub fn active_postal_code(&self) -> String {
        self.resolved_address().postal_code
    }

    /// Selected names plus the one being typed, deduplicated.
    pub fn effective_names(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .selected_names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        let typed = self.name_input.trim();
        if !typed.is_empty() && !out.iter().any(|n| n == typed) {
            out.push(typed.to_string());
        }
        out
    }

    pub fn derived_remark(&self) -> String {
        match self.doc {
            Some(doc) => derive_remark(doc, self.notice_date, &self.effective_names()),
            None => String::new(),
        }
    }

    fn establishment_code(&self) -> String {
        self.case
            .as_ref()
            .map(|c| c.establishment_code.clone())
            .unwrap_or_default()
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.is_open() && self.epoch == epoch
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PopupAction {
    Open {
        doc: DocumentType,
        case: Option<CaseRecord>,
        identity: Option<String>,
        office: Option<OfficeRecord>,
        today: NaiveDate,
    },
    /// Cancel / backdrop / close button. Ignored while a request is in flight.
    Close,
    /// Host tore the popup down; unconditional and silent.
    Discard,

    SetNoticeDate(Option<NaiveDate>),
    SetHearingDate(Option<NaiveDate>),
    SetCp1Date(Option<NaiveDate>),
    SetShowCauseRef(String),
    SetPan(String),
    SetSubject(String),
    SetLetterBody(String),
    SetOfficeName(String),
    SetOfficerDesignation(String),
    AddBankAccount,
    UpdateBankAccount(usize, BankAccount),
    RemoveBankAccount(usize),

    SetAddressMode(AddressMode),
    SetNewAddress(String),
    SetNewPostalCode(String),

    SetNameInput(String),
    ToggleName(String),

    EditRemark(String),
    RemarkTimerFired(u64),
    PostalTimerFired(u64),

    SavedAddressesLoaded {
        epoch: u64,
        result: Result<Vec<SavedAddress>, String>,
    },
    SavedNamesLoaded {
        epoch: u64,
        result: Result<Vec<String>, String>,
    },
    OfficerLoaded {
        epoch: u64,
        postal_code: String,
        result: Result<Option<String>, String>,
    },

    SaveName,
    SaveAddress,
    DeleteAddress(String),
    SaveCp1Date,
    DraftLetterBody,
    SaveFinished {
        epoch: u64,
        kind: SaveKind,
        result: Result<(), String>,
    },
    LetterBodyDrafted {
        epoch: u64,
        result: Result<String, String>,
    },

    Generate,
    GenerateFinished {
        epoch: u64,
        result: Result<(), String>,
    },
}

/// Body of `POST /notices/{slug}/generate`.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    pub identity: String,
    pub establishment_code: String,
    pub case_no: String,
    pub case_id: String,
    pub establishment_name: String,
    pub notice_date: String,
    pub address: String,
    pub postal_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforcement_officer: Option<String>,
    pub office_name: String,
    pub officer_designation: String,
    /// Filled in only if the user agrees to record it on the case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hearing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cp1_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bank_accounts: Vec<BankAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_cause_ref: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_body: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GenerateJob {
    pub doc: DocumentType,
    pub request: GenerateRequest,
    /// Offered as the default text when the user opts into a remark.
    pub suggested_remark: String,
}

/// Backend work. Each task resolves to exactly one follow-up action.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Task {
    LoadSavedAddresses {
        epoch: u64,
        identity: String,
        establishment_code: String,
    },
    LoadSavedNames {
        epoch: u64,
        identity: String,
        establishment_code: String,
    },
    LookupOfficer {
        epoch: u64,
        identity: String,
        postal_code: String,
    },
    SaveEntry {
        epoch: u64,
        kind: SaveKind,
        request: SaveEmployerEntryRequest,
    },
    DeleteAddress {
        epoch: u64,
        identity: String,
        id: String,
    },
    UpdateCase {
        epoch: u64,
        case_id: String,
        request: UpdateCaseRequest,
    },
    DraftLetterBody {
        epoch: u64,
        prompt: String,
    },
    Generate {
        epoch: u64,
        job: GenerateJob,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PopupEffect {
    Run(Task),
    ScheduleRemark(u64),
    CancelRemark,
    SchedulePostalLookup(u64),
    NotifyRefresh,
    NotifySuccess(String),
    NotifyClose,
}

pub(crate) fn update(state: &mut PopupState, action: PopupAction) -> Vec<PopupEffect> {
    match action {
        PopupAction::Open {
            doc,
            case,
            identity,
            office,
            today,
        } => open(state, doc, case, identity, office, today),
        PopupAction::Close => {
            if !state.is_open() || state.in_flight() {
                return vec![];
            }
            reset_closed(state);
            vec![PopupEffect::CancelRemark, PopupEffect::NotifyClose]
        }
        PopupAction::Discard => {
            if !state.is_open() {
                return vec![];
            }
            reset_closed(state);
            vec![PopupEffect::CancelRemark]
        }
        action if !state.is_open() => {
            warn!("[notice] dropped {action:?} on closed popup");
            vec![]
        }
        PopupAction::SetNoticeDate(d) => {
            state.notice_date = d;
            follow_notice_date(state);
            schedule_remark(state)
        }
        PopupAction::SetHearingDate(d) => {
            state.fields.hearing_date = d;
            state.fields.hearing_date_manual = d.is_some();
            if d.is_none() {
                follow_notice_date(state);
            }
            vec![]
        }
        PopupAction::SetCp1Date(d) => {
            state.fields.cp1_date = d;
            vec![]
        }
        PopupAction::SetShowCauseRef(s) => {
            state.fields.show_cause_ref = s;
            vec![]
        }
        PopupAction::SetPan(s) => {
            state.fields.pan = s.trim().to_ascii_uppercase();
            vec![]
        }
        PopupAction::SetSubject(s) => {
            state.fields.subject = s;
            vec![]
        }
        PopupAction::SetLetterBody(s) => {
            state.fields.letter_body = s;
            vec![]
        }
        PopupAction::SetOfficeName(s) => {
            state.fields.office_name = s;
            vec![]
        }
        PopupAction::SetOfficerDesignation(s) => {
            state.fields.officer_designation = s;
            vec![]
        }
        PopupAction::AddBankAccount => {
            state.fields.bank_accounts.push(BankAccount::default());
            vec![]
        }
        PopupAction::UpdateBankAccount(i, account) => {
            if let Some(slot) = state.fields.bank_accounts.get_mut(i) {
                *slot = account;
            }
            vec![]
        }
        PopupAction::RemoveBankAccount(i) => {
            if i < state.fields.bank_accounts.len() {
                state.fields.bank_accounts.remove(i);
            }
            vec![]
        }
        PopupAction::SetAddressMode(mode) => {
            if let AddressMode::Saved(id) = &mode {
                if !state.saved_addresses.iter().any(|a| &a.id == id) {
                    state.error = Some("Selected address is no longer available".to_string());
                    return vec![];
                }
            }
            state.address_mode = mode;
            schedule_postal_lookup(state)
        }
        PopupAction::SetNewAddress(s) => {
            state.new_address = s;
            vec![]
        }
        PopupAction::SetNewPostalCode(s) => {
            state.new_postal_code = s.chars().filter(|c| c.is_ascii_digit()).take(6).collect();
            schedule_postal_lookup(state)
        }
        PopupAction::SetNameInput(s) => {
            state.name_input = s;
            schedule_remark(state)
        }
        PopupAction::ToggleName(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return vec![];
            }
            if let Some(i) = state.selected_names.iter().position(|n| n == &name) {
                state.selected_names.remove(i);
            } else {
                state.selected_names.push(name);
            }
            schedule_remark(state)
        }
        PopupAction::EditRemark(s) => {
            state.remark = s;
            state.remark_manual = true;
            state.remark_slot.cancel();
            vec![PopupEffect::CancelRemark]
        }
        PopupAction::RemarkTimerFired(ticket) => {
            if state.remark_slot.take(ticket) {
                state.remark = state.derived_remark();
                state.remark_manual = false;
            }
            vec![]
        }
        PopupAction::PostalTimerFired(ticket) => {
            if !state.postal_slot.take(ticket) {
                return vec![];
            }
            let postal_code = state.active_postal_code();
            if !is_valid_postal_code(&postal_code) {
                // Any lookup still out is for a code no longer shown.
                state.officer = None;
                state.officer_postal = None;
                state.loads.officer = false;
                settle_loading(state);
                return vec![];
            }
            if state.officer_postal.as_deref() == Some(postal_code.as_str()) {
                return vec![];
            }
            lookup_officer(state, postal_code)
        }
        PopupAction::SavedAddressesLoaded { epoch, result } => {
            if !state.is_current(epoch) {
                return vec![];
            }
            state.loads.addresses = false;
            state.saved_addresses = result.unwrap_or_else(|e| {
                report_load_error(state, "saved addresses", e);
                vec![]
            });
            // A deleted-elsewhere selection falls back to the case address.
            if let AddressMode::Saved(id) = &state.address_mode {
                if !state.saved_addresses.iter().any(|a| &a.id == id) {
                    state.address_mode = AddressMode::Existing;
                }
            }
            settle_loading(state);
            vec![]
        }
        PopupAction::SavedNamesLoaded { epoch, result } => {
            if !state.is_current(epoch) {
                return vec![];
            }
            state.loads.names = false;
            state.saved_names = result.unwrap_or_else(|e| {
                report_load_error(state, "saved names", e);
                vec![]
            });
            settle_loading(state);
            vec![]
        }
        PopupAction::OfficerLoaded {
            epoch,
            postal_code,
            result,
        } => {
            if !state.is_current(epoch) {
                return vec![];
            }
            // Only the answer for the latest requested postal code counts.
            if state.officer_postal.as_deref() != Some(postal_code.as_str()) {
                if state.officer_postal.is_none() {
                    state.loads.officer = false;
                    settle_loading(state);
                }
                return vec![];
            }
            state.loads.officer = false;
            match result {
                Ok(officer) => state.officer = officer,
                Err(e) => {
                    state.officer = None;
                    warn!("[notice] officer lookup for {postal_code} failed: {e}");
                }
            }
            settle_loading(state);
            vec![]
        }
        PopupAction::SaveName => save_name(state),
        PopupAction::SaveAddress => save_address(state),
        PopupAction::DeleteAddress(id) => delete_address(state, id),
        PopupAction::SaveCp1Date => save_cp1_date(state),
        PopupAction::DraftLetterBody => draft_letter_body(state),
        PopupAction::SaveFinished {
            epoch,
            kind,
            result,
        } => save_finished(state, epoch, kind, result),
        PopupAction::LetterBodyDrafted { epoch, result } => {
            if !state.is_current(epoch) || state.saving != Some(SaveKind::LetterBody) {
                return vec![];
            }
            state.saving = None;
            match result {
                Ok(body) if !body.trim().is_empty() => state.fields.letter_body = body,
                Ok(_) => state.error = Some("No letter text was returned".to_string()),
                Err(e) => state.error = Some(e),
            }
            vec![]
        }
        PopupAction::Generate => generate(state),
        PopupAction::GenerateFinished { epoch, result } => {
            if !state.is_current(epoch) || state.phase != Phase::Submitting {
                return vec![];
            }
            match result {
                Ok(()) => {
                    let msg = state
                        .doc
                        .map(DocumentType::success_message)
                        .unwrap_or_default();
                    reset_closed(state);
                    vec![
                        PopupEffect::CancelRemark,
                        PopupEffect::NotifyRefresh,
                        PopupEffect::NotifySuccess(msg),
                        PopupEffect::NotifyClose,
                    ]
                }
                Err(e) => {
                    state.phase = if state.loads.any() {
                        Phase::Loading
                    } else {
                        Phase::Ready
                    };
                    state.error = Some(e);
                    vec![]
                }
            }
        }
    }
}

fn open(
    state: &mut PopupState,
    doc: DocumentType,
    case: Option<CaseRecord>,
    identity: Option<String>,
    office: Option<OfficeRecord>,
    today: NaiveDate,
) -> Vec<PopupEffect> {
    let identity = identity.filter(|i| !i.trim().is_empty());
    let (Some(case), Some(identity)) = (case, identity) else {
        // Nothing to show; an open popup for another case goes away.
        if state.is_open() && !state.in_flight() {
            reset_closed(state);
            return vec![PopupEffect::CancelRemark];
        }
        return vec![];
    };

    let same_target = state.is_open()
        && state.doc == Some(doc)
        && state.identity == identity
        && state.case.as_ref().map(CaseRecord::key) == Some(case.key());
    if same_target {
        return vec![];
    }

    let office = office.unwrap_or_default();
    let next_epoch = state.epoch.wrapping_add(1);
    let remark_slot = state.remark_slot.clone();
    let postal_slot = state.postal_slot.clone();

    *state = PopupState {
        phase: Phase::Loading,
        epoch: next_epoch,
        doc: Some(doc),
        notice_date: Some(today),
        fields: NoticeFields {
            cp1_date: case.parsed_cp1_date(),
            bank_accounts: if doc == DocumentType::Cp3 {
                vec![BankAccount::default()]
            } else {
                vec![]
            },
            office_name: office.office_name.clone(),
            officer_designation: office.officer_designation.clone(),
            ..Default::default()
        },
        officer: Some(case.enforcement_officer.trim().to_string()).filter(|o| !o.is_empty()),
        identity,
        case: Some(case),
        remark_slot,
        postal_slot,
        ..Default::default()
    };
    state.remark_slot.cancel();
    state.postal_slot.cancel();
    follow_notice_date(state);
    state.remark = state.derived_remark();

    let establishment_code = state.establishment_code();
    state.loads.addresses = true;
    state.loads.names = true;
    let mut effects = vec![
        PopupEffect::CancelRemark,
        PopupEffect::Run(Task::LoadSavedAddresses {
            epoch: state.epoch,
            identity: state.identity.clone(),
            establishment_code: establishment_code.clone(),
        }),
        PopupEffect::Run(Task::LoadSavedNames {
            epoch: state.epoch,
            identity: state.identity.clone(),
            establishment_code,
        }),
    ];

    let postal_code = state.active_postal_code();
    if !postal_code.is_empty() {
        effects.extend(lookup_officer(state, postal_code));
    }

    effects
}

fn reset_closed(state: &mut PopupState) {
    let epoch = state.epoch.wrapping_add(1);
    let mut remark_slot = state.remark_slot.clone();
    let mut postal_slot = state.postal_slot.clone();
    remark_slot.cancel();
    postal_slot.cancel();
    *state = PopupState {
        epoch,
        remark_slot,
        postal_slot,
        ..Default::default()
    };
}

fn settle_loading(state: &mut PopupState) {
    if state.phase == Phase::Loading && !state.loads.any() {
        state.phase = Phase::Ready;
    }
}

fn report_load_error(state: &mut PopupState, what: &str, e: String) {
    warn!("[notice] loading {what} failed: {e}");
    if state.error.is_none() {
        state.error = Some(format!("Could not load {what}: {e}"));
    }
}

/// CP-25 hearing date tracks the notice date until the user sets it.
fn follow_notice_date(state: &mut PopupState) {
    if state.doc != Some(DocumentType::Cp25) || state.fields.hearing_date_manual {
        return;
    }
    state.fields.hearing_date = state
        .notice_date
        .map(|d| add_business_days(d, HEARING_OFFSET_BUSINESS_DAYS));
}

fn schedule_remark(state: &mut PopupState) -> Vec<PopupEffect> {
    vec![PopupEffect::ScheduleRemark(state.remark_slot.schedule())]
}

fn schedule_postal_lookup(state: &mut PopupState) -> Vec<PopupEffect> {
    if state.officer_postal.as_deref() == Some(state.active_postal_code().as_str()) {
        state.postal_slot.cancel();
        return vec![];
    }
    vec![PopupEffect::SchedulePostalLookup(state.postal_slot.schedule())]
}

fn lookup_officer(state: &mut PopupState, postal_code: String) -> Vec<PopupEffect> {
    state.officer_postal = Some(postal_code.clone());
    state.loads.officer = true;
    vec![PopupEffect::Run(Task::LookupOfficer {
        epoch: state.epoch,
        identity: state.identity.clone(),
        postal_code,
    })]
}

fn begin_save(state: &mut PopupState, kind: SaveKind) -> bool {
    if state.in_flight() {
        return false;
    }
    state.saving = Some(kind);
    state.error = None;
    state.status = None;
    true
}

fn save_name(state: &mut PopupState) -> Vec<PopupEffect> {
    let name = state.name_input.trim().to_string();
    if name.is_empty() {
        state.error = Some("Enter an employer name to save".to_string());
        return vec![];
    }
    if state.saved_names.iter().any(|n| n == &name) {
        state.name_input.clear();
        state.status = Some("Name already saved".to_string());
        return schedule_remark(state);
    }
    if !begin_save(state, SaveKind::Name) {
        return vec![];
    }
    vec![PopupEffect::Run(Task::SaveEntry {
        epoch: state.epoch,
        kind: SaveKind::Name,
        request: SaveEmployerEntryRequest {
            identity: state.identity.clone(),
            establishment_code: state.establishment_code(),
            employer_name: Some(name),
            ..Default::default()
        },
    })]
}

fn save_address(state: &mut PopupState) -> Vec<PopupEffect> {
    if state.address_mode != AddressMode::New {
        state.error = Some("Choose \"New address\" to save an address".to_string());
        return vec![];
    }
    let address = state.new_address.trim().to_string();
    let postal_code = state.new_postal_code.trim().to_string();
    if !is_valid_postal_code(&postal_code) {
        state.error = Some("Enter a valid 6-digit postal code".to_string());
        return vec![];
    }
    if address.is_empty() {
        state.error = Some("Enter the address to save".to_string());
        return vec![];
    }
    if is_already_saved(&state.saved_addresses, &address, &postal_code) {
        state.error = None;
        state.status = Some("Address already saved".to_string());
        return vec![];
    }
    if !begin_save(state, SaveKind::Address) {
        return vec![];
    }
    let employer_name = state
        .case
        .as_ref()
        .map(|c| c.establishment_name.trim().to_string())
        .filter(|n| !n.is_empty());
    vec![PopupEffect::Run(Task::SaveEntry {
        epoch: state.epoch,
        kind: SaveKind::Address,
        request: SaveEmployerEntryRequest {
            identity: state.identity.clone(),
            establishment_code: state.establishment_code(),
            employer_name,
            address: Some(address),
            postal_code: Some(postal_code),
        },
    })]
}

fn delete_address(state: &mut PopupState, id: String) -> Vec<PopupEffect> {
    if !state.saved_addresses.iter().any(|a| a.id == id) {
        state.error = Some("Address not found".to_string());
        return vec![];
    }
    if !begin_save(state, SaveKind::DeleteAddress) {
        return vec![];
    }
    state.status = None;
    vec![PopupEffect::Run(Task::DeleteAddress {
        epoch: state.epoch,
        identity: state.identity.clone(),
        id,
    })]
}

fn save_cp1_date(state: &mut PopupState) -> Vec<PopupEffect> {
    let Some(date) = state.fields.cp1_date else {
        state.error = Some("Enter the CP-1 date".to_string());
        return vec![];
    };
    let case_id = state
        .case
        .as_ref()
        .map(|c| c.id.clone())
        .unwrap_or_default();
    if case_id.trim().is_empty() {
        state.error = Some("This case cannot be updated".to_string());
        return vec![];
    }
    if !begin_save(state, SaveKind::CaseDate) {
        return vec![];
    }
    let mut field_updates = serde_json::Map::new();
    field_updates.insert("cp1Date".to_string(), format_iso(date).into());
    vec![PopupEffect::Run(Task::UpdateCase {
        epoch: state.epoch,
        case_id,
        request: UpdateCaseRequest {
            identity: state.identity.clone(),
            field_updates,
        },
    })]
}

fn draft_letter_body(state: &mut PopupState) -> Vec<PopupEffect> {
    let subject = state.fields.subject.trim().to_string();
    if subject.is_empty() {
        state.error = Some("Enter a subject to draft the letter".to_string());
        return vec![];
    }
    if !begin_save(state, SaveKind::LetterBody) {
        return vec![];
    }
    let establishment = state
        .case
        .as_ref()
        .map(|c| {
            if c.establishment_name.trim().is_empty() {
                c.establishment_code.clone()
            } else {
                c.establishment_name.clone()
            }
        })
        .unwrap_or_default();
    vec![PopupEffect::Run(Task::DraftLetterBody {
        epoch: state.epoch,
        prompt: format!(
            "Draft the body of a formal letter to {establishment} regarding: {subject}"
        ),
    })]
}

fn save_finished(
    state: &mut PopupState,
    epoch: u64,
    kind: SaveKind,
    result: Result<(), String>,
) -> Vec<PopupEffect> {
    if !state.is_current(epoch) || state.saving != Some(kind) {
        return vec![];
    }
    state.saving = None;

    if let Err(e) = result {
        state.error = Some(e);
        return vec![];
    }

    match kind {
        SaveKind::Name => {
            state.name_input.clear();
            state.status = Some("Name saved".to_string());
            state.loads.names = true;
            let mut effects = vec![PopupEffect::Run(reload_task(state, true))];
            effects.extend(schedule_remark(state));
            effects
        }
        SaveKind::Address => {
            state.status = Some("Address saved".to_string());
            state.loads.addresses = true;
            vec![PopupEffect::Run(reload_task(state, false))]
        }
        SaveKind::DeleteAddress => {
            state.status = Some("Address deleted".to_string());
            state.loads.addresses = true;
            // The list refresh resets a vanished selection to the case address.
            vec![PopupEffect::Run(reload_task(state, false))]
        }
        SaveKind::CaseDate => {
            if let (Some(case), Some(d)) = (state.case.as_mut(), state.fields.cp1_date) {
                case.cp1_date = Some(format_iso(d));
            }
            state.status = Some("CP-1 date saved".to_string());
            vec![]
        }
        SaveKind::LetterBody => vec![],
    }
}

/// Re-fetch of the saved names (or addresses) after a successful write.
fn reload_task(state: &PopupState, names: bool) -> Task {
    let identity = state.identity.clone();
    let establishment_code = state.establishment_code();
    let epoch = state.epoch;
    if names {
        Task::LoadSavedNames {
            epoch,
            identity,
            establishment_code,
        }
    } else {
        Task::LoadSavedAddresses {
            epoch,
            identity,
            establishment_code,
        }
    }
}

fn generate(state: &mut PopupState) -> Vec<PopupEffect> {
    if state.in_flight() {
        return vec![];
    }
    if let Err(e) = validate(state) {
        state.error = Some(e.to_string());
        return vec![];
    }
    let Some(doc) = state.doc else {
        return vec![];
    };
    let Some(notice_date) = state.notice_date else {
        return vec![];
    };

    let case = state.case.clone().unwrap_or_default();
    let resolved = state.resolved_address();
    let f = &state.fields;
    let opt = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

    let mut request = GenerateRequest {
        identity: state.identity.clone(),
        establishment_code: case.establishment_code.clone(),
        case_no: case.cert_no.clone(),
        case_id: case.id.clone(),
        establishment_name: case.establishment_name.clone(),
        notice_date: format_iso(notice_date),
        address: resolved.address,
        postal_code: resolved.postal_code,
        enforcement_officer: state.officer.clone(),
        office_name: f.office_name.trim().to_string(),
        officer_designation: f.officer_designation.trim().to_string(),
        ..Default::default()
    };

    match doc {
        DocumentType::Cp3 => {
            request.bank_accounts = f
                .bank_accounts
                .iter()
                .filter(|a| a.is_complete())
                .map(|a| BankAccount {
                    bank_name: a.bank_name.trim().to_string(),
                    account_no: a.account_no.trim().to_string(),
                })
                .collect();
        }
        DocumentType::Cp25 => {
            request.hearing_date = f.hearing_date.map(format_iso);
            request.cp1_date = f.cp1_date.map(format_iso);
            request.names = state.effective_names();
        }
        DocumentType::Cp26 => {
            request.show_cause_ref = opt(&f.show_cause_ref);
            request.names = state.effective_names();
        }
        DocumentType::EstaLetter => {
            request.subject = opt(&f.subject);
            request.letter_body = opt(&f.letter_body);
        }
        DocumentType::IncomeTaxLetter => {
            request.pan = opt(&f.pan);
        }
    }

    let suggested_remark = if state.remark.trim().is_empty() {
        state.derived_remark()
    } else {
        state.remark.trim().to_string()
    };

    state.phase = Phase::Submitting;
    state.error = None;
    state.status = None;

    vec![PopupEffect::Run(Task::Generate {
        epoch: state.epoch,
        job: GenerateJob {
            doc,
            request,
            suggested_remark,
        },
    })]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn sample_case() -> CaseRecord {
        CaseRecord {
            id: "case-1".to_string(),
            establishment_code: "PUPUN0000001000".to_string(),
            cert_no: "RRC/12/2023".to_string(),
            establishment_name: "ACME Forgings".to_string(),
            address1: "Plot 4, MIDC".to_string(),
            city: "Pune".to_string(),
            postal_code: "411019".to_string(),
            ..Default::default()
        }
    }

    fn open_action(doc: DocumentType, case: Option<CaseRecord>) -> PopupAction {
        PopupAction::Open {
            doc,
            case,
            identity: Some("user-7".to_string()),
            office: Some(OfficeRecord {
                office_name: "RO Pune".to_string(),
                officer_designation: "Recovery Officer".to_string(),
                ..Default::default()
            }),
            today: ymd(2024, 3, 1),
        }
    }

    fn opened(doc: DocumentType) -> PopupState {
        let mut s = PopupState::default();
        update(&mut s, open_action(doc, Some(sample_case())));
        let epoch = s.epoch;
        update(
            &mut s,
            PopupAction::SavedAddressesLoaded {
                epoch,
                result: Ok(vec![SavedAddress {
                    id: "a1".to_string(),
                    address: "Office 2, Camp".to_string(),
                    postal_code: "411001".to_string(),
                    employer_name: String::new(),
                }]),
            },
        );
        update(
            &mut s,
            PopupAction::SavedNamesLoaded {
                epoch,
                result: Ok(vec!["R. Shah".to_string()]),
            },
        );
        update(
            &mut s,
            PopupAction::OfficerLoaded {
                epoch,
                postal_code: "411019".to_string(),
                result: Ok(Some("S. Kale".to_string())),
            },
        );
        s
    }

    fn runs(effects: &[PopupEffect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, PopupEffect::Run(_)))
            .count()
    }

    #[test]
    fn test_open_without_case_or_identity_is_noop() {
        let mut s = PopupState::default();
        assert!(update(&mut s, open_action(DocumentType::Cp3, None)).is_empty());
        assert_eq!(s.phase, Phase::Closed);

        let effects = update(
            &mut s,
            PopupAction::Open {
                doc: DocumentType::Cp3,
                case: Some(sample_case()),
                identity: Some("  ".to_string()),
                office: None,
                today: ymd(2024, 3, 1),
            },
        );
        assert!(effects.is_empty());
        assert!(!s.is_open());
    }

    #[test]
    fn test_open_resets_and_loads_aux_lists() {
        let mut s = PopupState::default();
        let effects = update(&mut s, open_action(DocumentType::Cp25, Some(sample_case())));

        assert_eq!(s.phase, Phase::Loading);
        assert_eq!(s.notice_date, Some(ymd(2024, 3, 1)));
        assert_eq!(s.address_mode, AddressMode::Existing);
        assert_eq!(s.fields.office_name, "RO Pune");
        assert_eq!(s.fields.hearing_date, Some(ymd(2024, 4, 2)));
        assert_eq!(s.remark, "01-03-2024 - CP-25 issued");
        // addresses + names + officer (case has a postal code)
        assert_eq!(runs(&effects), 3);
        assert!(effects.iter().any(|e| matches!(
            e,
            PopupEffect::Run(Task::LookupOfficer { postal_code, .. }) if postal_code == "411019"
        )));
    }

    #[test]
    fn test_open_without_postal_code_skips_officer() {
        let mut case = sample_case();
        case.postal_code.clear();
        let mut s = PopupState::default();
        let effects = update(&mut s, open_action(DocumentType::Cp3, Some(case)));
        assert_eq!(runs(&effects), 2);
        assert!(!s.loads.officer);
    }

    #[test]
    fn test_ready_after_all_loads() {
        let s = opened(DocumentType::Cp3);
        assert_eq!(s.phase, Phase::Ready);
        assert_eq!(s.officer.as_deref(), Some("S. Kale"));
        assert_eq!(s.saved_names, vec!["R. Shah".to_string()]);
    }

    #[test]
    fn test_reopen_same_case_keeps_edits() {
        let mut s = opened(DocumentType::Cp3);
        update(&mut s, PopupAction::SetNewAddress("typed".to_string()));
        let effects = update(&mut s, open_action(DocumentType::Cp3, Some(sample_case())));
        assert!(effects.is_empty());
        assert_eq!(s.new_address, "typed");
    }

    #[test]
    fn test_switching_case_resets_state() {
        let mut s = opened(DocumentType::Cp3);
        update(&mut s, PopupAction::SetNewAddress("typed".to_string()));
        let old_epoch = s.epoch;

        let mut other = sample_case();
        other.cert_no = "RRC/99/2024".to_string();
        update(&mut s, open_action(DocumentType::Cp3, Some(other)));

        assert!(s.epoch > old_epoch);
        assert!(s.new_address.is_empty());
        assert_eq!(s.phase, Phase::Loading);

        // Answer for the previous case is dropped.
        update(
            &mut s,
            PopupAction::SavedNamesLoaded {
                epoch: old_epoch,
                result: Ok(vec!["Stale".to_string()]),
            },
        );
        assert!(s.saved_names.is_empty());
    }

    #[test]
    fn test_late_answer_after_close_is_dropped() {
        let mut s = PopupState::default();
        update(&mut s, open_action(DocumentType::Cp3, Some(sample_case())));
        let epoch = s.epoch;
        let effects = update(&mut s, PopupAction::Close);
        assert!(effects.contains(&PopupEffect::NotifyClose));

        let before = s.clone();
        update(
            &mut s,
            PopupAction::SavedAddressesLoaded {
                epoch,
                result: Ok(vec![SavedAddress::default()]),
            },
        );
        assert_eq!(s, before);
    }

    #[test]
    fn test_load_failure_defaults_to_empty() {
        let mut s = PopupState::default();
        update(&mut s, open_action(DocumentType::Cp3, Some(sample_case())));
        let epoch = s.epoch;
        update(
            &mut s,
            PopupAction::SavedAddressesLoaded {
                epoch,
                result: Err("timeout".to_string()),
            },
        );
        assert!(s.saved_addresses.is_empty());
        assert_eq!(
            s.error.as_deref(),
            Some("Could not load saved addresses: timeout")
        );
        assert!(s.is_open());
    }

    #[test]
    fn test_remark_debounce_keeps_latest_only() {
        let mut s = opened(DocumentType::Cp3);

        let first = match update(&mut s, PopupAction::SetNoticeDate(Some(ymd(2024, 1, 15))))[..] {
            [PopupEffect::ScheduleRemark(t)] => t,
            ref other => panic!("unexpected effects {other:?}"),
        };
        let second = match update(&mut s, PopupAction::SetNoticeDate(Some(ymd(2024, 2, 1))))[..] {
            [PopupEffect::ScheduleRemark(t)] => t,
            ref other => panic!("unexpected effects {other:?}"),
        };

        update(&mut s, PopupAction::RemarkTimerFired(first));
        assert_eq!(s.remark, "01-03-2024 - CP-3 issued");

        update(&mut s, PopupAction::RemarkTimerFired(second));
        assert_eq!(s.remark, "01-02-2024 - CP-3 issued");
    }

    #[test]
    fn test_remark_after_settle() {
        let mut s = opened(DocumentType::Cp3);
        let effects = update(&mut s, PopupAction::SetNoticeDate(Some(ymd(2024, 1, 15))));
        let PopupEffect::ScheduleRemark(t) = effects[0] else {
            panic!("expected a remark schedule");
        };
        update(&mut s, PopupAction::RemarkTimerFired(t));
        assert_eq!(s.remark, "15-01-2024 - CP-3 issued");
    }

    #[test]
    fn test_manual_remark_survives_until_inputs_change() {
        let mut s = opened(DocumentType::Cp26);
        let effects = update(&mut s, PopupAction::ToggleName("R. Shah".to_string()));
        let PopupEffect::ScheduleRemark(pending) = effects[0] else {
            panic!("expected a remark schedule");
        };

        update(&mut s, PopupAction::EditRemark("served by hand".to_string()));
        update(&mut s, PopupAction::RemarkTimerFired(pending));
        assert_eq!(s.remark, "served by hand");
        assert!(s.remark_manual);

        let effects = update(&mut s, PopupAction::SetNameInput("A. Rao".to_string()));
        let PopupEffect::ScheduleRemark(t) = effects[0] else {
            panic!("expected a remark schedule");
        };
        update(&mut s, PopupAction::RemarkTimerFired(t));
        assert_eq!(s.remark, "01-03-2024 - CP-26 issued to R. Shah, A. Rao");
        assert!(!s.remark_manual);
    }

    #[test]
    fn test_hearing_date_follows_notice_date_until_set() {
        let mut s = opened(DocumentType::Cp25);
        update(&mut s, PopupAction::SetNoticeDate(Some(ymd(2024, 3, 4))));
        assert_eq!(s.fields.hearing_date, Some(ymd(2024, 4, 3)));

        update(&mut s, PopupAction::SetHearingDate(Some(ymd(2024, 5, 1))));
        update(&mut s, PopupAction::SetNoticeDate(Some(ymd(2024, 3, 1))));
        assert_eq!(s.fields.hearing_date, Some(ymd(2024, 5, 1)));
    }

    #[test]
    fn test_postal_change_debounces_officer_lookup() {
        let mut s = opened(DocumentType::Cp3);
        update(&mut s, PopupAction::SetAddressMode(AddressMode::New));

        let t1 = match update(&mut s, PopupAction::SetNewPostalCode("41100".to_string()))[..] {
            [PopupEffect::SchedulePostalLookup(t)] => t,
            ref other => panic!("unexpected effects {other:?}"),
        };
        let t2 = match update(&mut s, PopupAction::SetNewPostalCode("411002".to_string()))[..] {
            [PopupEffect::SchedulePostalLookup(t)] => t,
            ref other => panic!("unexpected effects {other:?}"),
        };

        assert!(update(&mut s, PopupAction::PostalTimerFired(t1)).is_empty());
        let effects = update(&mut s, PopupAction::PostalTimerFired(t2));
        assert!(matches!(
            &effects[..],
            [PopupEffect::Run(Task::LookupOfficer { postal_code, .. })] if postal_code == "411002"
        ));

        // Stale answer for the case's postal code does not overwrite.
        let epoch = s.epoch;
        update(
            &mut s,
            PopupAction::OfficerLoaded {
                epoch,
                postal_code: "411019".to_string(),
                result: Ok(Some("Old".to_string())),
            },
        );
        update(
            &mut s,
            PopupAction::OfficerLoaded {
                epoch,
                postal_code: "411002".to_string(),
                result: Ok(Some("M. Joshi".to_string())),
            },
        );
        assert_eq!(s.officer.as_deref(), Some("M. Joshi"));
    }

    #[test]
    fn test_switch_to_new_address_before_officer_answer_settles() {
        let mut s = PopupState::default();
        update(&mut s, open_action(DocumentType::Cp3, Some(sample_case())));
        let epoch = s.epoch;
        update(&mut s, PopupAction::SavedAddressesLoaded { epoch, result: Ok(vec![]) });
        update(&mut s, PopupAction::SavedNamesLoaded { epoch, result: Ok(vec![]) });
        assert_eq!(s.phase, Phase::Loading);

        let t = match update(&mut s, PopupAction::SetAddressMode(AddressMode::New))[..] {
            [PopupEffect::SchedulePostalLookup(t)] => t,
            ref other => panic!("unexpected effects {other:?}"),
        };
        assert!(update(&mut s, PopupAction::PostalTimerFired(t)).is_empty());
        assert_eq!(s.phase, Phase::Ready);
        assert!(!s.loads.officer);

        // The answer for the case's postal code arrives after the switch.
        update(
            &mut s,
            PopupAction::OfficerLoaded {
                epoch,
                postal_code: "411019".to_string(),
                result: Ok(Some("S. Kale".to_string())),
            },
        );
        assert_eq!(s.phase, Phase::Ready);
        assert_eq!(s.officer, None);
    }

    #[test]
    fn test_superseded_officer_answer_waits_for_newer_lookup() {
        let mut s = PopupState::default();
        update(&mut s, open_action(DocumentType::Cp3, Some(sample_case())));
        let epoch = s.epoch;
        update(&mut s, PopupAction::SavedAddressesLoaded { epoch, result: Ok(vec![]) });
        update(&mut s, PopupAction::SavedNamesLoaded { epoch, result: Ok(vec![]) });

        update(&mut s, PopupAction::SetAddressMode(AddressMode::New));
        let t = match update(&mut s, PopupAction::SetNewPostalCode("411002".to_string()))[..] {
            [PopupEffect::SchedulePostalLookup(t)] => t,
            ref other => panic!("unexpected effects {other:?}"),
        };
        assert_eq!(runs(&update(&mut s, PopupAction::PostalTimerFired(t))), 1);

        update(
            &mut s,
            PopupAction::OfficerLoaded {
                epoch,
                postal_code: "411019".to_string(),
                result: Ok(Some("Old".to_string())),
            },
        );
        assert_eq!(s.phase, Phase::Loading);

        update(
            &mut s,
            PopupAction::OfficerLoaded {
                epoch,
                postal_code: "411002".to_string(),
                result: Ok(None),
            },
        );
        assert_eq!(s.phase, Phase::Ready);
    }

    #[test]
    fn test_saved_mode_switch_triggers_lookup() {
        let mut s = opened(DocumentType::Cp3);
        let effects = update(
            &mut s,
            PopupAction::SetAddressMode(AddressMode::Saved("a1".to_string())),
        );
        assert!(matches!(effects[..], [PopupEffect::SchedulePostalLookup(_)]));
        assert_eq!(s.active_postal_code(), "411001");
    }

    #[test]
    fn test_unknown_saved_address_rejected() {
        let mut s = opened(DocumentType::Cp3);
        let effects = update(
            &mut s,
            PopupAction::SetAddressMode(AddressMode::Saved("nope".to_string())),
        );
        assert!(effects.is_empty());
        assert_eq!(s.address_mode, AddressMode::Existing);
        assert!(s.error.is_some());
    }

    #[test]
    fn test_new_address_needs_postal_code() {
        let mut s = opened(DocumentType::Cp3);
        update(
            &mut s,
            PopupAction::UpdateBankAccount(
                0,
                BankAccount {
                    bank_name: "SBI".to_string(),
                    account_no: "0011".to_string(),
                },
            ),
        );
        update(&mut s, PopupAction::SetAddressMode(AddressMode::New));
        update(&mut s, PopupAction::SetNewAddress("Shop 9, Hadapsar".to_string()));

        assert!(update(&mut s, PopupAction::Generate).is_empty());
        assert_eq!(s.error.as_deref(), Some("Enter a valid 6-digit postal code"));
        assert!(update(&mut s, PopupAction::SaveAddress).is_empty());
        assert_eq!(s.phase, Phase::Ready);

        update(&mut s, PopupAction::SetNewPostalCode("411028".to_string()));
        assert_eq!(runs(&update(&mut s, PopupAction::SaveAddress)), 1);
        assert_eq!(s.saving, Some(SaveKind::Address));
    }

    #[test]
    fn test_duplicate_address_not_reposted() {
        let mut s = opened(DocumentType::Cp3);
        update(&mut s, PopupAction::SetAddressMode(AddressMode::New));
        update(&mut s, PopupAction::SetNewAddress("Office 2, Camp".to_string()));
        update(&mut s, PopupAction::SetNewPostalCode("411001".to_string()));
        assert!(update(&mut s, PopupAction::SaveAddress).is_empty());
        assert_eq!(s.status.as_deref(), Some("Address already saved"));
        assert!(s.saving.is_none());
    }

    #[test]
    fn test_delete_unknown_address_rejected_locally() {
        let mut s = opened(DocumentType::Cp3);
        assert!(update(&mut s, PopupAction::DeleteAddress("zz".to_string())).is_empty());
        assert_eq!(s.error.as_deref(), Some("Address not found"));
        assert!(s.saving.is_none());
    }

    #[test]
    fn test_delete_selected_address_resets_mode() {
        let mut s = opened(DocumentType::Cp3);
        update(
            &mut s,
            PopupAction::SetAddressMode(AddressMode::Saved("a1".to_string())),
        );
        assert_eq!(runs(&update(&mut s, PopupAction::DeleteAddress("a1".to_string()))), 1);

        let epoch = s.epoch;
        let effects = update(
            &mut s,
            PopupAction::SaveFinished {
                epoch,
                kind: SaveKind::DeleteAddress,
                result: Ok(()),
            },
        );
        assert!(matches!(
            effects[..],
            [PopupEffect::Run(Task::LoadSavedAddresses { .. })]
        ));
        update(
            &mut s,
            PopupAction::SavedAddressesLoaded {
                epoch,
                result: Ok(vec![]),
            },
        );
        assert_eq!(s.address_mode, AddressMode::Existing);
    }

    #[test]
    fn test_save_name_clears_input_and_refreshes() {
        let mut s = opened(DocumentType::Cp26);
        update(&mut s, PopupAction::SetNameInput("  A. Rao ".to_string()));
        let effects = update(&mut s, PopupAction::SaveName);
        assert!(matches!(
            &effects[..],
            [PopupEffect::Run(Task::SaveEntry { request, kind: SaveKind::Name, .. })]
                if request.employer_name.as_deref() == Some("A. Rao")
        ));

        let epoch = s.epoch;
        let effects = update(
            &mut s,
            PopupAction::SaveFinished {
                epoch,
                kind: SaveKind::Name,
                result: Ok(()),
            },
        );
        assert!(s.name_input.is_empty());
        assert!(effects
            .iter()
            .any(|e| matches!(e, PopupEffect::Run(Task::LoadSavedNames { .. }))));
    }

    #[test]
    fn test_save_existing_name_skips_network() {
        let mut s = opened(DocumentType::Cp26);
        update(&mut s, PopupAction::SetNameInput("R. Shah".to_string()));
        let effects = update(&mut s, PopupAction::SaveName);
        assert_eq!(runs(&effects), 0);
        assert!(s.name_input.is_empty());
    }

    #[test]
    fn test_close_ignored_while_in_flight() {
        let mut s = opened(DocumentType::Cp26);
        update(&mut s, PopupAction::SetNameInput("A. Rao".to_string()));
        update(&mut s, PopupAction::SaveName);
        assert!(!s.can_cancel());
        assert!(update(&mut s, PopupAction::Close).is_empty());
        assert!(s.is_open());
    }

    #[test]
    fn test_generate_failure_keeps_popup_open() {
        let mut s = opened(DocumentType::IncomeTaxLetter);
        update(&mut s, PopupAction::SetPan("abcde1234f".to_string()));
        assert_eq!(s.fields.pan, "ABCDE1234F");
        assert_eq!(runs(&update(&mut s, PopupAction::Generate)), 1);
        assert_eq!(s.phase, Phase::Submitting);
        assert!(!s.can_generate());

        // A second click while submitting does nothing.
        assert!(update(&mut s, PopupAction::Generate).is_empty());

        let epoch = s.epoch;
        update(
            &mut s,
            PopupAction::GenerateFinished {
                epoch,
                result: Err("Template missing".to_string()),
            },
        );
        assert_eq!(s.phase, Phase::Ready);
        assert_eq!(s.error.as_deref(), Some("Template missing"));
        assert!(s.can_generate());
    }

    #[test]
    fn test_generate_success_notifies_and_closes() {
        let mut s = opened(DocumentType::IncomeTaxLetter);
        update(&mut s, PopupAction::SetPan("ABCDE1234F".to_string()));
        update(&mut s, PopupAction::Generate);
        let epoch = s.epoch;
        let effects = update(
            &mut s,
            PopupAction::GenerateFinished {
                epoch,
                result: Ok(()),
            },
        );
        assert_eq!(
            effects,
            vec![
                PopupEffect::CancelRemark,
                PopupEffect::NotifyRefresh,
                PopupEffect::NotifySuccess("Income Tax Letter generated successfully".to_string()),
                PopupEffect::NotifyClose,
            ]
        );
        assert_eq!(s.phase, Phase::Closed);
    }

    #[test]
    fn test_cp3_request_keeps_complete_accounts_only() {
        let mut s = opened(DocumentType::Cp3);
        update(
            &mut s,
            PopupAction::UpdateBankAccount(
                0,
                BankAccount {
                    bank_name: " SBI ".to_string(),
                    account_no: "0011".to_string(),
                },
            ),
        );
        update(&mut s, PopupAction::AddBankAccount);
        let effects = update(&mut s, PopupAction::Generate);
        let Some(PopupEffect::Run(Task::Generate { job, .. })) = effects.first() else {
            panic!("expected a generate task");
        };
        assert_eq!(job.request.bank_accounts.len(), 1);
        assert_eq!(job.request.bank_accounts[0].bank_name, "SBI");
        assert_eq!(job.request.address, "Plot 4, MIDC, Pune");
        assert_eq!(job.request.enforcement_officer.as_deref(), Some("S. Kale"));
        assert_eq!(job.suggested_remark, "01-03-2024 - CP-3 issued");
    }

    #[test]
    fn test_save_cp1_date_updates_case() {
        let mut s = opened(DocumentType::Cp25);
        assert!(update(&mut s, PopupAction::SaveCp1Date).is_empty());
        assert_eq!(s.error.as_deref(), Some("Enter the CP-1 date"));

        update(&mut s, PopupAction::SetCp1Date(Some(ymd(2023, 11, 20))));
        let effects = update(&mut s, PopupAction::SaveCp1Date);
        let Some(PopupEffect::Run(Task::UpdateCase { case_id, request, .. })) = effects.first()
        else {
            panic!("expected a case update");
        };
        assert_eq!(case_id, "case-1");
        assert_eq!(request.field_updates["cp1Date"], "2023-11-20");

        let epoch = s.epoch;
        update(
            &mut s,
            PopupAction::SaveFinished {
                epoch,
                kind: SaveKind::CaseDate,
                result: Ok(()),
            },
        );
        assert_eq!(
            s.case.as_ref().and_then(|c| c.cp1_date.clone()).as_deref(),
            Some("2023-11-20")
        );
    }

    #[test]
    fn test_draft_letter_body_fills_field() {
        let mut s = opened(DocumentType::EstaLetter);
        assert!(update(&mut s, PopupAction::DraftLetterBody).is_empty());

        update(&mut s, PopupAction::SetSubject("Pending dues".to_string()));
        let effects = update(&mut s, PopupAction::DraftLetterBody);
        assert!(matches!(
            &effects[..],
            [PopupEffect::Run(Task::DraftLetterBody { prompt, .. })]
                if prompt.contains("ACME Forgings") && prompt.contains("Pending dues")
        ));

        let epoch = s.epoch;
        update(
            &mut s,
            PopupAction::LetterBodyDrafted {
                epoch,
                result: Ok("Dear Sir,".to_string()),
            },
        );
        assert_eq!(s.fields.letter_body, "Dear Sir,");
        assert!(s.saving.is_none());
    }

    /// Actions that fill every required field for `doc`, starting from `opened`.
    fn fill_required(doc: DocumentType) -> Vec<PopupAction> {
        match doc {
            DocumentType::Cp3 => vec![PopupAction::UpdateBankAccount(
                0,
                BankAccount {
                    bank_name: "SBI".to_string(),
                    account_no: "0011".to_string(),
                },
            )],
            DocumentType::Cp25 => vec![
                PopupAction::SetHearingDate(Some(ymd(2024, 4, 2))),
                PopupAction::SetCp1Date(Some(ymd(2023, 11, 20))),
            ],
            DocumentType::Cp26 => vec![
                PopupAction::SetShowCauseRef("CP-25/7".to_string()),
                PopupAction::ToggleName("R. Shah".to_string()),
            ],
            DocumentType::EstaLetter => vec![
                PopupAction::SetSubject("Arrears".to_string()),
                PopupAction::SetLetterBody("Please pay.".to_string()),
            ],
            DocumentType::IncomeTaxLetter => vec![PopupAction::SetPan("ABCDE1234F".to_string())],
        }
    }

    /// One action per required field that empties it again.
    fn clear_required(doc: DocumentType) -> Vec<PopupAction> {
        let mut out = vec![
            PopupAction::SetNoticeDate(None),
            // New mode with nothing typed leaves no address.
            PopupAction::SetAddressMode(AddressMode::New),
        ];
        out.extend(match doc {
            DocumentType::Cp3 => vec![PopupAction::RemoveBankAccount(0)],
            DocumentType::Cp25 => vec![
                PopupAction::SetHearingDate(None),
                PopupAction::SetCp1Date(None),
            ],
            DocumentType::Cp26 => vec![
                PopupAction::SetShowCauseRef("  ".to_string()),
                PopupAction::ToggleName("R. Shah".to_string()),
            ],
            DocumentType::EstaLetter => vec![
                PopupAction::SetSubject(String::new()),
                PopupAction::SetLetterBody(" ".to_string()),
            ],
            DocumentType::IncomeTaxLetter => vec![PopupAction::SetPan(String::new())],
        });
        out
    }

    #[test]
    fn test_generate_enabled_only_with_all_required_fields() {
        use strum::IntoEnumIterator;

        for doc in DocumentType::iter() {
            let mut filled = opened(doc);
            assert!(!filled.can_generate(), "{doc:?} starts incomplete");
            for action in fill_required(doc) {
                update(&mut filled, action);
            }
            assert!(filled.can_generate(), "{doc:?} filled: {:?}", validate(&filled));

            for action in clear_required(doc) {
                let mut s = filled.clone();
                let label = format!("{doc:?} after {action:?}");
                update(&mut s, action);
                assert!(!s.can_generate(), "{label}");
                assert_eq!(runs(&update(&mut s, PopupAction::Generate)), 0, "{label}");
                assert!(s.error.is_some(), "{label}");
                assert_eq!(s.phase, Phase::Ready, "{label}");
            }
        }
    }
}
