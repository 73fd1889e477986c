use super::backend::NoticeBackend;
use super::dialogs::NoticeDialogs;
use super::download::FileSaver;
use super::state::{GenerateJob, PopupAction, SaveKind, Task};
use leptos::logging::{error, log};

const REMARK_CONFIRM: &str = "Add a remark for this notice to the case history?";
const REMARK_PROMPT: &str = "Remark";

/// Executes one backend task and reports back as an action for the reducer.
pub(crate) async fn run_task<B, D, F>(backend: &B, dialogs: &D, saver: &F, task: Task) -> PopupAction
where
    B: NoticeBackend,
    D: NoticeDialogs,
    F: FileSaver,
{
    match task {
        Task::LoadSavedAddresses {
            epoch,
            identity,
            establishment_code,
        } => PopupAction::SavedAddressesLoaded {
            epoch,
            result: backend
                .saved_addresses(&identity, &establishment_code)
                .await
                .map_err(|e| e.user_message("Request failed")),
        },
        Task::LoadSavedNames {
            epoch,
            identity,
            establishment_code,
        } => PopupAction::SavedNamesLoaded {
            epoch,
            result: backend
                .saved_names(&identity, &establishment_code)
                .await
                .map_err(|e| e.user_message("Request failed")),
        },
        Task::LookupOfficer {
            epoch,
            identity,
            postal_code,
        } => {
            let result = backend
                .lookup_officer(&identity, &postal_code)
                .await
                .map_err(|e| e.to_string());
            PopupAction::OfficerLoaded {
                epoch,
                postal_code,
                result,
            }
        }
        Task::SaveEntry {
            epoch,
            kind,
            request,
        } => {
            let fallback = match kind {
                SaveKind::Name => "Failed to save name",
                _ => "Failed to save address",
            };
            PopupAction::SaveFinished {
                epoch,
                kind,
                result: backend
                    .save_entry(&request)
                    .await
                    .map_err(|e| e.user_message(fallback)),
            }
        }
        Task::DeleteAddress {
            epoch,
            identity,
            id,
        } => PopupAction::SaveFinished {
            epoch,
            kind: SaveKind::DeleteAddress,
            result: backend
                .delete_address(&identity, &id)
                .await
                .map_err(|e| e.user_message("Failed to delete address")),
        },
        Task::UpdateCase {
            epoch,
            case_id,
            request,
        } => PopupAction::SaveFinished {
            epoch,
            kind: SaveKind::CaseDate,
            result: backend
                .update_case(&case_id, &request)
                .await
                .map_err(|e| e.user_message("Failed to save CP-1 date")),
        },
        Task::DraftLetterBody { epoch, prompt } => PopupAction::LetterBodyDrafted {
            epoch,
            result: backend
                .draft_letter_body(&prompt)
                .await
                .map_err(|e| e.user_message("Failed to draft letter")),
        },
        Task::Generate { epoch, job } => PopupAction::GenerateFinished {
            epoch,
            result: generate(backend, dialogs, saver, job).await,
        },
    }
}

async fn generate<B, D, F>(backend: &B, dialogs: &D, saver: &F, job: GenerateJob) -> Result<(), String>
where
    B: NoticeBackend,
    D: NoticeDialogs,
    F: FileSaver,
{
    let GenerateJob {
        doc,
        mut request,
        suggested_remark,
    } = job;

    if dialogs.confirm(REMARK_CONFIRM) {
        request.remark = dialogs
            .prompt(REMARK_PROMPT, &suggested_remark)
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
    }

    let document = backend
        .generate(doc.slug(), &request)
        .await
        .map_err(|e| {
            error!("[notice] {} failed: {e}", doc.slug());
            e.user_message(&doc.failure_message())
        })?;

    let filename = document
        .filename
        .unwrap_or_else(|| doc.default_filename().to_string());
    saver.save(&filename, &document.bytes)?;
    log!("[notice] saved {filename} ({} bytes)", document.bytes.len());
    Ok(())
}
