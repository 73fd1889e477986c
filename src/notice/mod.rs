//! Notice generation: document types, the popup reducer and the browser glue
//! that runs its effects.

mod address;
mod backend;
mod debounce;
mod dialogs;
mod download;
mod kind;
mod popup;
mod remark;
mod runner;
mod state;
mod validate;

pub(crate) use download::filename_from_content_disposition;
pub(crate) use kind::DocumentType;
pub(crate) use popup::NoticePopup;
