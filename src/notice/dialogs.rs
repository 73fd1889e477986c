/// Blocking yes/no and text questions put to the user during generation.
pub(crate) trait NoticeDialogs {
    fn confirm(&self, message: &str) -> bool;
    /// `None` when the user cancels.
    fn prompt(&self, message: &str, default: &str) -> Option<String>;
}

/// `window.confirm` / `window.prompt`.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserDialogs;

impl NoticeDialogs for BrowserDialogs {
    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }

    fn prompt(&self, message: &str, default: &str) -> Option<String> {
        web_sys::window()
            .and_then(|w| w.prompt_with_message_and_default(message, default).ok())
            .flatten()
    }
}
