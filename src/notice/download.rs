use wasm_bindgen::JsCast;

/// Hands a generated document to the user.
pub(crate) trait FileSaver {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<(), String>;
}

/// Saves through a temporary object URL and a synthetic `<a download>` click.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserFileSaver;

impl FileSaver for BrowserFileSaver {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<(), String> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;

        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
        let opts = web_sys::BlobPropertyBag::new();
        opts.set_type(mime_for(filename));
        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &opts)
            .map_err(|_| "Could not prepare the download".to_string())?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)
            .map_err(|_| "Could not prepare the download".to_string())?;

        let anchor = document
            .create_element("a")
            .ok()
            .and_then(|el| el.dyn_into::<web_sys::HtmlAnchorElement>().ok())
            .ok_or("Could not start the download")?;
        anchor.set_href(&url);
        anchor.set_download(filename);

        // Firefox ignores clicks on detached anchors.
        let body = document.body();
        if let Some(body) = &body {
            let _ = body.append_child(&anchor);
        }
        anchor.click();
        if let Some(body) = &body {
            let _ = body.remove_child(&anchor);
        }

        let _ = web_sys::Url::revoke_object_url(&url);
        Ok(())
    }
}

fn mime_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Filename suggested by a `Content-Disposition` header.
///
/// Prefers the RFC 5987 `filename*=UTF-8''…` form over plain `filename=`.
/// Directory components are stripped; an empty result is `None`.
pub(crate) fn filename_from_content_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in header.split(';') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = match value.split_once("''") {
                    Some((_charset, rest)) => rest,
                    None => value,
                };
                extended = urlencoding::decode(encoded.trim_matches('"'))
                    .ok()
                    .map(|s| s.into_owned());
            }
            "filename" => plain = Some(value.trim_matches('"').to_string()),
            _ => {}
        }
    }

    extended
        .or(plain)
        .map(|name| {
            name.rsplit(['/', '\\'])
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty())
}
