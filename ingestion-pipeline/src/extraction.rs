use std::path::Path;

use bytes::Bytes;
use lopdf::Document;
use tokio::task;

use common::error::AppError;

/// Separator placed between the texts of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n";

/// Extract the full text of an uploaded document.
///
/// PDFs are read page by page in original order and joined with
/// [`PAGE_SEPARATOR`]; anything else is treated as plain UTF-8 text with a
/// single section. Unreadable input and input that yields no text at all
/// fail with an extraction error.
pub async fn extract_text(bytes: Bytes, filename: &str) -> Result<String, AppError> {
    let text = if is_pdf(filename) {
        extract_pdf_pages(bytes, filename).await?
    } else {
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            AppError::Extraction(format!("document '{filename}' is not valid UTF-8 text"))
        })?
    };

    if text.trim().is_empty() {
        return Err(AppError::Extraction(format!(
            "document '{filename}' produced no text"
        )));
    }

    Ok(text)
}

fn is_pdf(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Parsing happens off the async executor; lopdf is CPU-bound.
async fn extract_pdf_pages(bytes: Bytes, filename: &str) -> Result<String, AppError> {
    let filename = filename.to_owned();

    task::spawn_blocking(move || -> Result<String, AppError> {
        let document = Document::load_mem(&bytes).map_err(|err| {
            AppError::Extraction(format!("failed to parse PDF '{filename}': {err}"))
        })?;

        let mut page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        page_numbers.sort_unstable();

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page in page_numbers {
            let text = document.extract_text(&[page]).map_err(|err| {
                AppError::Extraction(format!(
                    "failed to extract text from page {page} of '{filename}': {err}"
                ))
            })?;
            pages.push(text);
        }

        Ok(pages.join(PAGE_SEPARATOR))
    })
    .await?
}
