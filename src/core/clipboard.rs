use arboard::Clipboard;

use super::error::AppError;

/// One best-effort write of the generated text to the system clipboard.
pub fn copy_text(text: &str) -> Result<(), AppError> {
    let mut clipboard =
        Clipboard::new().map_err(|e| AppError::clipboard(format!("clipboard init: {e}")))?;
    clipboard
        .set_text(text)
        .map_err(|e| AppError::clipboard(format!("clipboard write: {e}")))?;
    Ok(())
}
