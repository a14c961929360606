use crate::error::AppError;

const MAX_USERNAME_LEN: usize = 64;
const MAX_FILENAME_LEN: usize = 255;

/// Usernames become part of collection names and storage prefixes, so the
/// accepted charset is what keeps tenants injective there.
pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.is_empty() || username.len() > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "username must be between 1 and {MAX_USERNAME_LEN} characters"
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "username may only contain ASCII letters, digits and underscores".into(),
        ));
    }

    Ok(())
}

pub fn validate_filename(filename: &str) -> Result<(), AppError> {
    if filename.is_empty() || filename.len() > MAX_FILENAME_LEN {
        return Err(AppError::Validation(format!(
            "filename must be between 1 and {MAX_FILENAME_LEN} characters"
        )));
    }

    if filename == "." || filename == ".." {
        return Err(AppError::Validation("filename is reserved".into()));
    }

    if filename
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(AppError::Validation(
            "filename may not contain path separators or control characters".into(),
        ));
    }

    Ok(())
}
