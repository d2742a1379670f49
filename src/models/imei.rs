use crate::errors::ServiceError;

pub const TAC_LEN: usize = 8;

/// TAC of a device code: its first eight characters when they are all
/// digits. Item codes that are not IMEIs have none.
pub fn tac_of(code: &str) -> Option<String> {
    let code = code.trim();
    let prefix = code.get(..TAC_LEN)?;
    prefix
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then(|| prefix.to_string())
}

/// Like [`tac_of`] but for lookups, where a missing TAC is a caller error.
pub fn require_tac(imei: &str) -> Result<String, ServiceError> {
    tac_of(imei).ok_or_else(|| {
        ServiceError::BadRequest(format!(
            "IMEI must start with at least {TAC_LEN} digits"
        ))
    })
}

/// Trims a device code and rejects blanks.
pub fn normalize_device_code(code: &str) -> Result<String, ServiceError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BadRequest("IMEI must not be empty".into()));
    }
    Ok(trimmed.to_string())
}
