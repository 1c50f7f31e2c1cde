use lazy_static::lazy_static;
use regex::Regex;

/// Longest release name accepted. Names end up as label values and as a
/// suffix of generated object names, so they stay well under 63 characters.
pub const MAX_RELEASE_NAME_LEN: usize = 53;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReleaseNameError {
    #[error("release name cannot be empty")]
    Empty,
    #[error("release name exceeds maximum length {max} (got {len})")]
    TooLong { len: usize, max: usize },
    #[error("release name must be lowercase alphanumeric, '-' or '.', and start and end with an alphanumeric character")]
    InvalidChars,
}

lazy_static! {
    static ref RELEASE_NAME: Regex = Regex::new(
        r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$"
    )
    .unwrap();
}

/// Check a release name against the DNS-1123 subdomain convention used by
/// the release store.
pub fn validate_release_name(name: &str) -> Result<(), ReleaseNameError> {
    if name.is_empty() {
        return Err(ReleaseNameError::Empty);
    }
    if name.len() > MAX_RELEASE_NAME_LEN {
        return Err(ReleaseNameError::TooLong {
            len: name.len(),
            max: MAX_RELEASE_NAME_LEN,
        });
    }
    if !RELEASE_NAME.is_match(name) {
        return Err(ReleaseNameError::InvalidChars);
    }
    Ok(())
}
