//! Input validation shared by add and update
//!
//! All three fields are trimmed first. The first failing field is reported
//! and nothing is written.

use central_api::requests::InstanceInput;

use crate::error::{CoreError, Field};
use crate::state::InstanceStatus;

/// Fields that passed validation and may be written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    pub name: String,
    pub status: InstanceStatus,
    pub address: String,
}

/// Validate a raw instance draft
///
/// # Errors
/// Returns `CoreError::Validation` naming the first invalid field
pub fn validate(input: &InstanceInput) -> Result<ValidatedInput, CoreError> {
    Ok(ValidatedInput {
        name: validate_name(&input.name)?,
        status: input.status.trim().parse()?,
        address: validate_address(&input.address)?,
    })
}

/// Name must be non-empty after trimming
///
/// # Errors
/// Returns `CoreError::Validation` on the name field
pub fn validate_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation(Field::Name, "name must not be empty"));
    }
    Ok(name.to_string())
}

/// Address must be a dotted-quad IPv4 literal
///
/// # Errors
/// Returns `CoreError::Validation` on the address field
pub fn validate_address(address: &str) -> Result<String, CoreError> {
    let address = address.trim();
    if is_ipv4(address) {
        Ok(address.to_string())
    } else {
        Err(CoreError::validation(
            Field::Address,
            format!("{address:?} is not a valid IPv4 address (e.g. 10.0.0.12)"),
        ))
    }
}

/// Four dot-separated groups of one to three digits, each at most 255
///
/// Leading zeros are accepted (`010.0.0.1`), anything else around or
/// between the groups is not.
#[must_use]
pub fn is_ipv4(address: &str) -> bool {
    let groups: Vec<&str> = address.split('.').collect();
    groups.len() == 4 && groups.iter().all(|group| is_octet(group))
}

fn is_octet(group: &str) -> bool {
    (1..=3).contains(&group.len())
        && group.bytes().all(|b| b.is_ascii_digit())
        && group.parse::<u16>().is_ok_and(|value| value <= 255)
}
