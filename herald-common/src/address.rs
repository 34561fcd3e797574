//! Syntactic email address validation.
//!
//! Validation is deliberately shallow: `local@domain.tld`, ASCII only,
//! no whitespace, exactly one `@`, at least one `.` in the domain with
//! non-empty labels on either side of the last dot. Deliverability is
//! the mail server's problem, not ours.

use thiserror::Error;

/// Errors produced when an address, or a list of addresses, fails the
/// syntactic check.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The address list was missing or empty.
    #[error("Invalid email list")]
    EmptyList,

    /// An address did not match the `local@domain.tld` pattern.
    #[error("Invalid email address format: {0}")]
    Malformed(String),
}

/// Returns `true` if `address` matches the accepted syntactic pattern.
#[must_use]
pub fn is_valid(address: &str) -> bool {
    if !address.is_ascii() || address.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    // The domain needs at least one dot with something on both sides.
    domain
        .rsplit_once('.')
        .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
}

/// Validate a single address.
///
/// # Errors
///
/// Returns [`AddressError::Malformed`] naming the offending address.
pub fn validate(address: &str) -> Result<(), AddressError> {
    if is_valid(address) {
        Ok(())
    } else {
        Err(AddressError::Malformed(address.to_string()))
    }
}

/// Validate a list of addresses.
///
/// # Errors
///
/// Returns [`AddressError::EmptyList`] for an empty list, or
/// [`AddressError::Malformed`] for the first entry that fails the
/// pattern, regardless of its position.
pub fn validate_list(addresses: &[String]) -> Result<(), AddressError> {
    if addresses.is_empty() {
        return Err(AddressError::EmptyList);
    }

    for address in addresses {
        validate(address)?;
    }

    Ok(())
}
