//! Syntactic e-mail address check used to keep only credential-shaped lines

use regex::Regex;
use std::sync::LazyLock;

/// RFC 5322 dot-atom local part, dotted hostname with at least two labels
const ADDRESS_PATTERN: &str = r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$";

const MAX_LOCAL_LEN: usize = 64;
const MAX_ADDRESS_LEN: usize = 254;

static ADDRESS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ADDRESS_PATTERN).expect("Invalid address regex"));

/// Check whether `candidate` looks like `local-part@domain`.
///
/// Quoted local parts, IP-literal domains and single-label hosts are rejected.
pub fn is_valid_address(candidate: &str) -> bool {
    if candidate.len() > MAX_ADDRESS_LEN {
        return false;
    }
    match candidate.rfind('@') {
        Some(at) if at <= MAX_LOCAL_LEN => ADDRESS_REGEX.is_match(candidate),
        _ => false,
    }
}
