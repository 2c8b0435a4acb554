use std::sync::OnceLock;

use regex::Regex;

static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();

/// Canonicalize an address for routing: pull the addr-spec out of
/// `Display Name <local@domain>` forms, trim, and lowercase the domain.
///
/// Routing compares canonical addresses, so two spellings of one mailbox
/// land in the same delivery leg.
pub fn sanitize_address(address: &str) -> String {
    let trimmed = address.trim();

    let spec = match (trimmed.rfind('<'), trimmed.rfind('>')) {
        (Some(start), Some(end)) if start < end => trimmed[start + 1..end].trim(),
        _ => trimmed,
    };

    match spec.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_ascii_lowercase()),
        None => spec.to_string(),
    }
}

/// Loose shape check for an addr-spec. Used when identities are created
/// with an explicit address; routing itself never rejects addresses.
pub fn is_valid_address(address: &str) -> bool {
    let re = ADDRESS_RE
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("address pattern is valid"));
    re.is_match(address)
}
