//! Name validation
//!
//! Namespace names must be valid DNS-1123 labels: lowercase alphanumerics
//! and `-`, starting and ending with an alphanumeric, at most 63 characters.

const DNS1123_LABEL_MAX_LENGTH: usize = 63;

/// Validate a namespace name, returning the failures (empty when valid)
pub fn validate_namespace_name(name: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if name.is_empty() {
        errs.push("must be non-empty".to_string());
        return errs;
    }
    if name.len() > DNS1123_LABEL_MAX_LENGTH {
        errs.push(format!(
            "must be no more than {} characters",
            DNS1123_LABEL_MAX_LENGTH
        ));
    }
    let valid_chars = name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    let valid_edges = !name.starts_with('-') && !name.ends_with('-');
    if !valid_chars || !valid_edges {
        errs.push(
            "a DNS-1123 label must consist of lower case alphanumeric characters or '-', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    errs
}
