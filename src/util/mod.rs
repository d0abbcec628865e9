//! Utility modules

pub mod constants;

pub use constants::*;

use std::borrow::Cow;

/// Trim an HTTP error body to [`ERROR_BODY_LIMIT`] characters for messages
pub fn truncate_body(body: &str) -> Cow<'_, str> {
    let body = body.trim();
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => Cow::Owned(format!("{}…", &body[..cut])),
        None => Cow::Borrowed(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_short_is_borrowed() {
        assert!(matches!(truncate_body(" ok \n"), Cow::Borrowed("ok")));
    }

    #[test]
    fn test_truncate_body_long_is_cut_on_char_boundary() {
        let body = "é".repeat(ERROR_BODY_LIMIT + 10);
        let cut = truncate_body(&body);
        assert_eq!(cut.chars().count(), ERROR_BODY_LIMIT + 1);
        assert!(cut.ends_with('…'));
    }
}
