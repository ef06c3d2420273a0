//! JAN code helpers.
//!
//! JAN codes are the Japanese flavour of EAN: 13 digits (JAN-13 / EAN-13)
//! or 8 digits (JAN-8 / EAN-8), the last digit being a mod-10 check digit.
//!
//! # Check digit
//!
//! Walking the payload digits right to left, weights alternate 3, 1, 3, 1...
//! The check digit is `(10 - sum % 10) % 10`.

/// Strip whitespace and the quote characters that spreadsheet exports
/// wrap codes in (`'4901234567894'`).
pub fn clean(code: &str) -> String {
    code.trim()
        .trim_matches(|c: char| c == '\'' || c == '"' || c.is_whitespace())
        .to_string()
}

/// Compute the check digit for a payload of ASCII digits.
///
/// Returns `None` if the payload contains a non-digit.
pub fn check_digit(payload: &str) -> Option<u8> {
    let mut sum: u32 = 0;
    for (i, b) in payload.bytes().rev().enumerate() {
        if !b.is_ascii_digit() {
            return None;
        }
        let digit = (b - b'0') as u32;
        sum += if i % 2 == 0 { digit * 3 } else { digit };
    }
    Some(((10 - sum % 10) % 10) as u8)
}

/// Whether `code` is a well-formed JAN-13 or JAN-8 with a correct check digit.
pub fn is_valid(code: &str) -> bool {
    if !matches!(code.len(), 8 | 13) || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let (payload, check) = code.split_at(code.len() - 1);
    check_digit(payload) == Some(check.as_bytes()[0] - b'0')
}
