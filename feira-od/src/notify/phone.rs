//! Phone number normalization

/// Brazilian country calling code.
///
/// The prefixing rule below is a single-country heuristic: 10/11 digits is a
/// national number with area code, anything else is assumed to already be in
/// the caller's intended form. It does not generalize to other locales.
pub const COUNTRY_CODE: &str = "55";

/// Normalize a phone string for the WhatsApp gateway.
///
/// Keeps only ASCII digits; prepends the country code when the number looks
/// like a national number (10 or 11 digits) that doesn't already carry it.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if !digits.starts_with(COUNTRY_CODE) && (digits.len() == 10 || digits.len() == 11) {
        format!("{}{}", COUNTRY_CODE, digits)
    } else {
        digits
    }
}
