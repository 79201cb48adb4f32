use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating phone numbers
    /// Optional leading "+", optional country digit "1", then 9 to 15 digits
    /// - Valid: "+999999999", "0812345678901", "+14155552671"
    /// - Invalid: "12345", "+62 812 3456", "phone"
    pub static ref PHONE_REGEX: Regex = Regex::new(r"^\+?1?\d{9,15}$").unwrap();

    /// Regex for validating username fields
    /// Letters, digits and @ . + - _ (the usual account-name alphabet)
    /// - Valid: "john_doe", "user123", "ada.lovelace", "me+files"
    /// - Invalid: "user name", "user/name", ""
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_regex() {
        assert!(PHONE_REGEX.is_match("+999999999"));
        assert!(PHONE_REGEX.is_match("0812345678901"));
        assert!(PHONE_REGEX.is_match("+14155552671"));
        assert!(!PHONE_REGEX.is_match("12345")); // too short
        assert!(!PHONE_REGEX.is_match("+62 812 3456")); // spaces
        assert!(!PHONE_REGEX.is_match("1234567890123456789")); // too long
    }

    #[test]
    fn test_username_regex() {
        assert!(USERNAME_REGEX.is_match("john_doe"));
        assert!(USERNAME_REGEX.is_match("ada.lovelace"));
        assert!(USERNAME_REGEX.is_match("me+files"));
        assert!(!USERNAME_REGEX.is_match("user name"));
        assert!(!USERNAME_REGEX.is_match("user/name"));
        assert!(!USERNAME_REGEX.is_match(""));
    }
}
