use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating code fields (curriculum code, etc.)
    /// Must be lowercase alphanumeric with hyphens
    /// - Valid: "kurikulum-merdeka", "k13", "kurikulum-2013-revisi"
    /// - Invalid: "-k13", "k13-", "kurikulum--merdeka", "K13", "kurikulum_merdeka"
    pub static ref CODE_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_regex_valid() {
        assert!(CODE_REGEX.is_match("kurikulum-merdeka"));
        assert!(CODE_REGEX.is_match("k13"));
        assert!(CODE_REGEX.is_match("kurikulum-2013-revisi"));
        assert!(CODE_REGEX.is_match("a"));
        assert!(CODE_REGEX.is_match("a-b-c"));
    }

    #[test]
    fn test_code_regex_invalid() {
        assert!(!CODE_REGEX.is_match("-k13")); // starts with hyphen
        assert!(!CODE_REGEX.is_match("k13-")); // ends with hyphen
        assert!(!CODE_REGEX.is_match("kurikulum--merdeka")); // double hyphen
        assert!(!CODE_REGEX.is_match("K13")); // uppercase
        assert!(!CODE_REGEX.is_match("kurikulum_merdeka")); // underscore
        assert!(!CODE_REGEX.is_match("")); // empty
        assert!(!CODE_REGEX.is_match("kurikulum merdeka")); // space
    }
}
