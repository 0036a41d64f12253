//! Naming utilities for typesync
//!
//! This module provides utilities for naming conventions and transformations.

use inflector::Inflector;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier regex is valid"));

/// Apply a serde `rename_all` convention to a field or variant name
pub fn apply_naming_convention(name: &str, convention: &str) -> String {
    match convention {
        "lowercase" => name.to_lowercase(),
        "UPPERCASE" => name.to_uppercase(),
        "PascalCase" => name.to_pascal_case(),
        "camelCase" => name.to_camel_case(),
        "snake_case" => name.to_snake_case(),
        "SCREAMING_SNAKE_CASE" => name.to_screaming_snake_case(),
        "kebab-case" => name.to_kebab_case(),
        "SCREAMING-KEBAB-CASE" => name.to_kebab_case().to_uppercase(),
        _ => name.to_string(), // Unknown convention: keep as is
    }
}

/// Title-case a name: the first letter of every alphabetic run is
/// upper-cased and the remaining letters lower-cased
///
/// Separators are kept, so `user_status` becomes `User_Status`.
pub fn title_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut previous_is_letter = false;

    for c in name.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }

    result
}

/// Check whether a name can be used as a bare TypeScript identifier
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Format a property key, quoting it when it is not a plain identifier
pub fn format_property_key(name: &str) -> String {
    if is_valid_identifier(name) {
        name.to_string()
    } else {
        serde_json::Value::String(name.to_string()).to_string()
    }
}

/// Collect names that occur more than once, in order of first repetition
pub fn find_duplicate_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashMap::<&str, usize>::new();
    let mut duplicates = Vec::new();

    for name in names {
        let count = seen.entry(name).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(name.to_string());
        }
    }

    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_conventions() {
        assert_eq!(apply_naming_convention("created_at", "camelCase"), "createdAt");
        assert_eq!(apply_naming_convention("created_at", "PascalCase"), "CreatedAt");
        assert_eq!(apply_naming_convention("InProgress", "snake_case"), "in_progress");
        assert_eq!(apply_naming_convention("InProgress", "SCREAMING_SNAKE_CASE"), "IN_PROGRESS");
        assert_eq!(apply_naming_convention("InProgress", "kebab-case"), "in-progress");
        assert_eq!(apply_naming_convention("InProgress", "SCREAMING-KEBAB-CASE"), "IN-PROGRESS");
        assert_eq!(apply_naming_convention("Active", "lowercase"), "active");
        assert_eq!(apply_naming_convention("Active", "UPPERCASE"), "ACTIVE");
        assert_eq!(apply_naming_convention("Active", "unknown"), "Active");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("state"), "State");
        assert_eq!(title_case("user_status"), "User_Status");
        assert_eq!(title_case("userId"), "Userid");
        assert_eq!(title_case("v2type"), "V2Type");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_property_keys() {
        assert_eq!(format_property_key("name"), "name");
        assert_eq!(format_property_key("$ref"), "$ref");
        assert_eq!(format_property_key("content-type"), "\"content-type\"");
        assert_eq!(format_property_key("2fa"), "\"2fa\"");
    }

    #[test]
    fn test_duplicate_names() {
        let names = ["AEnum", "BEnum", "AEnum", "AEnum", "CEnum", "BEnum"];
        assert_eq!(find_duplicate_names(names), vec!["AEnum".to_string(), "BEnum".to_string()]);
        assert!(find_duplicate_names(["One", "Two"]).is_empty());
    }
}
