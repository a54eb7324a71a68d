//! Common utility functions shared across the codebase.

/// Checks whether an identifier is written in lower-camelCase: starts with a
/// lowercase ASCII letter or underscore, contains no `-` or whitespace, and
/// never transitions into two consecutive uppercase letters (which usually
/// signals an acronym slipping in, e.g. `myS3Bucket` is fine, `MYBucket` is
/// not).
///
/// # Examples
///
/// ```
/// use chant_core::utils::is_lower_camel_case;
///
/// assert!(is_lower_camel_case("dataBucket"));
/// assert!(is_lower_camel_case("bucket"));
/// assert!(is_lower_camel_case("myS3Bucket"));
/// assert!(!is_lower_camel_case("DataBucket"));
/// assert!(!is_lower_camel_case("data_bucket"));
/// assert!(!is_lower_camel_case(""));
/// ```
pub fn is_lower_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return false;
    }
    if name.contains(['-', ' ', '.']) {
        return false;
    }
    name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Derives the conventional auto output name `{entity}_{attribute}` used by
/// cross-lexicon auto-detection when no explicit name is given.
pub fn auto_output_name(entity_name: &str, attribute: &str) -> String {
    format!("{entity_name}_{attribute}")
}

#[cfg(test)]
mod tests {
    use crate::utils::*;

    #[test]
    fn test_is_lower_camel_case() {
        assert!(is_lower_camel_case("dataBucket"));
        assert!(is_lower_camel_case("bucket"));
        assert!(is_lower_camel_case("_private"));
        assert!(is_lower_camel_case("myS3Bucket"));

        assert!(!is_lower_camel_case("DataBucket"));
        assert!(!is_lower_camel_case("data_bucket"));
        assert!(!is_lower_camel_case("data-bucket"));
        assert!(!is_lower_camel_case(""));
        assert!(!is_lower_camel_case("123bucket"));
    }

    #[test]
    fn test_auto_output_name() {
        assert_eq!(auto_output_name("dataBucket", "Endpoint"), "dataBucket_Endpoint");
    }
}
