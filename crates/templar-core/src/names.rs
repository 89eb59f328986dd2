//! Reserved-name rules shared by declaration, binding, and lookup.

use crate::SchemaError;

/// Prefix reserved for internal bookkeeping.
///
/// Parameter names may not start with it, and instantiations refuse to
/// resolve attributes that do.
pub const RESERVED_PREFIX: &str = "_";

/// Check whether a name starts with [`RESERVED_PREFIX`].
#[inline]
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Validate a template parameter name.
pub fn check_param_name(template: &str, name: &str) -> Result<(), SchemaError> {
    if is_reserved(name) {
        return Err(SchemaError::ReservedName {
            template: template.to_string(),
            name: name.to_string(),
            prefix: RESERVED_PREFIX,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names() {
        assert!(is_reserved("_arguments"));
        assert!(is_reserved("_"));
        assert!(!is_reserved("x"));
        assert!(!is_reserved("x_"));
    }

    #[test]
    fn check_param_name_rejects_prefix() {
        assert!(check_param_name("A", "x").is_ok());
        let err = check_param_name("A", "_x").unwrap_err();
        assert_eq!(
            err,
            SchemaError::ReservedName {
                template: "A".into(),
                name: "_x".into(),
                prefix: "_",
            }
        );
    }
}
