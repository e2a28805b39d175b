//! Shared validation rules for identifier newtypes.

/// Validates an identifier string.
///
/// - Non-empty
/// - No path separators (`/`, `\`)
/// - Not `.` or `..`
/// - Characters are alphanumeric, `-`, `_`, or (optionally) `.`
pub fn validate_identifier(id: &str, allow_dots: bool) -> bool {
    if id.is_empty() {
        return false;
    }
    if id.contains('/') || id.contains('\\') {
        return false;
    }
    if id == "." || id == ".." {
        return false;
    }
    id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_' || (allow_dots && c == '.'))
}

/// Validates a vault-relative path for safe filesystem operations.
///
/// Rejects absolute paths, `..` segments, and `**` globs, per the pattern
/// resolver's failure modes.
pub fn validate_safe_relative_path(path: &str) -> bool {
    if path.is_empty() || path.contains('\0') {
        return false;
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return false;
    }
    if path.contains("..") || path.contains("**") {
        return false;
    }
    true
}

/// Validates a single path component (no separators at all).
pub fn validate_safe_path_component(component: &str) -> bool {
    if component.is_empty() || component.starts_with('.') {
        return false;
    }
    if component.contains('/') || component.contains('\\') || component.contains('\0') {
        return false;
    }
    if component == "." || component == ".." {
        return false;
    }
    true
}

/// Generates a validated newtype wrapping a `String`, with `new`, `as_str`,
/// `Deref<Target = str>`, `AsRef<str>` and `Display` impls.
#[macro_export]
macro_rules! impl_validated_id {
    ($name:ident, $allow_dots:expr, $err_variant:path) => {
        impl $name {
            /// Validate and create a new instance.
            pub fn new(id: impl Into<String>) -> Result<Self, $crate::domain::error::AppError> {
                let id = id.into();
                if $crate::domain::identifiers::validation::validate_identifier(&id, $allow_dots) {
                    Ok(Self(id))
                } else {
                    Err($err_variant(id))
                }
            }

            /// Return the inner string value.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
