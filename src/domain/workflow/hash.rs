//! Canonicalization + hashing of workflow file content for `source_hash`.

use sha2::{Digest, Sha256};

/// Normalize line endings to LF and trim trailing whitespace on every line,
/// then hash with SHA-256. Output is stable under whitespace variation
/// within lines (`spec.md` §4.3).
pub fn source_hash(content: &str) -> String {
    let canonical = canonicalize(content);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn canonicalize(content: &str) -> String {
    content
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_under_trailing_whitespace_and_crlf() {
        let a = source_hash("## Step\nbody text\n");
        let b = source_hash("## Step   \r\nbody text  \r\n");
        assert_eq!(a, b);
    }

    #[test]
    fn differs_for_different_content() {
        assert_ne!(source_hash("a"), source_hash("b"));
    }

    proptest::proptest! {
        #[test]
        fn canonicalize_is_idempotent(content in ".*") {
            let once = canonicalize(&content);
            let twice = canonicalize(&once);
            proptest::prop_assert_eq!(once, twice);
        }

        #[test]
        fn crlf_and_lf_variants_hash_identically(lines in proptest::collection::vec("[a-zA-Z0-9 ]{0,20}", 0..8)) {
            let lf = lines.join("\n");
            let crlf = lines.join("\r\n");
            proptest::prop_assert_eq!(source_hash(&lf), source_hash(&crlf));
        }
    }
}
