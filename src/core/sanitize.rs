//! Purpose: Filesystem-safe token sanitization and artifact path assembly.
//! Exports: `sanitize`, `build_artifact_path`.
//! Role: Keep export and cross-reference naming semantics aligned from one source.
//! Invariants: `sanitize` output is ASCII-only with no underscore runs and no
//! leading/trailing underscores.
//! Invariants: Artifact file names never contain two consecutive underscores.

use std::path::{Path, PathBuf};

/// Convert an arbitrary string into a filesystem-safe token.
///
/// Non-ASCII characters are replaced with an ASCII placeholder first, then
/// punctuation and whitespace map to underscores, runs collapse, and the
/// ends are trimmed. Pure and total; idempotent.
pub fn sanitize(input: &str) -> String {
    let mut mapped = String::with_capacity(input.len());
    for ch in input.chars() {
        let ch = if ch.is_ascii() { ch } else { '?' };
        if ch.is_ascii_punctuation() || ch.is_ascii_whitespace() {
            mapped.push('_');
        } else {
            mapped.push(ch);
        }
    }
    collapse_underscores(mapped.trim_matches('_'))
}

fn collapse_underscores(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for ch in input.chars() {
        if ch == '_' {
            if prev_underscore {
                continue;
            }
            prev_underscore = true;
        } else {
            prev_underscore = false;
        }
        out.push(ch);
    }
    out
}

/// Compose the deterministic artifact path for one exported record.
///
/// The collapse pass runs once more across the assembled file name, so an
/// underscore run can never span a token join. The directory is joined
/// verbatim and is not checked for existence or writability.
pub fn build_artifact_path(dir: &Path, version: &str, role: &str, id: i32) -> PathBuf {
    let file_name = format!("{}-{}-{}.json", sanitize(version), sanitize(role), id);
    dir.join(collapse_underscores(&file_name))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{build_artifact_path, sanitize};

    #[test]
    fn punctuation_and_whitespace_collapse_to_single_underscores() {
        assert_eq!(sanitize("v1.2!!"), "v1_2");
        assert_eq!(sanitize("QA Lead"), "QA_Lead");
        assert_eq!(sanitize("a -- b\t\tc"), "a_b_c");
    }

    #[test]
    fn leading_and_trailing_junk_is_stripped() {
        assert_eq!(sanitize("  ..hello..  "), "hello");
        assert_eq!(sanitize("___"), "");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn non_ascii_is_replaced_before_substitution() {
        assert_eq!(sanitize("café au lait"), "caf_au_lait");
        assert_eq!(sanitize("Grüße"), "Gr_e");
        assert!(sanitize("日本語 role").is_ascii());
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["v1.2!!", "QA Lead", "  ..hello..  ", "café", "a__b", ""] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn build_path_matches_documented_example() {
        let path = build_artifact_path(Path::new("/out/"), "v1.2!!", "QA Lead", 7);
        assert_eq!(path, Path::new("/out/v1_2-QA_Lead-7.json"));
    }

    #[test]
    fn built_names_never_contain_double_underscores() {
        let dense = build_artifact_path(Path::new("/tmp"), "v!!2...0??", "a  b__c!!", 99);
        let name = dense.file_name().unwrap().to_str().unwrap();
        assert!(!name.contains("__"), "got {name}");
        assert_eq!(name, "v_2_0-a_b_c-99.json");
    }

    #[test]
    fn empty_tokens_still_produce_a_parseable_name() {
        let path = build_artifact_path(Path::new("/out"), "??", "", 3);
        assert_eq!(path, Path::new("/out/--3.json"));
    }
}
