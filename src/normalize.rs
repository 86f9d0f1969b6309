// src/normalize.rs
//! Canonical text form used by every comparison in the rule evaluator.
//!
//! Pipeline (per char, single pass):
//! 1) NFKD decomposition, so "é" becomes "e" + combining acute
//! 2) drop everything outside ASCII (combining marks, emoji, CJK, ...)
//! 3) ASCII lowercase
//! 4) runs of whitespace collapse to one space, edges trimmed
//!
//! The output is pure ASCII, which makes the function idempotent.

use unicode_normalization::UnicodeNormalization;

/// Fold `text` into its canonical comparable form.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.nfkd().filter(char::is_ascii) {
        if ch.is_whitespace() {
            // Leading whitespace never emits; inner runs emit once.
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch.to_ascii_lowercase());
    }

    out
}

/// Normalize several fragments as one space-joined text (e.g. title + description).
pub fn normalize_joined(parts: &[&str]) -> String {
    normalize(&parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_and_case() {
        assert_eq!(normalize("Écran CASSÉ"), "ecran casse");
        assert_eq!(normalize("Très bon état"), "tres bon etat");
    }

    #[test]
    fn collapses_and_trims_whitespace() {
        assert_eq!(normalize("  iPhone\t12 \n\n 64GB  "), "iphone 12 64gb");
        assert_eq!(normalize("250\u{00A0}€"), "250");
    }

    #[test]
    fn drops_non_encodable_chars() {
        assert_eq!(normalize("📱 iPhone ✨"), "iphone");
        assert_eq!(normalize("東京"), "");
    }

    #[test]
    fn compatibility_forms_fold() {
        // Ligature and full-width forms decompose to plain ASCII.
        assert_eq!(normalize("ﬁne"), "fine");
        assert_eq!(normalize("ＡＢＣ"), "abc");
    }

    #[test]
    fn absent_and_empty_are_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn joined_fragments_share_one_pass() {
        assert_eq!(
            normalize_joined(&["iPhone 12", "Envoi possible"]),
            "iphone 12 envoi possible"
        );
        assert_eq!(normalize_joined(&["Titre", ""]), "titre");
    }
}
