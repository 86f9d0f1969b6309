// src/price.rs
//! Localized price text -> whole currency units.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Upper bound on digits + grouping separators in front of the currency marker.
const MAX_GROUPED_LEN: usize = 7;

fn price_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        // ASCII digits only: other scripts' digits would not parse as u64.
        let pattern = format!(r"([0-9][0-9\s]{{0,{}}})\s*€", MAX_GROUPED_LEN - 1);
        Regex::new(&pattern).expect("static price regex")
    })
}

/// Extract the first euro amount from `text`.
///
/// Accepts digit runs grouped with spaces (regular, non-breaking or narrow
/// non-breaking), immediately followed by `€`. Returns `None` for any other
/// shape; callers treat that as "price unknown".
///
/// When the text mentions several amounts (sale price then shipping), the
/// first one wins.
pub fn parse_price(text: &str) -> Option<u64> {
    let caps = price_re().captures(text)?;
    let digits: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_amount() {
        assert_eq!(parse_price("250 €"), Some(250));
        assert_eq!(parse_price("250€"), Some(250));
    }

    #[test]
    fn grouped_amounts() {
        assert_eq!(parse_price("1 200 €"), Some(1200));
        assert_eq!(parse_price("1\u{00A0}200\u{00A0}€"), Some(1200));
        assert_eq!(parse_price("1\u{202F}200 €"), Some(1200));
    }

    #[test]
    fn first_marked_amount_wins() {
        assert_eq!(parse_price("Prix : 90 € + livraison 5 €"), Some(90));
    }

    #[test]
    fn no_marker_is_unknown() {
        assert_eq!(parse_price("250"), None);
        assert_eq!(parse_price("Prix à débattre"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("€ 250"), None);
    }

    #[test]
    fn non_ascii_digits_do_not_hide_a_later_price() {
        assert_eq!(parse_price("٢٥٠ € puis 250 €"), Some(250));
        assert_eq!(parse_price("٢٥٠ €"), None);
    }

    #[test]
    fn decimals_keep_whole_part_only() {
        // "12,50 €": the marked run is "50"
        assert_eq!(parse_price("12,50 €"), Some(50));
    }
}
