// src/rules.rs
//! Listing matcher: four independent predicates over normalized text.
//!
//! - model range:  any configured model is a substring of the title
//! - price band:   `price_min <= price <= price_max`, unknown price passes
//! - terms:        any term of any `terms_any` group appears, and no
//!   `terms_exclude` term appears (title + description)
//! - shipping:     only when `require_shipping`; a positive phrase appears
//!   (or none configured) and no negative phrase appears
//!
//! A listing is accepted only when all four pass. Haystacks are normalized
//! once per listing, needles are normalized when compared. A needle that
//! normalizes to nothing (`""`, emoji only) is ignored; a list made only of
//! such needles counts as "not configured".

use crate::config::rules::RuleSet;
use crate::ingest::types::RawListing;
use crate::normalize::{normalize, normalize_joined};

/// Predicate that turned a listing down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    ModelRange,
    PriceBand,
    Terms,
    Shipping,
}

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::ModelRange => "model_range",
            Criterion::PriceBand => "price_band",
            Criterion::Terms => "terms",
            Criterion::Shipping => "shipping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(Criterion),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Run all predicates against `listing`; cheap and selective ones first.
/// `price` is the already-extracted amount (`None` = unknown).
pub fn evaluate(rules: &RuleSet, listing: &RawListing, price: Option<u64>) -> Verdict {
    let title = normalize(&listing.title);
    if !model_range_in(&title, &rules.models) {
        return Verdict::Rejected(Criterion::ModelRange);
    }
    if !price_ok(price, rules) {
        return Verdict::Rejected(Criterion::PriceBand);
    }

    let combined = normalize_joined(&[
        listing.title.as_str(),
        listing.description.as_deref().unwrap_or(""),
    ]);
    if !terms_in(&combined, rules) {
        return Verdict::Rejected(Criterion::Terms);
    }
    if !shipping_in(&combined, rules) {
        return Verdict::Rejected(Criterion::Shipping);
    }
    Verdict::Accepted
}

pub fn in_model_range(title: &str, models: &[String]) -> bool {
    model_range_in(&normalize(title), models)
}

pub fn price_ok(price: Option<u64>, rules: &RuleSet) -> bool {
    let Some(p) = price else {
        return true;
    };
    rules.price_min.map_or(true, |min| min <= p) && rules.price_max.map_or(true, |max| p <= max)
}

/// `text` is the combined title + description.
pub fn shipping_passes(text: &str, rules: &RuleSet) -> bool {
    shipping_in(&normalize(text), rules)
}

pub fn terms_pass(title: &str, description: &str, rules: &RuleSet) -> bool {
    terms_in(&normalize_joined(&[title, description]), rules)
}

// --- internals (haystack already normalized) ---

fn model_range_in(title: &str, models: &[String]) -> bool {
    let needles = needles(models);
    needles.is_empty() || contains_any(title, &needles)
}

fn shipping_in(text: &str, rules: &RuleSet) -> bool {
    if !rules.require_shipping {
        return true;
    }
    let positive = needles(&rules.shipping_positive);
    let has_positive = positive.is_empty() || contains_any(text, &positive);
    let has_negative = contains_any(text, &needles(&rules.shipping_negative));
    has_positive && !has_negative
}

fn terms_in(text: &str, rules: &RuleSet) -> bool {
    // Group structure is not enforced: one hit in any group suffices.
    let include = needles(rules.terms_any.iter().flatten());
    let ok_any = include.is_empty() || contains_any(text, &include);
    let ok_exclude = !contains_any(text, &needles(&rules.terms_exclude));
    ok_any && ok_exclude
}

fn needles<'a, I>(terms: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    terms
        .into_iter()
        .map(|t| normalize(t))
        .filter(|t| !t.is_empty())
        .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str, description: Option<&str>) -> RawListing {
        RawListing {
            title: title.to_string(),
            price_text: None,
            url: "https://x/1".to_string(),
            photo_url: None,
            description: description.map(str::to_string),
            platform: "test".to_string(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn model_range_is_accent_and_case_insensitive() {
        let models = strings(&["iPhone 12", "Galaxy S21"]);
        assert!(in_model_range("IPHONE  12 Pro", &models));
        assert!(in_model_range("Samsung galaxy s21", &models));
        assert!(!in_model_range("iPhone 11", &models));
        assert!(in_model_range("anything", &[]));
    }

    #[test]
    fn price_band_is_inclusive_and_unknown_passes() {
        let rules = RuleSet {
            price_min: Some(100),
            price_max: Some(300),
            ..Default::default()
        };
        assert!(price_ok(Some(100), &rules));
        assert!(price_ok(Some(300), &rules));
        assert!(!price_ok(Some(99), &rules));
        assert!(!price_ok(Some(301), &rules));
        assert!(price_ok(None, &rules));
    }

    #[test]
    fn open_ended_price_bounds() {
        let only_max = RuleSet {
            price_max: Some(50),
            ..Default::default()
        };
        assert!(price_ok(Some(0), &only_max));
        assert!(!price_ok(Some(51), &only_max));
        assert!(price_ok(Some(u64::MAX), &RuleSet::default()));
    }

    #[test]
    fn shipping_only_checked_when_required() {
        let mut rules = RuleSet {
            shipping_positive: strings(&["envoi possible"]),
            shipping_negative: strings(&["main propre uniquement"]),
            ..Default::default()
        };
        assert!(shipping_passes("rien", &rules));

        rules.require_shipping = true;
        assert!(shipping_passes("iPhone ENVOI possible", &rules));
        assert!(!shipping_passes("iPhone", &rules));
        assert!(!shipping_passes("envoi possible ou main propre uniquement", &rules));
    }

    #[test]
    fn shipping_without_positive_terms_only_checks_negatives() {
        let rules = RuleSet {
            require_shipping: true,
            shipping_negative: strings(&["Remise en main propre"]),
            ..Default::default()
        };
        assert!(shipping_passes("envoi en colissimo", &rules));
        assert!(!shipping_passes("remise en main propre", &rules));
    }

    #[test]
    fn terms_any_is_or_across_groups() {
        let rules = RuleSet {
            terms_any: vec![strings(&["64go", "64 gb"]), strings(&["bleu"])],
            ..Default::default()
        };
        assert!(terms_pass("iPhone 12 64 GB", "", &rules));
        assert!(terms_pass("iPhone 12", "couleur Bleu", &rules));
        assert!(!terms_pass("iPhone 12 128go", "noir", &rules));
    }

    #[test]
    fn exclusion_dominates_inclusion() {
        let rules = RuleSet {
            models: strings(&["iphone 12"]),
            terms_any: vec![strings(&["64go"])],
            terms_exclude: strings(&["cassé"]),
            ..Default::default()
        };
        let l = listing("iPhone 12 64Go", Some("écran CASSE"));
        assert_eq!(evaluate(&rules, &l, None), Verdict::Rejected(Criterion::Terms));
    }

    #[test]
    fn blank_needles_do_not_constrain() {
        let rules = RuleSet {
            models: strings(&["", "📱"]),
            terms_exclude: strings(&[" "]),
            ..Default::default()
        };
        assert!(evaluate(&rules, &listing("Nokia 3310", None), None).is_accepted());
    }

    #[test]
    fn empty_rule_set_accepts_everything() {
        let rules = RuleSet::default();
        for title in ["", "iPhone", "écran cassé", "🙂"] {
            assert!(evaluate(&rules, &listing(title, Some("desc")), Some(1_000_000)).is_accepted());
        }
    }

    #[test]
    fn first_failing_criterion_is_reported() {
        let rules = RuleSet {
            models: strings(&["iphone 12"]),
            price_min: Some(100),
            price_max: Some(300),
            terms_exclude: strings(&["cassé"]),
            ..Default::default()
        };
        let broken = listing("iPhone 12 écran cassé", None);
        assert_eq!(
            evaluate(&rules, &broken, Some(90)),
            Verdict::Rejected(Criterion::PriceBand)
        );
        assert_eq!(
            evaluate(&rules, &broken, Some(200)),
            Verdict::Rejected(Criterion::Terms)
        );
        assert_eq!(
            evaluate(&rules, &listing("Pixel 7", None), Some(200)),
            Verdict::Rejected(Criterion::ModelRange)
        );
    }
}
