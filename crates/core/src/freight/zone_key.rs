//! Load-time normalization of historical zone key spellings.
//!
//! Rate imports have used many spellings for the same zone (`zone3`,
//! `Zone 3`, `ZONE_03`, `z3`, `3`, `3区`, `分区3`, `zone3rate`...). They are
//! mapped to [`ZoneId`] once, when a band or surcharge is built, so the
//! calculation path only ever does exact map lookups.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::domain::zone::ZoneId;

const PREFIXES: &[&str] = &["zone", "zona", "z", "分区", "区域", "区"];
const SUFFIXES: &[&str] = &["rate", "price", "fee", "zone", "号区", "区"];

/// Maps a raw zone spelling to its zone, or `None` when unrecognized.
pub fn normalize_zone_key(raw: &str) -> Option<ZoneId> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-' | '.' | ':' | '#'))
        .collect::<String>()
        .to_lowercase();

    let digits_start = compact.find(|c: char| c.is_ascii_digit())?;
    let (prefix, rest) = compact.split_at(digits_start);
    let digits_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (digits, suffix) = rest.split_at(digits_len);

    let prefix_ok = prefix.is_empty() || PREFIXES.contains(&prefix);
    let suffix_ok = suffix.is_empty() || SUFFIXES.contains(&suffix);
    if !prefix_ok || !suffix_ok {
        return None;
    }

    digits.parse::<u32>().ok().map(ZoneId)
}

/// True when `raw` is already spelled exactly `zone<N>`.
pub fn is_canonical_key(raw: &str, zone: ZoneId) -> bool {
    raw == zone.key()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedZoneMap {
    pub values: BTreeMap<ZoneId, Decimal>,
    pub dropped_keys: Vec<String>,
}

/// Normalizes a raw `spelling -> value` map.
///
/// When several spellings land on one zone the canonical spelling wins;
/// otherwise the first positive value in key order is kept.
pub fn normalize_zone_map(raw: &BTreeMap<String, Decimal>) -> NormalizedZoneMap {
    let mut normalized = NormalizedZoneMap::default();
    let mut canonical: BTreeSet<ZoneId> = BTreeSet::new();

    for (key, value) in raw {
        let Some(zone) = normalize_zone_key(key) else {
            normalized.dropped_keys.push(key.clone());
            continue;
        };

        if is_canonical_key(key, zone) {
            canonical.insert(zone);
            normalized.values.insert(zone, *value);
            continue;
        }

        if canonical.contains(&zone) {
            continue;
        }

        match normalized.values.get(&zone) {
            Some(existing) if *existing > Decimal::ZERO => {}
            _ => {
                normalized.values.insert(zone, *value);
            }
        }
    }

    normalized
}
