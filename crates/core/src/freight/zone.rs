use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::cache::ReadThroughCache;
use super::sources::{SourceError, ZoneRepository};
use super::zone_key::normalize_zone_key;
use crate::domain::result::ZoneSource;
use crate::domain::zone::ZoneId;

/// Trims, uppercases and strips spaces and dashes from a postal code.
pub fn normalize_postal(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect::<String>().to_uppercase()
}

/// One row of a zone chart. Each side is an exact postal code, a prefix
/// ending in `*`, or the bare wildcard `*`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRule {
    pub origin: String,
    pub destination: String,
    pub zone: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PatternMatch {
    Wildcard,
    Prefix(usize),
    Exact(usize),
}

fn match_pattern(pattern: &str, postal: &str) -> Option<PatternMatch> {
    let pattern = normalize_postal(pattern);
    if pattern == "*" {
        return Some(PatternMatch::Wildcard);
    }
    match pattern.strip_suffix('*') {
        Some(prefix) => postal.starts_with(prefix).then_some(PatternMatch::Prefix(prefix.len())),
        None => (pattern == postal).then_some(PatternMatch::Exact(pattern.len())),
    }
}

/// Zone chart with most-specific-match lookup: an exact postal pair beats
/// any prefix match, which beats a wildcard. Among prefix matches the
/// longest combined prefix wins; remaining ties go to the earlier rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneTable {
    rules: Vec<ZoneRule>,
}

impl ZoneTable {
    pub fn new(rules: Vec<ZoneRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ZoneRule] {
        &self.rules
    }

    pub fn lookup(&self, origin: &str, destination: &str) -> Option<&str> {
        let origin = normalize_postal(origin);
        let destination = normalize_postal(destination);

        let mut best: Option<((u8, usize), &ZoneRule)> = None;
        for rule in &self.rules {
            let (Some(from), Some(to)) =
                (match_pattern(&rule.origin, &origin), match_pattern(&rule.destination, &destination))
            else {
                continue;
            };

            let rank = rank(from, to);
            if best.map_or(true, |(best_rank, _)| rank > best_rank) {
                best = Some((rank, rule));
            }
        }

        best.map(|(_, rule)| rule.zone.as_str())
    }
}

fn rank(from: PatternMatch, to: PatternMatch) -> (u8, usize) {
    let length = |side: PatternMatch| match side {
        PatternMatch::Exact(len) | PatternMatch::Prefix(len) => len,
        PatternMatch::Wildcard => 0,
    };
    let tier = match (from, to) {
        (PatternMatch::Exact(_), PatternMatch::Exact(_)) => 2,
        (PatternMatch::Wildcard, _) | (_, PatternMatch::Wildcard) => 0,
        _ => 1,
    };
    (tier, length(from) + length(to))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneResolution {
    pub zone: ZoneId,
    pub source: ZoneSource,
    /// Why the default zone was used, when it was.
    pub fallback_reason: Option<String>,
}

/// Resolves postal pairs to zones through a TTL cache. Never fails: any miss
/// or store error degrades to the configured default zone.
pub struct ZoneResolver {
    repository: Arc<dyn ZoneRepository>,
    cache: ReadThroughCache<(String, String), Option<ZoneId>>,
    default_zone: ZoneId,
}

impl ZoneResolver {
    pub fn new(repository: Arc<dyn ZoneRepository>, default_zone: ZoneId, ttl: Duration) -> Self {
        Self { repository, cache: ReadThroughCache::new("zone", Some(ttl)), default_zone }
    }

    pub fn default_zone(&self) -> ZoneId {
        self.default_zone
    }

    pub async fn resolve(&self, origin: &str, destination: &str) -> ZoneResolution {
        let key = (normalize_postal(origin), normalize_postal(destination));
        let repository = self.repository.clone();
        let lookup = self
            .cache
            .get_or_try_populate(key.clone(), || async move {
                let label = repository.resolve(&key.0, &key.1).await?;
                Ok::<_, SourceError>(label.and_then(|label| {
                    let zone = normalize_zone_key(&label);
                    if zone.is_none() {
                        warn!(
                            event_name = "freight.zone.unrecognized_label",
                            label = %label,
                            "zone chart returned an unrecognized zone label"
                        );
                    }
                    zone
                }))
            })
            .await;

        let reason = match lookup.as_deref() {
            Ok(Some(zone)) => {
                return ZoneResolution {
                    zone: *zone,
                    source: ZoneSource::Resolved,
                    fallback_reason: None,
                };
            }
            Ok(None) => "no zone chart entry".to_string(),
            Err(error) => error.to_string(),
        };

        warn!(
            event_name = "freight.zone.defaulted",
            origin = %origin,
            destination = %destination,
            default_zone = %self.default_zone,
            reason = %reason,
            "zone lookup missed; using default zone"
        );
        ZoneResolution {
            zone: self.default_zone,
            source: ZoneSource::Default,
            fallback_reason: Some(reason),
        }
    }

    /// Drops every cached pair; call when the zone chart changes.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all().await;
    }

    pub fn populations(&self) -> u64 {
        self.cache.populations()
    }
}
