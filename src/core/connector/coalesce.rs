//! Per-market publish-rate limiting: at most one Book Store publish per
//! `coalesce_ms` per market, plus the first update after a pause.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::core::domain::Pair;

pub struct Coalescer {
    coalesce_ms: i64,
    last_published: HashMap<Pair, DateTime<Utc>>,
}

impl Coalescer {
    #[must_use]
    pub fn new(coalesce_ms: i64) -> Self {
        Self { coalesce_ms, last_published: HashMap::new() }
    }

    /// Whether a fresh update for `pair` at `now` should be published, and
    /// records the publish if so.
    pub fn should_publish(&mut self, pair: &Pair, now: DateTime<Utc>) -> bool {
        match self.last_published.get(pair) {
            Some(last) if (now - *last).num_milliseconds() < self.coalesce_ms => false,
            _ => {
                self.last_published.insert(pair.clone(), now);
                true
            }
        }
    }
}
