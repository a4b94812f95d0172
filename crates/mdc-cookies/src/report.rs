//! Folding probe results into a summary and a recommendation.

use serde::Serialize;

use crate::types::{Outcome, ProbeResult};

/// What the user should do next. Exactly one applies to a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// No domain validated; re-extract every cookie.
    ReextractAll,
    /// Some domains validated; re-extract the failing ones.
    ReextractFailing,
    /// Every tested domain validated.
    FullyOperational,
}

impl Recommendation {
    pub fn headline(&self) -> &'static str {
        match self {
            Recommendation::ReextractAll => "no scrapers working, re-extract all cookies",
            Recommendation::ReextractFailing => "partial: re-extract failing domains",
            Recommendation::FullyOperational => "fully operational",
        }
    }
}

/// Domains that share an outcome, in the order they were tested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeGroup {
    pub outcome: Outcome,
    pub domains: Vec<String>,
}

/// Aggregate view of one test run. Rebuilt from scratch each time.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub success_count: usize,
    pub total_count: usize,
    /// Groups in order of first appearance.
    pub groups: Vec<OutcomeGroup>,
    pub recommendation: Recommendation,
}

impl Summary {
    /// Domains with the given outcome; empty when none.
    pub fn domains_with(&self, outcome: Outcome) -> &[String] {
        self.groups
            .iter()
            .find(|g| g.outcome == outcome)
            .map(|g| g.domains.as_slice())
            .unwrap_or(&[])
    }

    /// Whether at least one domain validated.
    pub fn is_operational(&self) -> bool {
        self.success_count > 0
    }

    /// Domains that did not validate, in test order.
    pub fn failing_domains(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| g.outcome != Outcome::Success)
            .flat_map(|g| g.domains.iter().map(String::as_str))
            .collect()
    }
}

/// Fold a run's results into a [`Summary`].
pub fn aggregate(results: &[ProbeResult]) -> Summary {
    let mut groups: Vec<OutcomeGroup> = Vec::new();
    for result in results {
        match groups.iter_mut().find(|g| g.outcome == result.outcome) {
            Some(group) => group.domains.push(result.domain.clone()),
            None => groups.push(OutcomeGroup {
                outcome: result.outcome,
                domains: vec![result.domain.clone()],
            }),
        }
    }

    let success_count = results.iter().filter(|r| r.is_success()).count();
    let total_count = results.len();

    Summary {
        success_count,
        total_count,
        groups,
        recommendation: recommend(success_count, total_count),
    }
}

fn recommend(success_count: usize, total_count: usize) -> Recommendation {
    if success_count == 0 {
        Recommendation::ReextractAll
    } else if success_count < total_count {
        Recommendation::ReextractFailing
    } else {
        Recommendation::FullyOperational
    }
}
