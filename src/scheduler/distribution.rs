//! Work distribution across proxies and workers
//!
//! Distribution happens in two steps:
//!
//! 1. **Pairing** binds fetch units to proxies, producing [`Assignment`]s.
//!    Link crawls pair positionally (one unit per proxy); employer crawls give
//!    each proxy a contiguous chunk of `ceil(units / proxies)` units.
//! 2. **Batching** splits the assignments into one contiguous [`WorkBatch`]
//!    per worker.
//!
//! Pairing never invents work: surplus proxies or units are dropped and the
//! drop counts are reported on the result.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{SchedulerError, SchedulerResult};
use super::proxy::ProxyCredential;

// ============================================================================
// Units and Assignments
// ============================================================================

/// Atomic unit of work handed to a worker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchUnit {
    /// Fully-resolved search query URL
    Link(String),
    /// Numeric employer id
    EmployerId(u64),
    /// Free-text employer name to search for
    EmployerQuery(String),
}

impl fmt::Display for FetchUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(link) => write!(f, "{link}"),
            Self::EmployerId(id) => write!(f, "employer {id}"),
            Self::EmployerQuery(query) => write!(f, "employer query '{query}'"),
        }
    }
}

/// One proxy together with the units it fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub proxy: ProxyCredential,
    pub units: Vec<FetchUnit>,
}

/// How units are bound to proxies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingStrategy {
    /// i-th proxy with i-th unit, stopping at the shorter list
    Positional,
    /// Each proxy takes a contiguous chunk of `ceil(units / proxies)` units
    ChunkPerProxy,
}

/// Result of pairing units with proxies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    pub assignments: Vec<Assignment>,

    /// Proxies left without work
    pub dropped_proxies: usize,

    /// Units left without a proxy
    pub dropped_units: usize,
}

impl Pairing {
    /// Total number of units carried by the assignments
    pub fn unit_count(&self) -> usize {
        self.assignments.iter().map(|a| a.units.len()).sum()
    }

    pub fn is_truncated(&self) -> bool {
        self.dropped_proxies > 0 || self.dropped_units > 0
    }
}

/// Pair the i-th proxy with the i-th unit.
///
/// Pairing stops at the shorter list; the surplus is counted, not assigned.
pub fn pair_positional(proxies: &[ProxyCredential], units: Vec<FetchUnit>) -> Pairing {
    let paired = proxies.len().min(units.len());
    let dropped_proxies = proxies.len() - paired;
    let dropped_units = units.len() - paired;

    let assignments = proxies
        .iter()
        .zip(units)
        .map(|(proxy, unit)| Assignment {
            proxy: proxy.clone(),
            units: vec![unit],
        })
        .collect();

    Pairing {
        assignments,
        dropped_proxies,
        dropped_units,
    }
}

/// Give each proxy a contiguous chunk of `ceil(units / proxies)` units
pub fn pair_chunked(
    proxies: &[ProxyCredential],
    units: Vec<FetchUnit>,
) -> SchedulerResult<Pairing> {
    if units.is_empty() {
        return Ok(Pairing {
            dropped_proxies: proxies.len(),
            ..Default::default()
        });
    }
    if proxies.is_empty() {
        return Err(SchedulerError::NoProxies { units: units.len() });
    }

    let per_proxy = units.len().div_ceil(proxies.len());
    let assignments: Vec<Assignment> = units
        .chunks(per_proxy)
        .zip(proxies)
        .map(|(chunk, proxy)| Assignment {
            proxy: proxy.clone(),
            units: chunk.to_vec(),
        })
        .collect();

    Ok(Pairing {
        dropped_proxies: proxies.len() - assignments.len(),
        dropped_units: 0,
        assignments,
    })
}

// ============================================================================
// Worker Batches
// ============================================================================

/// Assignments handled by exactly one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkBatch {
    /// Position of the batch, used in output file names
    pub index: usize,
    pub assignments: Vec<Assignment>,
}

impl WorkBatch {
    /// Iterate over every `(proxy, unit)` pair of the batch
    pub fn pairs(&self) -> impl Iterator<Item = (&ProxyCredential, &FetchUnit)> {
        self.assignments
            .iter()
            .flat_map(|a| a.units.iter().map(move |unit| (&a.proxy, unit)))
    }

    pub fn unit_count(&self) -> usize {
        self.assignments.iter().map(|a| a.units.len()).sum()
    }
}

/// Split assignments into contiguous per-worker batches.
///
/// `min(worker_count, assignments)` batches are produced. Each holds
/// `floor(assignments / batches)` assignments and the last batch also takes
/// the remainder, so it may be larger than the others.
pub fn split_batches(
    assignments: Vec<Assignment>,
    worker_count: usize,
) -> SchedulerResult<Vec<WorkBatch>> {
    if worker_count == 0 {
        return Err(SchedulerError::InvalidWorkerCount { count: 0 });
    }
    if assignments.is_empty() {
        return Ok(Vec::new());
    }

    let batch_count = worker_count.min(assignments.len());
    let size = assignments.len() / batch_count;

    let mut batches = Vec::with_capacity(batch_count);
    let mut rest = assignments.into_iter();

    for index in 0..batch_count {
        let take = if index + 1 == batch_count {
            usize::MAX
        } else {
            size
        };
        let chunk: Vec<Assignment> = rest.by_ref().take(take).collect();
        batches.push(WorkBatch {
            index,
            assignments: chunk,
        });
    }

    Ok(batches)
}

/// Batches ready for dispatch plus what pairing had to drop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    pub batches: Vec<WorkBatch>,
    pub dropped_proxies: usize,
    pub dropped_units: usize,
}

impl Distribution {
    pub fn unit_count(&self) -> usize {
        self.batches.iter().map(WorkBatch::unit_count).sum()
    }
}

/// Pair units with proxies using `strategy` and split the result into batches
pub fn distribute(
    proxies: &[ProxyCredential],
    units: Vec<FetchUnit>,
    worker_count: usize,
    strategy: PairingStrategy,
) -> SchedulerResult<Distribution> {
    if worker_count == 0 {
        return Err(SchedulerError::InvalidWorkerCount { count: 0 });
    }

    let pairing = match strategy {
        PairingStrategy::Positional => pair_positional(proxies, units),
        PairingStrategy::ChunkPerProxy => pair_chunked(proxies, units)?,
    };

    if pairing.is_truncated() {
        tracing::warn!(
            strategy = ?strategy,
            dropped_proxies = pairing.dropped_proxies,
            dropped_units = pairing.dropped_units,
            "Proxy and unit lists differ in length, surplus dropped"
        );
    }

    let Pairing {
        assignments,
        dropped_proxies,
        dropped_units,
    } = pairing;

    let batches = split_batches(assignments, worker_count)?;

    tracing::info!(
        strategy = ?strategy,
        batches = batches.len(),
        units = batches.iter().map(WorkBatch::unit_count).sum::<usize>(),
        "Work distributed"
    );

    Ok(Distribution {
        batches,
        dropped_proxies,
        dropped_units,
    })
}
