use std::collections::BTreeMap;
use std::time::Instant;

use futures::future::join_all;
use shared_client::{Client, ClientError, ReadinessProbe};
use shared_config::Clients;
use tracing::{debug, warn};

use crate::metrics;

/// How [`Dependencies::check`] runs its probes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeMode {
    /// One at a time in name order, stopping at the first failure.
    #[default]
    Sequential,
    /// All at once. Results are still reduced in name order, so the
    /// alphabetically first failing dependency decides the verdict.
    Concurrent,
}

/// A dependency that could not be reached, tagged with its logical name.
#[derive(Debug, thiserror::Error)]
#[error("[{dependency}] error: {source}")]
pub struct DependencyError {
    pub dependency: String,
    #[source]
    pub source: ClientError,
}

/// Outcome of one readiness check across all dependencies.
#[derive(Debug)]
pub enum Verdict {
    Ready,
    /// The dependency answered but reported itself unhealthy.
    Unavailable { dependency: String },
    /// The dependency could not be reached.
    Failed(DependencyError),
}

impl Verdict {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Named set of dependencies probed by the readiness endpoint.
///
/// Built once at startup and read-only afterwards. Each call to
/// [`check`](Self::check) probes afresh; nothing is cached between calls.
pub struct Dependencies<P = Client> {
    probes: BTreeMap<String, P>,
    mode: ProbeMode,
}

impl Dependencies<Client> {
    /// Build a [`Client`] for every configured dependency.
    pub fn from_config(conf: &Clients) -> Result<Self, DependencyError> {
        let mut probes = BTreeMap::new();
        for (name, client_conf) in &conf.clients {
            let client = Client::new(client_conf).map_err(|source| DependencyError {
                dependency: name.clone(),
                source,
            })?;
            probes.insert(name.clone(), client);
        }
        Ok(Self::new(probes))
    }
}

impl<P: ReadinessProbe> Dependencies<P> {
    pub fn new(probes: impl IntoIterator<Item = (String, P)>) -> Self {
        Self {
            probes: probes.into_iter().collect(),
            mode: ProbeMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ProbeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ProbeMode {
        self.mode
    }

    pub fn get(&self, name: &str) -> Option<&P> {
        self.probes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Probe every dependency and reduce the results to one verdict.
    ///
    /// The first failure in name order wins: an unreachable dependency gives
    /// [`Verdict::Failed`], an unhealthy one [`Verdict::Unavailable`]. In
    /// sequential mode the remaining dependencies are not probed.
    pub async fn check(&self) -> Verdict {
        match self.mode {
            ProbeMode::Sequential => {
                for (name, probe) in &self.probes {
                    let outcome = timed_probe(name, probe).await;
                    if let Some(verdict) = failure(name, outcome) {
                        return verdict;
                    }
                }
            }
            ProbeMode::Concurrent => {
                let mut pending = Vec::with_capacity(self.probes.len());
                for (name, probe) in &self.probes {
                    pending.push(timed_probe(name, probe));
                }
                let outcomes = join_all(pending).await;
                for (name, outcome) in self.probes.keys().zip(outcomes) {
                    if let Some(verdict) = failure(name, outcome) {
                        return verdict;
                    }
                }
            }
        }
        Verdict::Ready
    }
}

async fn timed_probe<P: ReadinessProbe>(name: &str, probe: &P) -> Result<bool, ClientError> {
    let start = Instant::now();
    let outcome = probe.is_ready().await;
    let result = match &outcome {
        Ok(true) => "ready",
        Ok(false) => "unavailable",
        Err(_) => "error",
    };
    metrics::observe_readiness_check(name, result, start.elapsed().as_secs_f64());
    debug!(dependency = name, result, "probed dependency");
    outcome
}

fn failure(name: &str, outcome: Result<bool, ClientError>) -> Option<Verdict> {
    match outcome {
        Ok(true) => None,
        Ok(false) => {
            warn!(dependency = name, "dependency reported unhealthy");
            Some(Verdict::Unavailable {
                dependency: name.to_string(),
            })
        }
        Err(source) => {
            warn!(dependency = name, error = %source, "dependency unreachable");
            Some(Verdict::Failed(DependencyError {
                dependency: name.to_string(),
                source,
            }))
        }
    }
}
