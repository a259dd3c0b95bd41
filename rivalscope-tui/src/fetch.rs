//! Background fetch plumbing.
//!
//! The UI loop is single-threaded; anything that talks to the backend runs
//! on a tokio runtime owned here and reports back over a channel the app
//! drains once per tick. Every request carries a generation number for its
//! scope: a response whose generation no longer matches the scope's current
//! one was superseded while in flight, and the app drops it instead of
//! overwriting newer data. Action outcomes (mute, save, watch) are exempt;
//! they always apply.

use std::future::Future;

use rivalscope_core::types::*;
use rivalscope_core::Result;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

/// One independently-fetching surface of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchScope {
    Companies = 0,
    Signals,
    /// Stored-signal list backing the dashboard cards
    StoredSignals,
    Tearsheet,
    Reports,
    Activity,
    Settings,
    Sources,
    Runs,
    Search,
    Health,
    Action,
}

const SCOPE_COUNT: usize = 12;

/// What came back from a background fetch.
pub enum FetchOutcome {
    Companies(Result<Vec<Company>>),
    /// Detected signals plus the cache key the request was made under.
    /// `merge` prepends into the current list instead of replacing it
    /// (live re-detection of a single company).
    Signals {
        key: String,
        merge: bool,
        /// Companies whose detect call failed during the pass
        failed: usize,
        result: Result<Vec<Signal>>,
    },
    /// Stored signals read straight from the backend (dashboard cards)
    StoredSignals(Result<Vec<Signal>>),
    Tearsheet {
        company_id: String,
        result: Result<Option<TearSheet>>,
    },
    Reports(Result<Vec<Report>>),
    ReportGenerated(Result<Report>),
    Activity(Result<Vec<ActivityRow>>),
    Settings(Result<ServerSettings>),
    SettingsSaved(Result<ServerSettings>),
    Sources(Result<SourcesConfig>),
    SourcesSaved(Result<SourcesConfig>),
    /// Watchlist run results plus the cache key they belong under
    Runs {
        key: String,
        result: Result<Vec<WatchlistRunResult>>,
    },
    Search {
        query: String,
        result: Result<Vec<SearchHit>>,
    },
    Health(bool),
    CompanyWatched(Result<Company>),
    CompanyUpdated(Result<Company>),
    SignalMuted {
        signal_id: String,
        result: Result<()>,
    },
    FollowUpCreated {
        signal_id: String,
        result: Result<()>,
    },
}

/// A fetch outcome tagged with where it belongs and which request produced it.
pub struct FetchEnvelope {
    pub scope: FetchScope,
    pub generation: u64,
    pub outcome: FetchOutcome,
}

/// Per-scope request generations.
///
/// Bump a scope with [`Generations::next`] when issuing a request; apply an
/// arriving envelope only if [`Generations::is_current`] says it is still the
/// latest for its scope.
#[derive(Debug, Default)]
pub struct Generations {
    current: [u64; SCOPE_COUNT],
}

impl Generations {
    /// Start a new request generation for a scope, superseding any in flight.
    pub fn next(&mut self, scope: FetchScope) -> u64 {
        let slot = &mut self.current[scope as usize];
        *slot += 1;
        *slot
    }

    pub fn current(&self, scope: FetchScope) -> u64 {
        self.current[scope as usize]
    }

    /// Whether an envelope belongs to the latest request for its scope.
    /// Actions always count as current.
    pub fn is_current(&self, envelope: &FetchEnvelope) -> bool {
        envelope.scope == FetchScope::Action || envelope.generation == self.current(envelope.scope)
    }
}

/// Owns the background runtime and the result channel.
pub struct Fetcher {
    runtime: Runtime,
    tx: mpsc::Sender<FetchEnvelope>,
    rx: mpsc::Receiver<FetchEnvelope>,
}

impl Fetcher {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::channel(64);
        Ok(Self { runtime, tx, rx })
    }

    /// Queue a fetch. The future runs on the background runtime; its outcome
    /// arrives through [`Fetcher::try_recv`] tagged with scope and generation.
    pub fn spawn<F>(&self, scope: FetchScope, generation: u64, fut: F)
    where
        F: Future<Output = FetchOutcome> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let outcome = fut.await;
            // Receiver gone means the app is shutting down
            let _ = tx
                .send(FetchEnvelope {
                    scope,
                    generation,
                    outcome,
                })
                .await;
        });
    }

    /// Pull one arrived outcome without blocking, if any.
    pub fn try_recv(&mut self) -> Option<FetchEnvelope> {
        self.rx.try_recv().ok()
    }

    /// Run a future to completion on the background runtime. Only for the
    /// one-shot CLI subcommands; the TUI never blocks on this.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_are_per_scope() {
        let mut generations = Generations::default();
        assert_eq!(generations.next(FetchScope::Signals), 1);
        assert_eq!(generations.next(FetchScope::Signals), 2);
        assert_eq!(generations.next(FetchScope::Companies), 1);
        assert_eq!(generations.current(FetchScope::Signals), 2);
        assert_eq!(generations.current(FetchScope::Companies), 1);
    }

    #[test]
    fn stale_envelopes_are_not_current() {
        let mut generations = Generations::default();
        let first = generations.next(FetchScope::Signals);
        let second = generations.next(FetchScope::Signals);

        let stale = FetchEnvelope {
            scope: FetchScope::Signals,
            generation: first,
            outcome: FetchOutcome::Health(true),
        };
        let fresh = FetchEnvelope {
            scope: FetchScope::Signals,
            generation: second,
            outcome: FetchOutcome::Health(true),
        };

        assert!(!generations.is_current(&stale));
        assert!(generations.is_current(&fresh));
    }

    #[test]
    fn action_envelopes_always_apply() {
        let mut generations = Generations::default();
        generations.next(FetchScope::Action);
        generations.next(FetchScope::Action);

        let old_action = FetchEnvelope {
            scope: FetchScope::Action,
            generation: 1,
            outcome: FetchOutcome::Health(true),
        };
        assert!(generations.is_current(&old_action));
    }

    #[test]
    fn spawned_outcome_arrives_on_channel() {
        let mut fetcher = Fetcher::new().unwrap();
        fetcher.spawn(FetchScope::Health, 1, async { FetchOutcome::Health(true) });

        let mut envelope = None;
        for _ in 0..50 {
            if let Some(e) = fetcher.try_recv() {
                envelope = Some(e);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let envelope = envelope.expect("outcome should arrive");
        assert_eq!(envelope.scope, FetchScope::Health);
        assert_eq!(envelope.generation, 1);
        assert!(matches!(envelope.outcome, FetchOutcome::Health(true)));
    }
}
