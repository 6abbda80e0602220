//! Ordered fallback chains
//!
//! Degraded-service paths (fee history -> legacy gas price, pinning service ->
//! local node, ...) are lists of named strategies tried in order. Each attempt
//! returns a value or a reason; the first success wins and every skipped
//! strategy is kept so callers and tests can see which branch was taken.

use std::fmt;
use std::future::Future;

use tracing::debug;

/// A named step in a fallback chain
pub trait Strategy: Copy + fmt::Debug {
    fn name(&self) -> &'static str;
}

/// A strategy that was tried and failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub strategy: &'static str,
    pub reason: String,
}

/// Outcome of a chain that produced a value
#[derive(Debug)]
pub struct Resolved<T> {
    pub strategy: &'static str,
    pub value: T,
    pub skipped: Vec<Skipped>,
}

/// Every strategy failed; errors are kept in the order they were tried
#[derive(Debug)]
pub struct Exhausted<E> {
    pub failures: Vec<(&'static str, E)>,
}

impl<E> Exhausted<E> {
    /// Error from the last strategy tried
    pub fn into_last(self) -> Option<E> {
        self.failures.into_iter().last().map(|(_, err)| err)
    }
}

impl<E: fmt::Display> fmt::Display for Exhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "no strategies configured");
        }
        let parts: Vec<String> = self
            .failures
            .iter()
            .map(|(name, err)| format!("{}: {}", name, err))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Try `strategies` in order until one succeeds
pub async fn resolve<S, T, E, F, Fut>(
    chain: &str,
    strategies: &[S],
    mut attempt: F,
) -> Result<Resolved<T>, Exhausted<E>>
where
    S: Strategy,
    E: fmt::Display,
    F: FnMut(S) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures: Vec<(&'static str, E)> = Vec::new();

    for &strategy in strategies {
        match attempt(strategy).await {
            Ok(value) => {
                if !failures.is_empty() {
                    debug!(
                        "{}: using '{}' after {} failed strateg{}",
                        chain,
                        strategy.name(),
                        failures.len(),
                        if failures.len() == 1 { "y" } else { "ies" }
                    );
                }
                let skipped = failures
                    .into_iter()
                    .map(|(name, err)| Skipped {
                        strategy: name,
                        reason: err.to_string(),
                    })
                    .collect();
                return Ok(Resolved {
                    strategy: strategy.name(),
                    value,
                    skipped,
                });
            }
            Err(err) => {
                debug!("{}: strategy '{}' failed: {}", chain, strategy.name(), err);
                failures.push((strategy.name(), err));
            }
        }
    }

    Err(Exhausted { failures })
}
