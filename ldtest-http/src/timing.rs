//! Connection phase instrumentation
//!
//! reqwest exposes no per-request trace hooks, so DNS and connect phases are
//! measured by wrapping the client's resolver and connector. Both wrappers report
//! into the [`PhaseProbe`] installed for the current task with [`PhaseProbe::scope`].
//! Work the client moves to a background task (a connect raced by a pooled
//! connection) has no probe and is not recorded.

use parking_lot::Mutex;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Instant;
use tower::Service;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

tokio::task_local! {
    static PROBE: Arc<PhaseProbe>;
}

#[derive(Debug, Default, Clone, Copy)]
struct ProbeState {
    dns: Duration,
    connect: Duration,
}

/// Phase durations observed while one request was being sent
#[derive(Debug, Default)]
pub struct PhaseProbe {
    state: Mutex<ProbeState>,
}

impl PhaseProbe {
    /// Run `fut` with `probe` as the current task's probe
    pub async fn scope<F: Future>(probe: Arc<PhaseProbe>, fut: F) -> F::Output {
        PROBE.scope(probe, fut).await
    }

    /// DNS resolution time
    pub fn dns(&self) -> Duration {
        self.state.lock().dns
    }

    /// Connection establishment time (TCP and TLS), excluding DNS
    pub fn connect(&self) -> Duration {
        let state = self.state.lock();
        state.connect.saturating_sub(state.dns)
    }

    fn record_dns(elapsed: Duration) {
        let _ = PROBE.try_with(|probe| probe.state.lock().dns += elapsed);
    }

    fn record_connect(elapsed: Duration) {
        let _ = PROBE.try_with(|probe| probe.state.lock().connect += elapsed);
    }
}

/// Resolver that records lookup time into the current probe
#[derive(Debug, Default, Clone, Copy)]
pub struct TimedResolver;

impl Resolve for TimedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let started = Instant::now();
            let addrs = tokio::net::lookup_host((name.as_str(), 0)).await;
            PhaseProbe::record_dns(started.elapsed());

            // The lookup iterator borrows `name`; reqwest needs owned addresses
            let addrs: Vec<SocketAddr> = addrs?.collect();
            Ok::<Addrs, BoxError>(Box::new(addrs.into_iter()))
        })
    }
}

/// Connector wrapper that records the time spent establishing a connection.
///
/// The wrapped connector also performs DNS resolution; [`PhaseProbe::connect`]
/// subtracts it.
#[derive(Debug, Clone)]
pub struct TimedConnector<S> {
    inner: S,
}

impl<S> TimedConnector<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, R> Service<R> for TimedConnector<S>
where
    S: Service<R>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: R) -> Self::Future {
        let connecting = self.inner.call(request);
        Box::pin(async move {
            let started = Instant::now();
            let connection = connecting.await;
            PhaseProbe::record_connect(started.elapsed());
            connection
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_only_inside_scope() {
        PhaseProbe::record_dns(Duration::from_millis(5));

        let probe = Arc::new(PhaseProbe::default());
        PhaseProbe::scope(probe.clone(), async {
            PhaseProbe::record_dns(Duration::from_millis(2));
            PhaseProbe::record_connect(Duration::from_millis(7));
        })
        .await;

        assert_eq!(probe.dns(), Duration::from_millis(2));
        assert_eq!(probe.connect(), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_resolver_yields_owned_addresses() {
        let probe = Arc::new(PhaseProbe::default());
        let name: Name = "localhost".parse().unwrap();

        let addrs = PhaseProbe::scope(probe.clone(), TimedResolver.resolve(name))
            .await
            .unwrap();

        let addrs: Vec<SocketAddr> = addrs.collect();
        assert!(!addrs.is_empty());
        assert!(addrs.iter().all(|addr| addr.ip().is_loopback()));
    }

    #[tokio::test]
    async fn test_connect_never_underflows() {
        let probe = Arc::new(PhaseProbe::default());
        PhaseProbe::scope(probe.clone(), async {
            PhaseProbe::record_dns(Duration::from_millis(3));
        })
        .await;

        assert_eq!(probe.connect(), Duration::ZERO);
    }
}
