//! reqwest-backed request executor

use crate::errors::HttpError;
use crate::executor::{ExecutorFactory, RequestExecutor, RoundContext};
use crate::timing::{PhaseProbe, TimedConnector, TimedResolver};
use ldtest_core::{
    FailureKind, HttpMethod, LoadTestConfig, PhaseTimings, RequestOutcome, Target,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Method, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower::layer::layer_fn;
use tracing::debug;

/// Hard limit for a single request, independent of the slow-request threshold
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

/// Executes requests for one target over a dedicated connection pool
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    method: Method,
}

impl HttpExecutor {
    pub fn new(config: &LoadTestConfig) -> Result<Self, HttpError> {
        Ok(Self {
            client: build_client(config)?,
            method: reqwest_method(config.method),
        })
    }

    async fn exchange(&self, target: &Target) -> Exchange {
        let sent = Instant::now();
        let mut response = match self
            .client
            .request(self.method.clone(), target.url())
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                debug!(url = target.url(), error = %error, "request failed");
                return Exchange::failed(classify(&error));
            }
        };
        let ttfb = sent.elapsed();
        let status_code = response.status().as_u16();

        // Drain the body so the connection goes back to the pool
        let reading = Instant::now();
        let error = match drain(&mut response).await {
            Ok(()) => None,
            Err(error) => {
                debug!(url = target.url(), error = %error, "reading response body failed");
                Some(classify(&error))
            }
        };

        Exchange {
            status_code: Some(status_code),
            ttfb,
            read: reading.elapsed(),
            error,
        }
    }
}

#[async_trait::async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(
        &self,
        target: &Target,
        round: RoundContext,
        cancel: &CancellationToken,
    ) -> RequestOutcome {
        let started = Instant::now();
        let probe = Arc::new(PhaseProbe::default());

        let exchange = tokio::select! {
            biased;
            _ = cancel.cancelled() => Exchange::failed(FailureKind::DeadlineExceeded),
            exchange = PhaseProbe::scope(probe.clone(), self.exchange(target)) => exchange,
        };

        RequestOutcome {
            target: target.clone(),
            round_offset: started.saturating_duration_since(round.started_at),
            status_code: exchange.status_code,
            total: started.elapsed(),
            phases: PhaseTimings {
                dns: probe.dns(),
                connect: probe.connect(),
                // reqwest does not expose when the request head finished writing
                write: Duration::ZERO,
                ttfb: exchange.ttfb,
                read: exchange.read,
            },
            error: exchange.error,
            concurrency: round.concurrency,
        }
    }
}

/// Builds one [`HttpExecutor`] (and so one connection pool) per target
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpExecutorFactory;

impl ExecutorFactory for HttpExecutorFactory {
    fn build(
        &self,
        target: &Target,
        config: &LoadTestConfig,
    ) -> Result<Arc<dyn RequestExecutor>, HttpError> {
        debug!(url = target.url(), method = %config.method, "building HTTP client");
        Ok(Arc::new(HttpExecutor::new(config)?))
    }
}

#[derive(Debug, Default)]
struct Exchange {
    status_code: Option<u16>,
    ttfb: Duration,
    read: Duration,
    error: Option<FailureKind>,
}

impl Exchange {
    fn failed(kind: FailureKind) -> Self {
        Self {
            error: Some(kind),
            ..Default::default()
        }
    }
}

fn build_client(config: &LoadTestConfig) -> Result<Client, HttpError> {
    let max_idle = if config.disable_keep_alive {
        0
    } else {
        config.max_idle_conns_per_host
    };

    let mut builder = Client::builder()
        .timeout(CLIENT_TIMEOUT)
        .danger_accept_invalid_certs(true)
        .pool_max_idle_per_host(max_idle)
        .gzip(!config.disable_compression)
        .default_headers(default_headers(config)?)
        .dns_resolver(Arc::new(TimedResolver))
        .connector_layer(layer_fn(TimedConnector::new));

    if !config.use_http2 {
        builder = builder.http1_only();
    }

    Ok(builder.build()?)
}

fn default_headers(config: &LoadTestConfig) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();

    if !config.accept_header.is_empty() {
        headers.insert(ACCEPT, header_value("accept", &config.accept_header)?);
    }
    if !config.user_agent.is_empty() {
        headers.insert(USER_AGENT, header_value("user-agent", &config.user_agent)?);
    }

    Ok(headers)
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
        name,
        reason: e.to_string(),
    })
}

async fn drain(response: &mut Response) -> Result<(), reqwest::Error> {
    while response.chunk().await?.is_some() {}
    Ok(())
}

fn classify(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::OsTimeout
    } else {
        FailureKind::Network
    }
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn run_once(config: &LoadTestConfig, url: &str) -> RequestOutcome {
        let target = Target::parse(url).unwrap();
        let executor = HttpExecutorFactory.build(&target, config).unwrap();
        executor
            .execute(&target, RoundContext::new(2), &CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn test_any_status_code_is_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/broken", mock_server.uri());
        let outcome = run_once(&LoadTestConfig::default(), &url).await;

        assert_eq!(outcome.status_code, Some(500));
        assert_eq!(outcome.error, None);
        assert_eq!(outcome.concurrency, 2);
        assert_eq!(outcome.target.url(), url);
        assert!(outcome.total >= outcome.phases.ttfb);
        assert!(outcome.phases.connect > Duration::ZERO);
        assert_eq!(outcome.phases.write, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_configured_method_and_headers_are_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/probe"))
            .and(header("accept", "application/json"))
            .and(header("user-agent", "ldtest-probe"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let config = LoadTestConfig {
            method: HttpMethod::Head,
            accept_header: "application/json".to_string(),
            user_agent: "ldtest-probe".to_string(),
            ..Default::default()
        };
        let outcome = run_once(&config, &format!("{}/probe", mock_server.uri())).await;

        assert_eq!(outcome.status_code, Some(204));
        assert_eq!(outcome.error, None);
    }

    #[tokio::test]
    async fn test_hostname_lookup_is_timed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let port = mock_server.address().port();
        let outcome = run_once(
            &LoadTestConfig::default(),
            &format!("http://localhost:{}/", port),
        )
        .await;

        assert_eq!(outcome.error, None);
        assert!(outcome.phases.dns > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let outcome = run_once(
            &LoadTestConfig::default(),
            &format!("http://127.0.0.1:{}/", port),
        )
        .await;

        assert_eq!(outcome.error, Some(FailureKind::Network));
        assert_eq!(outcome.status_code, None);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&mock_server)
            .await;

        let target = Target::parse(&mock_server.uri()).unwrap();
        let executor = HttpExecutor::new(&LoadTestConfig::default()).unwrap();
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let outcome = executor
            .execute(&target, RoundContext::new(1), &cancel)
            .await;

        assert_eq!(outcome.error, Some(FailureKind::DeadlineExceeded));
        assert!(outcome.total < Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_header_value_is_rejected() {
        let config = LoadTestConfig {
            user_agent: "bad\nagent".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            HttpExecutor::new(&config),
            Err(HttpError::InvalidHeader { name: "user-agent", .. })
        ));
    }

    #[test]
    fn test_method_conversion() {
        for method in HttpMethod::all() {
            assert_eq!(reqwest_method(*method).as_str(), method.as_str());
        }
    }
}
