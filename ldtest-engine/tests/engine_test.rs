//! Engine tests against scripted executors

use ldtest_core::{
    FailureKind, LoadTestConfig, PhaseTimings, RequestOutcome, Target, TargetStats,
};
use ldtest_engine::{Engine, EngineError, GeneratorExit, RunObserver};
use ldtest_http::{ExecutorFactory, HttpError, RequestExecutor, RoundContext};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a scripted target answers
#[derive(Clone, Copy)]
enum Script {
    /// Always succeed quickly; cancel the run on the given call
    SucceedThenCancel { cancel_on_call: usize },
    /// Always succeed after a short sleep
    Succeed,
    /// Fail every request
    Fail,
    /// Time out on the given call, succeed on every other
    TimeoutOnCall { call: usize },
}

struct ScriptedExecutor {
    script: Script,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        target: &Target,
        round: RoundContext,
        cancel: &CancellationToken,
    ) -> RequestOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let error = match self.script {
            Script::SucceedThenCancel { cancel_on_call } => {
                if call == cancel_on_call {
                    cancel.cancel();
                }
                None
            }
            Script::Succeed => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                None
            }
            Script::Fail => Some(FailureKind::Network),
            Script::TimeoutOnCall { call: failing } => {
                (call == failing).then_some(FailureKind::DeadlineExceeded)
            }
        };

        RequestOutcome {
            target: target.clone(),
            round_offset: Duration::ZERO,
            status_code: error.is_none().then_some(200),
            total: Duration::from_millis(5),
            phases: PhaseTimings::default(),
            error,
            concurrency: round.concurrency,
        }
    }
}

#[derive(Default)]
struct ScriptedFactory {
    scripts: HashMap<String, Script>,
    built: AtomicUsize,
}

impl ScriptedFactory {
    fn with(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }
}

impl ExecutorFactory for ScriptedFactory {
    fn build(
        &self,
        target: &Target,
        _config: &LoadTestConfig,
    ) -> Result<Arc<dyn RequestExecutor>, HttpError> {
        self.built.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .get(target.url())
            .copied()
            .unwrap_or(Script::Fail);
        Ok(Arc::new(ScriptedExecutor {
            script,
            calls: AtomicUsize::new(0),
        }))
    }
}

struct FailingFactory;

impl ExecutorFactory for FailingFactory {
    fn build(
        &self,
        _target: &Target,
        _config: &LoadTestConfig,
    ) -> Result<Arc<dyn RequestExecutor>, HttpError> {
        Err(HttpError::InvalidHeader {
            name: "user-agent",
            reason: "bad".to_string(),
        })
    }
}

#[derive(Default)]
struct RecordingObserver {
    rounds: Mutex<Vec<usize>>,
    finished: AtomicUsize,
}

impl RunObserver for RecordingObserver {
    fn round_started(&self, _target: &Target, concurrency: usize) {
        self.rounds.lock().push(concurrency);
    }

    fn generator_finished(&self, _report: &ldtest_engine::GeneratorReport) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

fn target(url: &str) -> Target {
    Target::parse(url).unwrap()
}

#[tokio::test]
async fn test_all_success_rounds_add_up() {
    let url = "http://healthy.test/";
    let factory = ScriptedFactory::default().with(url, Script::SucceedThenCancel { cancel_on_call: 9 });
    let observer = Arc::new(RecordingObserver::default());
    let engine = Engine::new(LoadTestConfig::default(), Arc::new(factory))
        .with_observer(observer.clone());

    let cancel = CancellationToken::new();
    let report = engine.run(&[target(url)], &cancel).await.unwrap();

    // Rounds of 2, 3 and 4 requests, cancelled on the ninth
    let stats = report.stats[&target(url)];
    assert_eq!(stats.total_requests, 9);
    assert_eq!(stats.recommended_concurrency, 9);
    assert_eq!(stats.error_requests, 0);
    assert_eq!(*observer.rounds.lock(), vec![2, 3, 4]);
    assert_eq!(observer.finished.load(Ordering::SeqCst), 1);

    assert_eq!(report.generators.len(), 1);
    assert_eq!(report.generators[0].exit, GeneratorExit::Cancelled);
    assert_eq!(report.generators[0].rounds, 3);
    assert!(report.was_cancelled());
}

#[tokio::test]
async fn test_failing_target_throttles_on_first_round() {
    let url = "http://broken.test/";
    let factory = ScriptedFactory::default().with(url, Script::Fail);
    let engine = Engine::new(LoadTestConfig::default(), Arc::new(factory));

    let report = engine
        .run(&[target(url)], &CancellationToken::new())
        .await
        .unwrap();

    let stats = report.stats[&target(url)];
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.error_requests, 2);
    assert_eq!(stats.recommended_concurrency, 0);
    assert_eq!(stats.max_latency_seconds, 0.0);

    assert_eq!(report.throttles[url], 2);
    assert_eq!(
        report.generators[0].exit,
        GeneratorExit::Throttled { level: 2 }
    );
    assert_eq!(report.generators[0].rounds, 1);
    assert!(!report.was_cancelled());
}

#[tokio::test]
async fn test_single_timeout_throttles_on_first_round() {
    let url = "http://flaky.test/";
    let factory = ScriptedFactory::default().with(url, Script::TimeoutOnCall { call: 2 });
    let observer = Arc::new(RecordingObserver::default());
    let engine = Engine::new(LoadTestConfig::default(), Arc::new(factory))
        .with_observer(observer.clone());

    let report = engine
        .run(&[target(url)], &CancellationToken::new())
        .await
        .unwrap();

    let stats = report.stats[&target(url)];
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.error_requests, 1);
    assert!(stats.recommended_concurrency <= 1);

    assert_eq!(report.throttles[url], 2);
    assert_eq!(*observer.rounds.lock(), vec![2]);
    assert_eq!(report.generators[0].rounds, 1);
    assert_eq!(report.generators[0].last_concurrency, 2);
}

#[tokio::test(start_paused = true)]
async fn test_targets_are_independent() {
    let healthy = "http://healthy.test/";
    let broken = "http://broken.test/";
    let factory = ScriptedFactory::default()
        .with(healthy, Script::Succeed)
        .with(broken, Script::Fail);
    let engine = Engine::new(LoadTestConfig::default(), Arc::new(factory));

    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        deadline.cancel();
    });

    let report = engine
        .run(&[target(healthy), target(broken)], &cancel)
        .await
        .unwrap();

    let healthy_stats = report.stats[&target(healthy)];
    assert!(healthy_stats.total_requests > 0);
    assert_eq!(
        healthy_stats.recommended_concurrency,
        healthy_stats.total_requests
    );
    assert_eq!(report.stats[&target(broken)].error_requests, 2);

    assert!(!report.throttles.contains_key(healthy));
    assert_eq!(report.throttles[broken], 2);
}

#[tokio::test]
async fn test_duplicate_targets_run_once() {
    let url = "http://broken.test/";
    let factory = Arc::new(ScriptedFactory::default().with(url, Script::Fail));
    let engine = Engine::new(LoadTestConfig::default(), factory.clone());

    let report = engine
        .run(&[target(url), target(url)], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(factory.built.load(Ordering::SeqCst), 1);
    assert_eq!(report.stats.len(), 1);
    assert_eq!(report.stats[&target(url)].total_requests, 2);
}

#[tokio::test]
async fn test_pre_cancelled_run_reports_empty_stats() {
    let url = "http://healthy.test/";
    let factory = ScriptedFactory::default().with(url, Script::Succeed);
    let engine = Engine::new(LoadTestConfig::default(), Arc::new(factory));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = engine.run(&[target(url)], &cancel).await.unwrap();

    assert_eq!(report.stats[&target(url)], TargetStats::default());
    assert_eq!(report.generators[0].rounds, 0);
    assert!(report.was_cancelled());
}

#[tokio::test]
async fn test_empty_target_list_returns_immediately() {
    let engine = Engine::new(LoadTestConfig::default(), Arc::new(FailingFactory));
    let report = engine.run(&[], &CancellationToken::new()).await.unwrap();

    assert!(report.stats.is_empty());
    assert!(report.generators.is_empty());
}

#[tokio::test]
async fn test_executor_build_failure_aborts_run() {
    let engine = Engine::new(LoadTestConfig::default(), Arc::new(FailingFactory));
    let err = engine
        .run(&[target("http://a.test/")], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Executor { ref url, .. } if url == "http://a.test/"));
}
