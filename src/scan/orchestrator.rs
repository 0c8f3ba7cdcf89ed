//! Scan orchestrator
//! One task per target on a semaphore-bounded pool; outcomes stream back over a channel

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::classifier::Classifier;
use super::error_class::ErrorCategory;
use super::model::{ScanError, ScanOutcome, ScanReport, ScanResult};
use super::progress::{Progress, ProgressTracker};
use super::target::normalize_target;
use crate::config::ScanConfig;
use crate::net::{FetchRequest, Fetcher};

/// Receives outcomes in completion order, on the orchestrator's task
pub trait ScanObserver: Send + Sync {
    fn on_result(&self, _progress: Progress, _result: &ScanResult) {}
    fn on_error(&self, _progress: Progress, _error: &ScanError) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

pub struct ScanOrchestrator {
    fetcher: Fetcher,
    classifier: Arc<dyn Classifier>,
    config: ScanConfig,
}

impl ScanOrchestrator {
    pub fn new(fetcher: Fetcher, classifier: Arc<dyn Classifier>, config: ScanConfig) -> Self {
        Self { fetcher, classifier, config }
    }

    /// Scan every target with at most `concurrency` fetches in flight.
    ///
    /// A permit is taken before each task is spawned, so dispatch follows
    /// input order while completions arrive in any order. The observer sees
    /// each outcome as it completes, with the progress count taken at that
    /// moment.
    ///
    /// # Parameters
    /// - `targets`: raw targets, normalized to `https://` when no scheme is given
    /// - `observer`: receives every outcome, on the calling task
    ///
    /// # Returns
    /// Exactly one result or error per target, including targets whose task
    /// panicked
    pub async fn run(&self, targets: &[String], observer: &dyn ScanObserver) -> ScanReport {
        let tracker = Arc::new(ProgressTracker::new(targets.len()));
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let (tx, mut rx) = mpsc::unbounded_channel::<(Progress, ScanOutcome)>();

        let dispatch = async {
            let tx = tx;
            let mut handles: Vec<(String, JoinHandle<()>)> = Vec::with_capacity(targets.len());

            for (index, target) in targets.iter().enumerate() {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("semaphore should not be closed");

                let user_agent = self.config.user_agent.select(index);
                let fetcher = self.fetcher.clone();
                let classifier = self.classifier.clone();
                let config = self.config.clone();
                let tracker = tracker.clone();
                let tx = tx.clone();
                let task_target = target.clone();

                let handle = tokio::spawn(async move {
                    let outcome = scan_target(&fetcher, classifier, &config, &task_target, user_agent).await;
                    drop(permit);
                    let progress = tracker.advance();
                    // Receiver lives until every sender is gone
                    let _ = tx.send((progress, outcome));
                });
                handles.push((target.clone(), handle));
            }

            handles
        };

        let collect = async {
            let mut report = ScanReport::default();
            while let Some((progress, outcome)) = rx.recv().await {
                notify(observer, progress, &outcome);
                report.push(outcome);
            }
            report
        };

        let (handles, mut report) = tokio::join!(dispatch, collect);

        // Panicked tasks never send
        for (target, handle) in handles {
            if let Err(e) = handle.await {
                warn!("scan task for {} failed: {}", target, e);
                let category = ErrorCategory::from_message(&format!("scan task failed: {}", e));
                let outcome = ScanOutcome::Failure(ScanError::new(target, category));
                notify(observer, tracker.advance(), &outcome);
                report.push(outcome);
            }
        }

        debug!("scan finished: {} results, {} errors", report.results.len(), report.errors.len());
        report
    }
}

fn notify(observer: &dyn ScanObserver, progress: Progress, outcome: &ScanOutcome) {
    match outcome {
        ScanOutcome::Success(result) => observer.on_result(progress, result),
        ScanOutcome::Failure(error) => observer.on_error(progress, error),
    }
}

/// Fetch then classify a single target; every failure becomes a `ScanError`
async fn scan_target(
    fetcher: &Fetcher,
    classifier: Arc<dyn Classifier>,
    config: &ScanConfig,
    target: &str,
    user_agent: &'static str,
) -> ScanOutcome {
    let url = normalize_target(target);
    let failure = |category: ErrorCategory| ScanOutcome::Failure(ScanError::new(target, category));

    let request = match FetchRequest::new(&url, user_agent, config.timeout, config.tls_verify, config.retries) {
        Ok(request) => request,
        Err(e) => return failure(ErrorCategory::from(&e)),
    };

    let page = match fetcher.fetch(request).await {
        Ok(page) => page,
        Err(e) => {
            debug!("{} failed: {}", target, e);
            return failure(ErrorCategory::from(&e));
        }
    };

    let final_url = page.final_url.clone();
    // Regex matching is CPU bound
    let classified = tokio::task::spawn_blocking(move || classifier.classify(&page)).await;

    match classified {
        Ok(Ok(technologies)) => ScanOutcome::Success(ScanResult { url, final_url, technologies }),
        Ok(Err(e)) => failure(ErrorCategory::from(&e)),
        Err(e) => failure(ErrorCategory::from_message(&format!("classifier failed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::error::{RsaResult, RsapplyzerError};
    use crate::net::testing::{page, ScriptedTransport, StaticResolver};
    use crate::net::{FetchedPage, HttpTransport, TransportError, USER_AGENTS};
    use crate::rule::{TechnologyMap, TechnologyMatch};

    /// Finds "Marker" when the body mentions it, rejects bodies saying "garbage"
    struct MarkerClassifier;

    impl Classifier for MarkerClassifier {
        fn classify(&self, page: &FetchedPage) -> RsaResult<TechnologyMap> {
            if page.body.contains("garbage") {
                return Err(RsapplyzerError::ClassifyError("unparseable page".to_string()));
            }
            if page.body.contains("panic") {
                panic!("classifier bug");
            }
            let mut technologies = TechnologyMap::new();
            if page.body.contains("marker") {
                technologies.insert("Marker".to_string(), TechnologyMatch::from_name("Marker"));
            }
            Ok(technologies)
        }
    }

    #[derive(Default)]
    struct Recorder {
        progress: Mutex<Vec<Progress>>,
    }

    impl ScanObserver for Recorder {
        fn on_result(&self, progress: Progress, _result: &ScanResult) {
            self.progress.lock().unwrap().push(progress);
        }
        fn on_error(&self, progress: Progress, _error: &ScanError) {
            self.progress.lock().unwrap().push(progress);
        }
    }

    fn orchestrator(transport: Arc<dyn HttpTransport>, resolver: StaticResolver, config: ScanConfig) -> ScanOrchestrator {
        let fetcher = Fetcher::new(transport, Arc::new(resolver), config.backoff_base);
        ScanOrchestrator::new(fetcher, Arc::new(MarkerClassifier), config)
    }

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_batch_scenario() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .on("https://good.example/", vec![Ok(page("https://good.example/", "<p>marker</p>"))])
                .on("https://timeout.example/", vec![Err(TransportError::Timeout)]),
        );
        let scanner = orchestrator(transport.clone(), StaticResolver::unresolvable(["nodns.invalid"]), ScanConfig::default());

        let report = scanner
            .run(&targets(&["good.example", "timeout.example", "nodns.invalid"]), &NoopObserver)
            .await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].url, "https://good.example");
        assert!(report.results[0].technologies.contains_key("Marker"));

        let errors: HashSet<(String, ErrorCategory)> =
            report.errors.iter().map(|e| (e.target.clone(), e.category.clone())).collect();
        assert_eq!(
            errors,
            HashSet::from([
                ("nodns.invalid".to_string(), ErrorCategory::DnsFailure),
                ("timeout.example".to_string(), ErrorCategory::Timeout),
            ])
        );

        let urls = transport.requested_urls();
        assert_eq!(urls.iter().filter(|u| u.contains("timeout.example")).count(), 3);
        assert!(!urls.iter().any(|u| u.contains("nodns.invalid")));
    }

    #[tokio::test]
    async fn test_every_target_reported_once_with_permuted_progress() {
        let mut transport = ScriptedTransport::new();
        let mut names = Vec::new();
        for i in 0..20 {
            let host = format!("site{}.example", i);
            let url = format!("https://{}/", host);
            let body = match i % 4 {
                0 => "garbage",
                1 => "panic",
                _ => "marker",
            };
            transport = transport.on(&url, vec![Ok(page(&url, body))]);
            names.push(host);
        }
        let scanner = orchestrator(Arc::new(transport), StaticResolver::default(), ScanConfig::default());
        let recorder = Recorder::default();

        let report = scanner.run(&names, &recorder).await;

        assert_eq!(report.total(), 20);
        assert_eq!(report.results.len(), 10);
        assert_eq!(report.errors.len(), 10);

        let mut seen: Vec<String> = report.results.iter().map(|r| r.url.trim_start_matches("https://").to_string()).collect();
        seen.extend(report.errors.iter().map(|e| e.target.clone()));
        seen.sort();
        let mut expected = names.clone();
        expected.sort();
        assert_eq!(seen, expected);

        let mut done: Vec<usize> = recorder.progress.lock().unwrap().iter().map(|p| p.done).collect();
        assert!(recorder.progress.lock().unwrap().iter().all(|p| p.total == 20));
        done.sort_unstable();
        assert_eq!(done, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_user_agents_follow_dispatch_index() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .on("https://a.example/", vec![Ok(page("https://a.example/", ""))])
                .on("https://b.example/", vec![Ok(page("https://b.example/", ""))]),
        );
        let config = crate::config::ConfigManager::custom().concurrency(1).build();
        let scanner = orchestrator(transport.clone(), StaticResolver::default(), config);

        scanner.run(&targets(&["a.example", "b.example"]), &NoopObserver).await;

        let agents: Vec<String> = transport
            .requests()
            .iter()
            .map(|r| r.headers["user-agent"].to_str().unwrap().to_string())
            .collect();
        assert_eq!(agents, vec![USER_AGENTS[0].to_string(), USER_AGENTS[1].to_string()]);
    }

    /// Counts requests in flight
    #[derive(Default)]
    struct GaugeTransport {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl HttpTransport for GaugeTransport {
        async fn get(&self, request: &crate::net::FetchRequest) -> Result<FetchedPage, TransportError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(page(request.url.as_str(), ""))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_never_exceeds_concurrency() {
        let transport = Arc::new(GaugeTransport::default());
        let config = crate::config::ConfigManager::custom().concurrency(3).build();
        let scanner = orchestrator(transport.clone(), StaticResolver::default(), config);
        let names: Vec<String> = (0..12).map(|i| format!("host{}.example", i)).collect();

        let report = scanner.run(&names, &NoopObserver).await;

        assert_eq!(report.results.len(), 12);
        assert!(transport.peak.load(Ordering::SeqCst) <= 3);
        assert!(transport.peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let scanner = orchestrator(Arc::new(ScriptedTransport::new()), StaticResolver::default(), ScanConfig::default());
        let report = scanner.run(&[], &NoopObserver).await;
        assert_eq!(report.total(), 0);
    }
}
