//! Monitor: scan -> accumulate -> flush -> workflow loop

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use eyre::{Context, Result, eyre};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::scanner::PollingScanner;
use crate::accumulator::{ChangeAccumulator, FileRecord, IgnoreSet};
use crate::context::AppContext;
use crate::domain::{ChangeEvent, WorkflowResult};
use crate::error::WorkflowError;
use crate::vcs::{CommandRunner, install_hooks};
use crate::workflow::WorkflowEngine;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Long-running loop that turns file changes into pull requests
///
/// The accumulator sits behind one mutex shared by the event consumer and
/// the flush poll. Batches are taken under the lock and processed after it
/// is released.
pub struct Monitor {
    ctx: Arc<AppContext>,
    engine: WorkflowEngine,
    accumulator: Arc<Mutex<ChangeAccumulator>>,
    ignore: IgnoreSet,
}

impl Monitor {
    pub fn new(ctx: Arc<AppContext>, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let watch = &ctx.config().monitor;
        debug!(?watch, "Monitor::new: called");

        let ignore = IgnoreSet::new(&watch.ignore_patterns)?;
        let state_file = watch.state_file();
        let record = FileRecord::load(&state_file)
            .context(format!("Failed to load file hashes from {}", state_file.display()))?;

        let accumulator = ChangeAccumulator::new(ctx.repo_path(), ignore.clone(), record);
        let engine = WorkflowEngine::new(ctx.clone(), runner);

        Ok(Self {
            ctx,
            engine,
            accumulator: Arc::new(Mutex::new(accumulator)),
            ignore,
        })
    }

    /// Shared handle to the accumulator
    pub fn accumulator(&self) -> Arc<Mutex<ChangeAccumulator>> {
        self.accumulator.clone()
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Take whatever batches are due at `now` and run each through the engine
    ///
    /// Batch failures are logged and returned, never raised.
    pub async fn flush_once(&mut self, now: DateTime<Utc>) -> Vec<WorkflowResult> {
        let requests = {
            let mut acc = self.accumulator.lock().await;
            acc.flush(now, self.ctx.config().monitor.quiescence())
        };

        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self
                .engine
                .process_update(&request.category, &request.paths, &request.description)
                .await;
            match (&result.pr_url, result.error_message()) {
                (Some(url), _) => info!(category = %request.category, %url, "Update published"),
                (None, Some(err)) => warn!(category = %request.category, error = %err, "Update failed"),
                (None, None) => warn!(category = %request.category, "Update finished without a pull request"),
            }
            results.push(result);
        }
        results
    }

    /// Run until `shutdown` resolves or the event source dies
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let config = self.ctx.config().clone();
        let repo_path = self.ctx.repo_path().to_path_buf();
        info!(
            repo = %repo_path.display(),
            poll_interval_secs = config.monitor.poll_interval_secs,
            quiescence_secs = config.monitor.quiescence_secs,
            "Monitor started"
        );

        match self.engine.initialize_repository(&repo_path).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() || matches!(e, WorkflowError::Clone(_)) => {
                return Err(e).context("Failed to initialize repository");
            }
            Err(e) => warn!(error = %e, "Repository guard failed at startup, will retry per update"),
        }

        if config.monitor.install_hooks {
            match install_hooks(&repo_path, self.ctx.protected_branches()) {
                Ok(installed) => debug!(?installed, "Monitor::run: hooks processed"),
                Err(e) => warn!(error = %e, "Failed to install git hooks"),
            }
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let scanner = PollingScanner::new(repo_path, self.ignore.clone());
        let scan_task = spawn_scanner(scanner, config.monitor.poll_interval(), tx);
        let mut consume_task = spawn_consumer(self.accumulator.clone(), rx);

        let mut flush_tick = tokio::time::interval(config.monitor.poll_interval());
        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                _ = flush_tick.tick() => {
                    let results = self.flush_once(Utc::now()).await;
                    if !results.is_empty() {
                        debug!(batches = results.len(), "Monitor::run: flush processed");
                    }
                }
                joined = &mut consume_task => {
                    error!(?joined, "Event source stopped");
                    break Err(eyre!("event source stopped"));
                }
            }
        };

        scan_task.abort();
        consume_task.abort();
        self.accumulator.lock().await.persist();
        info!("Monitor stopped");
        outcome
    }
}

fn spawn_scanner(
    mut scanner: PollingScanner,
    interval: std::time::Duration,
    tx: mpsc::Sender<ChangeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        loop {
            tick.tick().await;
            let scanned = tokio::task::spawn_blocking(move || {
                let events = scanner.scan();
                (scanner, events)
            })
            .await;

            let events = match scanned {
                Ok((returned, events)) => {
                    scanner = returned;
                    events
                }
                Err(e) => {
                    error!(error = %e, "Filesystem scan panicked");
                    return;
                }
            };

            for event in events {
                if tx.send(event).await.is_err() {
                    debug!("spawn_scanner: receiver dropped");
                    return;
                }
            }
        }
    })
}

fn spawn_consumer(accumulator: Arc<Mutex<ChangeAccumulator>>, mut rx: mpsc::Receiver<ChangeEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            accumulator.lock().await.on_event(&event);
        }
        debug!("spawn_consumer: channel closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::{Category, WorkflowStatus};
    use crate::vcs::fake::ScriptedRunner;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn monitor(repo: &TempDir, state: &TempDir, runner: Arc<ScriptedRunner>) -> Monitor {
        let mut config = Config::default();
        config.monitor.state_file = Some(state.path().join("file_hashes.json"));
        config.monitor.install_hooks = false;
        config.monitor.poll_interval_secs = 1;
        let ctx = Arc::new(AppContext::new(config, Some(repo.path().to_path_buf())).unwrap());
        Monitor::new(ctx, runner).unwrap()
    }

    #[tokio::test]
    async fn test_flush_once_runs_each_batch() {
        let repo = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::on_branch("main"));
        let mut monitor = monitor(&repo, &state, runner.clone());

        fs::create_dir_all(repo.path().join("docs")).unwrap();
        for (rel, body) in [("docs/README.md", "# Hi"), ("a.yaml", "a: 1"), ("b.json", "{}")] {
            fs::write(repo.path().join(rel), body).unwrap();
            let mut acc = monitor.accumulator.lock().await;
            acc.on_event(&ChangeEvent::modified(repo.path().join(rel)));
        }

        let results = monitor.flush_once(Utc::now()).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status == WorkflowStatus::Success));
        assert_eq!(results[0].commit_type, "docs");
        assert_eq!(results[1].commit_type, "config");
        assert!(runner.commits_on().iter().all(|b| b != "main"));

        // The record was persisted by the flush
        let saved = FileRecord::load(state.path().join("file_hashes.json")).unwrap();
        assert_eq!(saved.len(), 3);
    }

    #[tokio::test]
    async fn test_flush_once_inside_window_is_empty() {
        let repo = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::on_branch("feature/x"));
        let mut monitor = monitor(&repo, &state, runner.clone());

        let now = Utc::now();
        assert!(monitor.flush_once(now).await.is_empty());

        fs::write(repo.path().join("c.txt"), "c").unwrap();
        monitor
            .accumulator()
            .lock()
            .await
            .on_event(&ChangeEvent::created(repo.path().join("c.txt")));

        assert!(monitor.flush_once(now + chrono::TimeDelta::seconds(5)).await.is_empty());
        assert_eq!(monitor.accumulator().lock().await.pending(Category::Feature), vec!["c.txt"]);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_does_not_stop_flush() {
        let repo = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::on_branch("feature/x").failing("git push"));
        let mut monitor = monitor(&repo, &state, runner.clone());

        for rel in ["a.yaml", "c.txt"] {
            fs::write(repo.path().join(rel), rel).unwrap();
            monitor
                .accumulator()
                .lock()
                .await
                .on_event(&ChangeEvent::modified(repo.path().join(rel)));
        }

        let results = monitor.flush_once(Utc::now()).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status == WorkflowStatus::Failed));
        assert_eq!(runner.commits_on().len(), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_and_persists() {
        let repo = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::on_branch("feature/x"));
        let monitor = monitor(&repo, &state, runner);

        monitor
            .run(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();
        assert!(state.path().join("file_hashes.json").exists());
    }

    #[tokio::test]
    async fn test_run_turns_new_file_into_commit() {
        let repo = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let runner = Arc::new(ScriptedRunner::on_branch("main"));

        let mut config = Config::default();
        config.monitor.state_file = Some(state.path().join("file_hashes.json"));
        config.monitor.install_hooks = false;
        config.monitor.poll_interval_secs = 1;
        config.monitor.quiescence_secs = 0;
        let ctx = Arc::new(AppContext::new(config, Some(repo.path().to_path_buf())).unwrap());
        let monitor = Monitor::new(ctx, runner.clone()).unwrap();

        // Written after the baseline scan, picked up by the next one
        let target = repo.path().join("notes.txt");
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            fs::write(target, "remember the milk").unwrap();
        });

        monitor
            .run(tokio::time::sleep(Duration::from_millis(3500)))
            .await
            .unwrap();
        writer.await.unwrap();

        let commits = runner.commits_on();
        assert_eq!(commits.len(), 1, "calls: {:?}", runner.calls());
        assert!(commits[0].starts_with("feature/"), "got {}", commits[0]);
        assert!(runner.calls().contains(&"git add -- notes.txt".to_string()));
        assert!(runner.pushes_of().iter().all(|b| b != "main"));

        let saved = FileRecord::load(state.path().join("file_hashes.json")).unwrap();
        assert!(saved.get("notes.txt").is_some());
    }
}
