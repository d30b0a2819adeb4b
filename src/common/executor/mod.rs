//! Concurrent Task Runner
//!
//! 独立したタスクのリストを固定数のワーカーで並列実行する。
//! あるタスクの失敗は他のタスクに影響せず、全タスクの完了後に
//! 失敗したタスクだけを一つのログファイルにまとめて報告する。

pub mod bytes;
pub mod report;
pub mod tracker;

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::common::error::GroveError;
use crate::common::result::GroveResult;

pub use bytes::{ByteCounter, BytesTask, BytesTracker, Bytes};
pub use report::{FailedTask, FailureReport};
pub use tracker::{LineSink, LineTracker, RenderHandle, Tracker};

/// タスクの実行関数
pub type TaskAction<V> = Arc<dyn Fn(&Task<V>) -> GroveResult<()> + Send + Sync>;

/// 一回だけ実行される作業単位
pub struct Task<V> {
    name: String,
    value: V,
    action: Option<TaskAction<V>>,
    done: AtomicBool,
    failed: AtomicBool,
}

impl<V> Task<V> {
    pub fn new(name: impl Into<String>, value: V) -> Self {
        Self {
            name: name.into(),
            value,
            action: None,
            done: AtomicBool::new(false),
            failed: AtomicBool::new(false),
        }
    }

    /// Runnerのデフォルトハンドラの代わりに使う実行関数を設定する
    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Task<V>) -> GroveResult<()> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// failedを先に書くので、doneを観測した側は正しいfailedを読める
    fn finish(&self, failed: bool) {
        self.failed.store(failed, Ordering::Release);
        self.done.store(true, Ordering::Release);
    }
}

impl<V> std::fmt::Debug for Task<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("custom_action", &self.action.is_some())
            .field("done", &self.is_done())
            .field("failed", &self.is_failed())
            .finish()
    }
}

/// 失敗ログのデフォルトパス（`<temp>/grove/logs/<operation>`）
pub fn default_log_path(operation: &str) -> PathBuf {
    std::env::temp_dir()
        .join("grove")
        .join("logs")
        .join(operation)
}

/// Runner設定
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// 操作名（ログパスとエラーメッセージに使われる）
    pub operation: String,

    /// ワーカー数（0は1に補正される）
    pub workers: usize,

    /// 失敗ログの出力先。Noneの場合は `<temp>/grove/logs/<operation>`
    pub log_path: Option<PathBuf>,
}

impl RunnerConfig {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            workers: num_cpus::get(),
            log_path: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_log_path(mut self, log_path: Option<PathBuf>) -> Self {
        self.log_path = log_path;
        self
    }

    pub fn resolved_log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| default_log_path(&self.operation))
    }
}

/// タスク実行エンジン
pub struct TaskRunner<V> {
    config: RunnerConfig,
    tasks: Vec<Arc<Task<V>>>,
    handler: TaskAction<V>,
    tracker: Arc<dyn Tracker<V>>,
}

impl<V: Send + Sync + 'static> TaskRunner<V> {
    pub fn new<F>(
        config: RunnerConfig,
        tasks: Vec<Task<V>>,
        handler: F,
        tracker: Arc<dyn Tracker<V>>,
    ) -> Self
    where
        F: Fn(&Task<V>) -> GroveResult<()> + Send + Sync + 'static,
    {
        Self {
            config,
            tasks: tasks.into_iter().map(Arc::new).collect(),
            handler: Arc::new(handler),
            tracker,
        }
    }

    pub fn tasks(&self) -> &[Arc<Task<V>>] {
        &self.tasks
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn worker_count(&self) -> usize {
        let workers = if self.config.workers == 0 {
            warn!("Worker count must be at least 1, using 1");
            1
        } else {
            self.config.workers
        };
        workers.min(self.tasks.len()).max(1)
    }

    /// 全タスクを実行する
    ///
    /// 全タスクが完了するまで戻らない。失敗したタスクがあれば失敗ログを
    /// 書き出し、件数とログパスを持つ `TaskFailures` を返す。
    pub fn run(&self) -> GroveResult<()> {
        let total = self.tasks.len();
        if total == 0 {
            debug!("{}: nothing to do", self.config.operation);
            return Ok(());
        }
        let workers = self.worker_count();
        info!(
            "{}: running {} task(s) with {} worker(s)",
            self.config.operation, total, workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("grove-worker-{i}"))
            .build()
            .map_err(|e| GroveError::internal_error_with_source("Failed to start worker pool", e))?;

        let (task_tx, task_rx) = crossbeam_channel::bounded::<Arc<Task<V>>>(total);
        for task in &self.tasks {
            task_tx
                .send(Arc::clone(task))
                .map_err(|_| GroveError::internal_error("Task queue closed unexpectedly"))?;
        }
        drop(task_tx);

        let (err_tx, err_rx) = crossbeam_channel::unbounded::<FailedTask>();
        let render = Arc::clone(&self.tracker).render(total);

        pool.scope(|scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let err_tx = err_tx.clone();
                scope.spawn(move |_| {
                    for task in task_rx.iter() {
                        self.execute(&task, &err_tx);
                    }
                });
            }
        });
        drop(err_tx);
        render.stop();

        let failures: Vec<FailedTask> = err_rx.try_iter().collect();
        if failures.is_empty() {
            info!("{}: all {} task(s) done", self.config.operation, total);
            return Ok(());
        }

        let log_path = self.config.resolved_log_path();
        let failed = failures.len();
        FailureReport::new(failures).write(&log_path)?;
        Err(GroveError::task_failures(
            &self.config.operation,
            failed,
            log_path,
        ))
    }

    fn execute(&self, task: &Arc<Task<V>>, errors: &crossbeam_channel::Sender<FailedTask>) {
        self.tracker.add(Arc::clone(task));

        let action = task.action.as_ref().unwrap_or(&self.handler);
        let task_ref: &Task<V> = task;
        let result = panic::catch_unwind(AssertUnwindSafe(|| action(task_ref)))
            .unwrap_or_else(|payload| Err(GroveError::internal_error(panic_message(&*payload))));

        match result {
            Ok(()) => task.finish(false),
            Err(error) => {
                // 進捗表示中はstderrにwarnを書かない
                debug!("{} {} failed: {}", self.config.operation, task.name(), error);
                task.finish(true);
                // 受信側はrun()が保持しているので送信は失敗しない
                let _ = errors.send(FailedTask::new(task.name(), error));
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("task panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("task panicked: {message}")
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tempfile::TempDir;

    struct SilentTracker;

    impl<V: Send + Sync + 'static> Tracker<V> for SilentTracker {
        fn render(self: Arc<Self>, _total: usize) -> RenderHandle {
            RenderHandle::noop()
        }

        fn add(&self, _task: Arc<Task<V>>) {}
    }

    fn runner(
        dir: &TempDir,
        workers: usize,
        tasks: Vec<Task<usize>>,
    ) -> TaskRunner<usize> {
        let config = RunnerConfig::new("test")
            .with_workers(workers)
            .with_log_path(Some(dir.path().join("failures.log")));
        TaskRunner::new(
            config,
            tasks,
            |task: &Task<usize>| {
                if task.value() % 2 == 1 {
                    Err(GroveError::internal_error(format!("odd {}", task.value())))
                } else {
                    Ok(())
                }
            },
            Arc::new(SilentTracker),
        )
    }

    #[test]
    fn test_default_log_path() {
        let config = RunnerConfig::new("sync");
        assert_eq!(
            config.resolved_log_path(),
            std::env::temp_dir().join("grove/logs/sync")
        );

        let config = config.with_log_path(Some(PathBuf::from("/var/log/grove-sync")));
        assert_eq!(config.resolved_log_path(), PathBuf::from("/var/log/grove-sync"));
    }

    #[test]
    fn test_failures_use_default_log_path() {
        let operation = format!("runner-test-{}", std::process::id());
        let config = RunnerConfig::new(&operation).with_workers(2);
        let runner = TaskRunner::new(
            config,
            vec![Task::new("ok", 0), Task::new("bad", 1)],
            |task: &Task<usize>| match task.value() {
                0 => Ok(()),
                _ => Err(GroveError::internal_error("bad value")),
            },
            Arc::new(SilentTracker),
        );

        let err = runner.run().unwrap_err();
        let expected = default_log_path(&operation);
        match err {
            GroveError::TaskFailures { ref log_path, .. } => assert_eq!(log_path, &expected),
            other => panic!("unexpected error: {other}"),
        }
        let log = std::fs::read_to_string(&expected).unwrap();
        assert!(log.starts_with("=> handle bad failed: Internal error: bad value"));
        std::fs::remove_file(&expected).unwrap();
    }

    #[test]
    fn test_empty_run() {
        let dir = TempDir::new().unwrap();
        assert!(runner(&dir, 4, Vec::new()).run().is_ok());
        assert!(!dir.path().join("failures.log").exists());
    }

    #[test]
    fn test_all_tasks_finish_and_failures_are_counted() {
        let dir = TempDir::new().unwrap();
        let tasks = (0..6).map(|i| Task::new(format!("t{i}"), i)).collect();
        let runner = runner(&dir, 3, tasks);

        let err = runner.run().unwrap_err();
        assert!(matches!(err, GroveError::TaskFailures { failed: 3, .. }));
        assert!(runner.tasks().iter().all(|t| t.is_done()));
        let failed: Vec<&str> = runner
            .tasks()
            .iter()
            .filter(|t| t.is_failed())
            .map(|t| t.name())
            .collect();
        assert_eq!(failed, vec!["t1", "t3", "t5"]);
    }

    #[test]
    fn test_zero_workers_is_corrected() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![Task::new("a", 0), Task::new("b", 2)];
        let runner = runner(&dir, 0, tasks);
        assert!(runner.run().is_ok());
        assert!(runner.tasks().iter().all(|t| t.is_done() && !t.is_failed()));
    }

    #[test]
    fn test_custom_action_overrides_handler() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![
            Task::new("odd-but-ok", 1).with_action(|_| Ok(())),
            Task::new("even-but-failing", 2)
                .with_action(|_| Err(GroveError::internal_error("custom"))),
        ];
        let runner = runner(&dir, 2, tasks);
        let err = runner.run().unwrap_err();
        assert!(matches!(err, GroveError::TaskFailures { failed: 1, .. }));
        assert!(!runner.tasks()[0].is_failed());
        assert!(runner.tasks()[1].is_failed());
    }

    #[test]
    fn test_panicking_task_is_isolated() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![
            Task::new("panics", 0).with_action(|_| panic!("boom")),
            Task::new("fine", 2),
        ];
        let runner = runner(&dir, 1, tasks);
        let err = runner.run().unwrap_err();
        assert!(matches!(err, GroveError::TaskFailures { failed: 1, .. }));
        assert!(runner.tasks()[1].is_done());

        let log = std::fs::read_to_string(dir.path().join("failures.log")).unwrap();
        assert!(log.contains("task panicked: boom"));
    }

    #[test]
    fn test_concurrency_is_bounded() {
        let dir = TempDir::new().unwrap();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..12)
            .map(|i| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                Task::new(format!("t{i}"), 0).with_action(move |_| {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        runner(&dir, 3, tasks).run().unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
