use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::info;

use super::tracker::{RenderHandle, Tracker, RENDER_INTERVAL};
use super::{RunnerConfig, Task, TaskRunner};
use crate::common::error::GroveError;
use crate::common::result::{GroveResult, ResultExt};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// 転送バイト数と開始時刻
///
/// 書き込み側はアトミックに加算するだけで、トラッカーのロックは取らない。
#[derive(Debug, Default)]
pub struct ByteCounter {
    bytes: AtomicU64,
    started: OnceLock<Instant>,
}

impl ByteCounter {
    pub fn start(&self) {
        let _ = self.started.set(Instant::now());
    }

    pub fn is_started(&self) -> bool {
        self.started.get().is_some()
    }

    pub fn add(&self, delta: u64) {
        self.bytes.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// 開始からの平均転送速度（bytes/s）
    pub fn rate(&self) -> u64 {
        match self.started.get() {
            Some(started) => transfer_rate(self.bytes(), started.elapsed()),
            None => 0,
        }
    }
}

pub fn transfer_rate(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0;
    }
    (bytes as f64 / secs) as u64
}

/// バイト転送タスクのペイロード
pub struct BytesTask {
    source: Mutex<Option<Box<dyn Read + Send>>>,
    total: Option<u64>,
    counter: ByteCounter,
}

impl BytesTask {
    pub fn new(source: impl Read + Send + 'static, total: Option<u64>) -> Self {
        Self {
            source: Mutex::new(Some(Box::new(source))),
            total,
            counter: ByteCounter::default(),
        }
    }

    /// 転送タスクを作る
    pub fn task(name: impl Into<String>, source: impl Read + Send + 'static, total: Option<u64>) -> Task<Self> {
        Task::new(name, Self::new(source, total))
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn counter(&self) -> &ByteCounter {
        &self.counter
    }

    /// ソースを最後まで読み、`writer` に書き込む。ソースは一度しか読めない。
    pub fn copy_to(&self, writer: &mut dyn Write) -> GroveResult<u64> {
        let mut source = self
            .source
            .lock()
            .take()
            .ok_or_else(|| GroveError::internal_error("byte source was already consumed"))?;

        self.counter.start();
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut copied = 0u64;
        loop {
            let n = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            writer.write_all(&buf[..n])?;
            copied += n as u64;
            self.counter.add(n as u64);
        }
        writer.flush()?;
        Ok(copied)
    }
}

impl std::fmt::Debug for BytesTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BytesTask")
            .field("total", &self.total)
            .field("counter", &self.counter)
            .finish()
    }
}

/// 進捗バーの右側に表示するメッセージ
pub fn progress_message(task: &Task<BytesTask>) -> String {
    if task.is_done() {
        return if task.is_failed() { "failed" } else { "done" }.to_string();
    }
    let counter = task.value().counter();
    if !counter.is_started() {
        return "waiting...".to_string();
    }
    format!("{}/s", HumanBytes(counter.rate()))
}

struct BarEntry {
    task: Arc<Task<BytesTask>>,
    bar: ProgressBar,
    finished: bool,
}

/// バイト転送用の進捗表示（タスクごとの進捗バー）
pub struct BytesTracker {
    multi: MultiProgress,
    style: ProgressStyle,
    bars: Mutex<Vec<BarEntry>>,
}

impl BytesTracker {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    /// 何も描画しない（テストや非対話環境向け）
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let style = ProgressStyle::with_template(
            "{prefix:.bold} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        Self {
            multi: MultiProgress::with_draw_target(target),
            style,
            bars: Mutex::new(Vec::new()),
        }
    }

    fn tick(&self) {
        let mut bars = self.bars.lock();
        for entry in bars.iter_mut().filter(|entry| !entry.finished) {
            let counter = entry.task.value().counter();
            entry.bar.set_position(counter.bytes());
            let message = progress_message(&entry.task);
            if entry.task.is_done() {
                entry.finished = true;
                info!(
                    "{} {} ({})",
                    entry.task.name(),
                    message,
                    HumanBytes(counter.bytes())
                );
                if entry.task.is_failed() {
                    entry.bar.abandon_with_message(message);
                } else {
                    entry.bar.finish_with_message(message);
                }
            } else {
                entry.bar.set_message(message);
            }
        }
    }
}

impl Default for BytesTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker<BytesTask> for BytesTracker {
    fn render(self: Arc<Self>, _total: usize) -> RenderHandle {
        RenderHandle::spawn(RENDER_INTERVAL, move || self.tick())
    }

    fn add(&self, task: Arc<Task<BytesTask>>) {
        let length = task.value().total().unwrap_or(0);
        let bar = self.multi.add(ProgressBar::new(length));
        bar.set_style(self.style.clone());
        bar.set_prefix(task.name().to_string());
        bar.set_message(progress_message(&task));
        self.bars.lock().push(BarEntry {
            task,
            bar,
            finished: false,
        });
    }
}

/// バイト転送のバッチ
pub struct Bytes {
    config: RunnerConfig,
    tasks: Vec<Task<BytesTask>>,
    tracker: Arc<dyn Tracker<BytesTask>>,
}

impl Bytes {
    pub fn new(
        config: RunnerConfig,
        tasks: Vec<Task<BytesTask>>,
        tracker: Arc<dyn Tracker<BytesTask>>,
    ) -> Self {
        Self {
            config,
            tasks,
            tracker,
        }
    }

    /// 各タスクのソースを `<dir>/<task name>` に書き出す
    pub fn download(self, dir: &Path) -> GroveResult<()> {
        fs::create_dir_all(dir)
            .with_filesystem_error("Failed to create download directory", Some(dir.to_path_buf()))?;
        let dir = dir.to_path_buf();
        let runner = TaskRunner::new(
            self.config,
            self.tasks,
            move |task: &Task<BytesTask>| {
                let dest = destination(&dir, task.name())?;
                let mut file = File::create(&dest)
                    .with_filesystem_error("Failed to create file", Some(dest.clone()))?;
                task.value().copy_to(&mut file)?;
                Ok(())
            },
            self.tracker,
        );
        runner.run()
    }
}

fn destination(dir: &Path, name: &str) -> GroveResult<PathBuf> {
    let file_name = Path::new(name).file_name();
    if name.is_empty() || file_name.map(|f| f != name).unwrap_or(true) {
        return Err(GroveError::validation_error(
            "file name",
            "download name must be a plain file name",
            Some(name.to_string()),
        ));
    }
    Ok(dir.join(name))
}
