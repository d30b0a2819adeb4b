use console::{style, Term};
use crossbeam_channel::{RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::Task;

/// 描画間隔
pub const RENDER_INTERVAL: Duration = Duration::from_millis(250);

/// 進捗表示のストラテジ
///
/// `render` は周期的な再描画を開始し、停止用のハンドルを返す。
/// `add` はワーカーがタスクを実行し始める直前に呼ばれる。
pub trait Tracker<V>: Send + Sync {
    fn render(self: Arc<Self>, total: usize) -> RenderHandle;

    fn add(&self, task: Arc<Task<V>>);
}

/// 描画スレッドのハンドル
///
/// `stop()` またはdropで描画スレッドに停止を通知し、最後の一回の描画が
/// 終わるまで待つ。
pub struct RenderHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RenderHandle {
    /// `interval` ごとに `tick` を呼ぶスレッドを起動する。停止時にもう一度呼ばれる。
    pub fn spawn<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let spawned = thread::Builder::new()
            .name("grove-render".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => tick(),
                    _ => {
                        tick();
                        break;
                    }
                }
            });

        match spawned {
            Ok(thread) => Self {
                stop_tx: Some(stop_tx),
                thread: Some(thread),
            },
            Err(e) => {
                warn!("Failed to start progress renderer: {}", e);
                Self::noop()
            }
        }
    }

    /// 何も描画しないハンドル
    pub fn noop() -> Self {
        Self {
            stop_tx: None,
            thread: None,
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop_tx.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Progress renderer panicked");
            }
        }
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// 一回の描画で出力される行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameLine {
    Completed {
        index: usize,
        total: usize,
        name: String,
        failed: bool,
    },
    Running {
        verb: String,
        name: String,
    },
}

impl FrameLine {
    fn styled(&self) -> String {
        match self {
            FrameLine::Completed {
                index,
                total,
                name,
                failed: false,
            } => format!("{} {} done", style(counter(*index, *total)).bold(), name),
            FrameLine::Completed { failed: true, .. } => style(self.to_string()).red().to_string(),
            FrameLine::Running { verb, name } => format!("{} {}", style(verb).yellow(), name),
        }
    }
}

fn counter(index: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("({index:>width$}/{total})")
}

impl fmt::Display for FrameLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameLine::Completed {
                index,
                total,
                name,
                failed,
            } => {
                let outcome = if *failed { "failed" } else { "done" };
                write!(f, "{} {} {}", counter(*index, *total), name, outcome)
            }
            FrameLine::Running { verb, name } => write!(f, "{verb} {name}"),
        }
    }
}

/// 一回分の描画内容
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// 今回新たに完了したタスク（一度だけ出力される）
    pub completed: Vec<FrameLine>,

    /// 実行中のタスク（次回の描画で消去される）
    pub running: Vec<FrameLine>,
}

struct LineState<V> {
    running: Vec<Arc<Task<V>>>,
    total: usize,
    completed: usize,
    drawn: usize,
}

impl<V> LineState<V> {
    fn advance(&mut self, verb: &str) -> Frame {
        let mut frame = Frame::default();
        let mut still_running = Vec::with_capacity(self.running.len());
        for task in self.running.drain(..) {
            if task.is_done() {
                self.completed += 1;
                frame.completed.push(FrameLine::Completed {
                    index: self.completed,
                    total: self.total,
                    name: task.name().to_string(),
                    failed: task.is_failed(),
                });
            } else {
                frame.running.push(FrameLine::Running {
                    verb: verb.to_string(),
                    name: task.name().to_string(),
                });
                still_running.push(task);
            }
        }
        self.running = still_running;
        frame
    }
}

/// 行の出力先
pub enum LineSink {
    /// 実行中ブロックをカーソル移動で再描画する
    Terminal(Term),

    /// 完了したタスクを `tracing` で報告する
    Log,
}

impl LineSink {
    /// stderrが端末ならTerminal、そうでなければLog
    pub fn detect() -> Self {
        if atty::is(atty::Stream::Stderr) {
            LineSink::Terminal(Term::stderr())
        } else {
            LineSink::Log
        }
    }
}

/// 行ベースの進捗表示
///
/// 実行中のタスクを一行ずつ表示し、完了したタスクは
/// `(k/total) name done|failed` として確定させる。
pub struct LineTracker<V> {
    verb: String,
    sink: LineSink,
    state: Mutex<LineState<V>>,
}

impl<V> LineTracker<V> {
    pub fn new(verb: impl Into<String>) -> Self {
        Self::with_sink(verb, LineSink::detect())
    }

    pub fn with_sink(verb: impl Into<String>, sink: LineSink) -> Self {
        Self {
            verb: verb.into(),
            sink,
            state: Mutex::new(LineState {
                running: Vec::new(),
                total: 0,
                completed: 0,
                drawn: 0,
            }),
        }
    }

    /// 状態を進めて描画内容を返す
    pub fn next_frame(&self) -> Frame {
        self.state.lock().advance(&self.verb)
    }

    fn tick(&self) {
        let mut state = self.state.lock();
        let frame = state.advance(&self.verb);
        match &self.sink {
            LineSink::Terminal(term) => {
                if let Err(e) = draw(term, state.drawn, &frame) {
                    debug!("Failed to draw progress: {}", e);
                }
                state.drawn = frame.running.len();
            }
            LineSink::Log => {
                for line in &frame.completed {
                    info!("{}", line);
                }
            }
        }
    }
}

/// 再描画に使う端末操作
trait Screen {
    fn clear_last_lines(&self, n: usize) -> std::io::Result<()>;

    fn write_line(&self, line: &str) -> std::io::Result<()>;
}

impl Screen for Term {
    fn clear_last_lines(&self, n: usize) -> std::io::Result<()> {
        Term::clear_last_lines(self, n)
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        Term::write_line(self, line)
    }
}

/// 前回描画した実行中ブロック（`drawn` 行）を消し、完了行と実行中ブロックを書く
fn draw(screen: &impl Screen, drawn: usize, frame: &Frame) -> std::io::Result<()> {
    if drawn > 0 {
        screen.clear_last_lines(drawn)?;
    }
    for line in frame.completed.iter().chain(&frame.running) {
        screen.write_line(&line.styled())?;
    }
    Ok(())
}

impl<V: Send + Sync + 'static> Tracker<V> for LineTracker<V> {
    fn render(self: Arc<Self>, total: usize) -> RenderHandle {
        self.state.lock().total = total;
        RenderHandle::spawn(RENDER_INTERVAL, move || self.tick())
    }

    fn add(&self, task: Arc<Task<V>>) {
        if matches!(self.sink, LineSink::Log) {
            debug!("{} {}", self.verb, task.name());
        }
        self.state.lock().running.push(task);
    }
}
