use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::detection::domain::engine::Engine;
use crate::pipeline::abort_synchronizer::{AbortSynchronizer, AbortToken, CompletionSignal};
use crate::pipeline::detection_listener::DetectionListener;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::pipeline::timestamp_guard::TimestampGuard;
use crate::shared::constants::{DEFAULT_QUEUE_CAPACITY, TIMESTAMP_EPSILON};
use crate::shared::frame::Frame;

/// How the worker treats frames it cannot use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionMode {
    /// Camera path: frames submitted while idle are ignored, and results
    /// that would break ordering are logged and dropped.
    Live,
    /// Video path: submitting while idle is a `NotRunning` error, and an
    /// ordering violation ends the run.
    Strict,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkerConfig {
    pub admission: AdmissionMode,
    /// Minimum gap in seconds between admitted timestamps.
    pub epsilon: f64,
    /// `None` never blocks the producer. `Some(n)` holds at most `n` frames
    /// and blocks the producer when full.
    pub queue_capacity: Option<usize>,
}

impl WorkerConfig {
    pub fn live() -> Self {
        Self {
            admission: AdmissionMode::Live,
            epsilon: TIMESTAMP_EPSILON,
            queue_capacity: None,
        }
    }

    pub fn strict() -> Self {
        Self {
            admission: AdmissionMode::Strict,
            epsilon: TIMESTAMP_EPSILON,
            queue_capacity: Some(DEFAULT_QUEUE_CAPACITY),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::live()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Stopping,
    Aborting,
}

/// Outcome of [`DetectionWorker::process`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Queued for detection.
    Accepted,
    /// Rejected by the timestamp guard.
    Dropped,
    /// Live mode only: the worker was not running.
    Ignored,
}

/// Components moved into the worker thread for a run and handed back when
/// it is joined.
struct Parts {
    engine: Box<dyn Engine>,
    listener: Box<dyn DetectionListener>,
    logger: Box<dyn PipelineLogger>,
}

struct LoopOutcome {
    parts: Parts,
    error: Option<PipelineError>,
}

/// Admission state shared by producers. `generation` advances on every
/// timestamp reset so the loop knows when a lower timestamp is legitimate.
struct Admitter {
    guard: TimestampGuard,
    generation: u64,
}

/// A frame queued for detection, tagged with its guard generation.
struct Submitted {
    generation: u64,
    frame: Frame,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicUsize,
    dropped: AtomicUsize,
}

/// Shutdown flags of one run, shared with whoever ends up joining it.
#[derive(Clone)]
struct Control {
    sync: AbortSynchronizer,
    stop_requested: Arc<AtomicBool>,
}

struct Run {
    tx: Sender<Submitted>,
    control: Control,
    handle: JoinHandle<LoopOutcome>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    Drain,
    Stop,
    Abort,
}

struct Inner {
    state: WorkerState,
    /// `None` while a run owns the parts, or after a run panicked.
    parts: Option<Parts>,
    run: Option<Run>,
    /// Set while a shutdown is joining the run, so a later `abort` can
    /// still reach the loop.
    closing: Option<Control>,
}

/// Runs a synchronous detection engine on one dedicated thread.
///
/// Frames pass the [`TimestampGuard`] in [`Self::process`], are queued, and
/// are detected one at a time in submission order. Each result is handed to
/// the [`DetectionListener`] on the worker thread. All methods take `&self`,
/// so the worker can be shared between a producer and a controller.
///
/// Lifecycle: `Idle -> Running -> {Stopping, Aborting} -> Idle`.
pub struct DetectionWorker {
    config: WorkerConfig,
    inner: Mutex<Inner>,
    /// Notified whenever the state returns to `Idle`.
    idle: Condvar,
    admitter: Mutex<Admitter>,
    counters: Arc<Counters>,
}

impl DetectionWorker {
    pub fn new(
        engine: Box<dyn Engine>,
        listener: Box<dyn DetectionListener>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: WorkerState::Idle,
                parts: Some(Parts {
                    engine,
                    listener,
                    logger: Box::new(NullPipelineLogger),
                }),
                run: None,
                closing: None,
            }),
            idle: Condvar::new(),
            admitter: Mutex::new(Admitter {
                guard: TimestampGuard::new(config.epsilon),
                generation: 0,
            }),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(parts) = inner.parts.as_mut() {
            parts.logger = logger;
        }
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_admitter(&self) -> MutexGuard<'_, Admitter> {
        self.admitter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens the engine on the calling thread and starts the processing
    /// loop. The timestamp guard starts fresh for every run.
    pub fn start(&self) -> Result<(), PipelineError> {
        let mut inner = self.lock_inner();
        if inner.state != WorkerState::Idle {
            return Err(PipelineError::AlreadyRunning);
        }
        let Some(mut parts) = inner.parts.take() else {
            return Err(PipelineError::WorkerPanicked);
        };

        if let Err(e) = parts.engine.open() {
            log::error!("Detection engine unavailable: {e}");
            inner.parts = Some(parts);
            return Err(PipelineError::EngineUnavailable(e));
        }

        self.reset_timestamps();
        self.counters.submitted.store(0, Ordering::Relaxed);
        self.counters.dropped.store(0, Ordering::Relaxed);

        let (tx, rx) = match self.config.queue_capacity {
            Some(capacity) => crossbeam_channel::bounded(capacity.max(1)),
            None => crossbeam_channel::unbounded(),
        };
        let control = Control {
            sync: AbortSynchronizer::new(),
            stop_requested: Arc::new(AtomicBool::new(false)),
        };

        let handle = spawn_loop(
            parts,
            rx,
            control.sync.token(),
            control.sync.completion(),
            Arc::clone(&control.stop_requested),
            Arc::clone(&self.counters),
            self.config.admission,
        );

        inner.run = Some(Run {
            tx,
            control,
            handle,
        });
        inner.state = WorkerState::Running;
        log::debug!("Detection worker started ({:?})", self.config.admission);
        Ok(())
    }

    /// Submits a frame for detection.
    ///
    /// With a bounded queue this blocks while the queue is full.
    pub fn process(&self, frame: Frame) -> Result<Admission, PipelineError> {
        let tx = {
            let inner = self.lock_inner();
            match (inner.state, inner.run.as_ref()) {
                (WorkerState::Running, Some(run)) if !run.handle.is_finished() => run.tx.clone(),
                _ => return self.not_running(),
            }
        };

        // Held across the send so admission order equals queue order.
        let mut admitter = self.lock_admitter();
        let timestamp = frame.timestamp();
        if !admitter.guard.admit(timestamp) {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "Dropped frame at {timestamp}s (last admitted {:?})",
                admitter.guard.last_accepted()
            );
            return Ok(Admission::Dropped);
        }
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);

        let submitted = Submitted {
            generation: admitter.generation,
            frame,
        };
        match tx.send(submitted) {
            Ok(()) => Ok(Admission::Accepted),
            Err(_) => self.not_running(),
        }
    }

    fn not_running(&self) -> Result<Admission, PipelineError> {
        match self.config.admission {
            AdmissionMode::Strict => Err(PipelineError::NotRunning),
            AdmissionMode::Live => Ok(Admission::Ignored),
        }
    }

    /// Graceful shutdown: the in-flight frame completes and its result is
    /// dispatched, queued frames are discarded, then the engine is closed.
    ///
    /// Returns the error that ended the run early, if any. A no-op when idle.
    pub fn stop(&self) -> Result<(), PipelineError> {
        self.shutdown(Shutdown::Stop)
    }

    /// Closes the input and waits until every queued frame has been
    /// processed and dispatched, then stops. Used at the end of a video.
    pub fn finish(&self) -> Result<(), PipelineError> {
        self.shutdown(Shutdown::Drain)
    }

    /// Cancels the run and blocks until the loop has exited and the engine
    /// is closed. No result is dispatched after this returns, including the
    /// in-flight one. Also cuts short a `stop` or `finish` in progress on
    /// another thread. A no-op when idle.
    pub fn abort(&self) {
        if let Err(e) = self.shutdown(Shutdown::Abort) {
            log::warn!("Detection worker aborted after error: {e}");
        }
    }

    fn shutdown(&self, kind: Shutdown) -> Result<(), PipelineError> {
        let Run {
            tx,
            control,
            handle,
        } = {
            let mut inner = self.lock_inner();
            match inner.state {
                WorkerState::Idle => return Ok(()),
                WorkerState::Stopping | WorkerState::Aborting => {
                    // Another caller is joining the run; escalate and wait.
                    if let Some(control) = inner.closing.clone() {
                        match kind {
                            Shutdown::Abort => {
                                control.sync.request();
                                inner.state = WorkerState::Aborting;
                            }
                            Shutdown::Stop => control.stop_requested.store(true, Ordering::SeqCst),
                            Shutdown::Drain => {}
                        }
                    }
                    let _idle = self
                        .idle
                        .wait_while(inner, |inner| inner.state != WorkerState::Idle)
                        .unwrap_or_else(PoisonError::into_inner);
                    return Ok(());
                }
                WorkerState::Running => {}
            }
            let Some(run) = inner.run.take() else {
                inner.state = WorkerState::Idle;
                self.idle.notify_all();
                return Ok(());
            };
            // Flag before publishing the state, so observers of
            // Stopping/Aborting know the loop has been told.
            inner.state = match kind {
                Shutdown::Abort => {
                    run.control.sync.request();
                    WorkerState::Aborting
                }
                Shutdown::Stop => {
                    run.control.stop_requested.store(true, Ordering::SeqCst);
                    WorkerState::Stopping
                }
                Shutdown::Drain => WorkerState::Stopping,
            };
            inner.closing = Some(run.control.clone());
            run
        };

        // Disconnecting wakes a loop that is waiting for frames.
        drop(tx);
        if kind == Shutdown::Abort {
            control.sync.wait();
        }

        let joined = handle.join();
        let mut inner = self.lock_inner();
        inner.state = WorkerState::Idle;
        inner.closing = None;
        let outcome = match joined {
            Ok(LoopOutcome { parts, error }) => {
                inner.parts = Some(parts);
                log::debug!("Detection worker stopped");
                error.map_or(Ok(()), Err)
            }
            Err(_) => {
                log::error!("Detection worker thread panicked");
                Err(PipelineError::WorkerPanicked)
            }
        };
        self.idle.notify_all();
        outcome
    }

    /// `true` while a run is active and its loop has not exited on its own.
    pub fn is_running(&self) -> bool {
        let inner = self.lock_inner();
        inner.state == WorkerState::Running
            && inner
                .run
                .as_ref()
                .is_some_and(|run| !run.handle.is_finished())
    }

    pub fn state(&self) -> WorkerState {
        self.lock_inner().state
    }

    /// Forgets the last admitted timestamp, for sources whose clock restarted.
    pub fn reset_timestamps(&self) {
        let mut admitter = self.lock_admitter();
        admitter.guard.reset();
        admitter.generation += 1;
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.abort();
    }
}

fn spawn_loop(
    parts: Parts,
    rx: Receiver<Submitted>,
    token: AbortToken,
    completion: CompletionSignal,
    stop_requested: Arc<AtomicBool>,
    counters: Arc<Counters>,
    mode: AdmissionMode,
) -> JoinHandle<LoopOutcome> {
    std::thread::spawn(move || {
        // Signals waiters on every exit path, unwinding included.
        let _completion = completion;
        run_loop(parts, rx, &token, &stop_requested, &counters, mode)
    })
}

fn run_loop(
    mut parts: Parts,
    rx: Receiver<Submitted>,
    token: &AbortToken,
    stop_requested: &AtomicBool,
    counters: &Counters,
    mode: AdmissionMode,
) -> LoopOutcome {
    let mut last_dispatched: Option<f64> = None;
    let mut generation = None;
    let mut processed = 0usize;
    let mut engine_errors = 0usize;
    let mut error = None;
    parts
        .logger
        .info(&format!("Detection loop started ({mode:?})"));

    for Submitted {
        generation: frame_generation,
        frame,
    } in rx.iter()
    {
        if token.is_requested() || stop_requested.load(Ordering::SeqCst) {
            break;
        }
        if generation != Some(frame_generation) {
            generation = Some(frame_generation);
            last_dispatched = None;
        }
        parts.logger.metric("queue_depth", rx.len() as f64);

        let t0 = Instant::now();
        let result = match parts.engine.detect(&frame) {
            Ok(result) => result,
            Err(e) => {
                engine_errors += 1;
                log::warn!("Detection failed at {}s: {e}", frame.timestamp());
                continue;
            }
        };
        parts
            .logger
            .timing("detect", t0.elapsed().as_secs_f64() * 1000.0);
        processed += 1;

        if token.is_requested() {
            break;
        }

        if let Some(previous) = last_dispatched {
            let current = result.timestamp;
            if current.partial_cmp(&previous) != Some(std::cmp::Ordering::Greater) {
                match mode {
                    AdmissionMode::Strict => {
                        log::error!("Result at {current}s is not after {previous}s; ending run");
                        error = Some(PipelineError::OrderingViolation { previous, current });
                        break;
                    }
                    AdmissionMode::Live => {
                        log::warn!("Dropping out-of-order result at {current}s (after {previous}s)");
                        continue;
                    }
                }
            }
        }
        last_dispatched = Some(result.timestamp);

        let t0 = Instant::now();
        parts.listener.on_result(frame, result);
        parts
            .logger
            .timing("dispatch", t0.elapsed().as_secs_f64() * 1000.0);
        parts.logger.progress(processed, 0);
    }

    parts.engine.close();
    parts
        .logger
        .info(&format!("Detection loop ended after {processed} frames"));
    parts.logger.metric("engine_errors", engine_errors as f64);
    parts
        .logger
        .metric("frames_dropped", counters.dropped.load(Ordering::Relaxed) as f64);
    parts
        .logger
        .throughput(counters.submitted.load(Ordering::Relaxed), processed);
    parts.logger.summary();

    LoopOutcome { parts, error }
}
