//! RotatingSink - queued writer threads with destination rotation
//!
//! ```text
//! [write()] → [channel] → [writer thread × N] → reserve() → adapter.write()
//!                                                   ↓ (roll due)
//!                          open next · swap · close old (+ callback) · prune backups
//! ```
//!
//! Lock order is rotation → active → write lock. A writer takes its read
//! guard on the active destination while still holding the rotation lock, so
//! a rotation (which needs the write side) waits for every in-flight write
//! and a retired destination never sees another record.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::thread::{self, JoinHandle};

use chrono::Local;
use contracts::{MetricsSnapshot, SinkConfig, SinkError, SinkFileSystem};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::SinkMetrics;
use crate::namer::DestinationNamer;
use crate::policy::{RollPolicy, RollSnapshot};
use crate::retention::Retention;

/// Called with each retired destination after it is closed
pub type OnRollCallback = Arc<dyn Fn(&Path, &RollSnapshot) + Send + Sync>;

/// Everything a sink needs, moved into [`RotatingSink::new`]
pub struct SinkOptions<O> {
    /// Engine options
    pub config: SinkConfig,
    /// Adapter options shared by every destination
    pub adapter: O,
    /// Rotation callback
    pub on_roll: Option<OnRollCallback>,
}

impl<O> SinkOptions<O> {
    pub fn new(config: SinkConfig, adapter: O) -> Self {
        Self {
            config,
            adapter,
            on_roll: None,
        }
    }

    /// Set the rotation callback
    pub fn on_roll(
        mut self,
        callback: impl Fn(&Path, &RollSnapshot) + Send + Sync + 'static,
    ) -> Self {
        self.on_roll = Some(Arc::new(callback));
        self
    }
}

impl<O: Default> SinkOptions<O> {
    /// Options with the adapter's default settings
    pub fn with_config(config: SinkConfig) -> Self {
        Self::new(config, O::default())
    }
}

/// Lifecycle of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SinkStatus {
    /// Accepting records
    Running = 0,
    /// Close requested, queue draining
    Draining = 1,
    /// Every thread joined and every destination closed
    Closed = 2,
    /// A destination could not be opened
    Failed = 3,
}

impl SinkStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Draining,
            2 => Self::Closed,
            _ => Self::Failed,
        }
    }
}

/// The open destination
struct Destination<FS> {
    fs: FS,
    path: PathBuf,
    sequence: u64,
    /// Rows written so far
    rows: AtomicU64,
    /// Writes reserved but not finished
    pending: AtomicU64,
}

impl<FS> Destination<FS> {
    fn counted_rows(&self) -> u64 {
        self.rows.load(Ordering::Acquire) + self.pending.load(Ordering::Acquire)
    }
}

/// Guarded by the rotation lock
struct RotationState {
    index: u64,
    policy: RollPolicy,
    retention: Retention,
}

type ActiveGuard<'a, FS> = RwLockReadGuard<'a, Option<Destination<FS>>>;

/// State shared between the handle and the writer threads
struct Shared<R, FS: SinkFileSystem<R>> {
    name: String,
    config: SinkConfig,
    adapter: FS::Options,
    on_roll: Option<OnRollCallback>,
    namer: DestinationNamer,
    rotation: Mutex<RotationState>,
    active: RwLock<Option<Destination<FS>>>,
    write_lock: Mutex<()>,
    /// Background closes still running, keyed by destination
    closers: Mutex<Vec<(PathBuf, JoinHandle<()>)>>,
    metrics: Arc<SinkMetrics>,
    status: AtomicU8,
    fatal: Mutex<Option<String>>,
    _record: PhantomData<fn(R)>,
}

struct Lifecycle {
    workers: Vec<JoinHandle<()>>,
    closed: bool,
}

/// Asynchronous rotating record sink
///
/// Producers call [`RotatingSink::write`] from any thread; writer threads
/// move records into the adapter, rotating destinations as the roll policy
/// dictates. Dropping the sink closes it.
pub struct RotatingSink<R: Send + 'static, FS: SinkFileSystem<R>> {
    shared: Arc<Shared<R, FS>>,
    tx: RwLock<Option<Sender<R>>>,
    rx: Receiver<R>,
    lifecycle: Mutex<Lifecycle>,
}

impl<R: Send + 'static, FS: SinkFileSystem<R>> RotatingSink<R, FS> {
    /// Validate the options and start the writer threads
    ///
    /// No destination is opened until the first record arrives.
    #[instrument(name = "rotating_sink_new", skip(options), fields(sink = %options.config.name))]
    pub fn new(options: SinkOptions<FS::Options>) -> Result<Self, SinkError> {
        let SinkOptions {
            config,
            adapter,
            on_roll,
        } = options;
        config.validate()?;

        let workers = if FS::is_thread_safe() {
            config.concurrency
        } else {
            if config.concurrency > 1 {
                warn!(
                    sink = %config.name,
                    concurrency = config.concurrency,
                    "Adapter is not thread-safe, using a single writer thread"
                );
            }
            1
        };

        let (tx, rx) = match config.queue_capacity {
            Some(capacity) => crossbeam_channel::bounded(capacity),
            None => crossbeam_channel::unbounded(),
        };

        let shared = Arc::new(Shared {
            name: config.name.clone(),
            namer: DestinationNamer::new(&config),
            rotation: Mutex::new(RotationState {
                index: 0,
                policy: RollPolicy::new(&config.rotation),
                retention: Retention::new(config.rotation.max_backup_files),
            }),
            config,
            adapter,
            on_roll,
            active: RwLock::new(None),
            write_lock: Mutex::new(()),
            closers: Mutex::new(Vec::new()),
            metrics: Arc::new(SinkMetrics::new()),
            status: AtomicU8::new(SinkStatus::Running as u8),
            fatal: Mutex::new(None),
            _record: PhantomData,
        });

        let sink = Self {
            shared,
            tx: RwLock::new(Some(tx)),
            rx,
            lifecycle: Mutex::new(Lifecycle {
                workers: Vec::with_capacity(workers),
                closed: false,
            }),
        };

        for i in 0..workers {
            let worker_shared = Arc::clone(&sink.shared);
            let worker_rx = sink.rx.clone();
            // on error `sink` is dropped, which joins the threads already running
            let handle = thread::Builder::new()
                .name(format!("{}-writer-{i}", sink.shared.name))
                .spawn(move || writer_loop(worker_shared, worker_rx))?;
            lock(&sink.lifecycle).workers.push(handle);
        }

        info!(sink = %sink.shared.name, workers = workers, "Rotating sink started");
        Ok(sink)
    }

    /// Sink name
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Queue a record without blocking
    ///
    /// # Errors
    /// - [`SinkError::Closed`] after [`RotatingSink::close`]; the record is dropped
    /// - [`SinkError::Failed`] after a fatal open error
    /// - [`SinkError::QueueFull`] when a bounded queue is full
    pub fn write(&self, record: R) -> Result<(), SinkError> {
        let shared = &self.shared;
        if shared.status() == SinkStatus::Failed {
            shared.metrics.add_dropped_count(1);
            return Err(SinkError::failed(&shared.name, shared.fatal_message()));
        }

        let tx = read(&self.tx);
        let Some(tx) = tx.as_ref() else {
            shared.metrics.add_dropped_count(1);
            debug!(sink = %shared.name, "Write after close, record dropped");
            return Err(SinkError::closed(&shared.name));
        };

        match tx.try_send(record) {
            Ok(()) => {
                shared.metrics.inc_accepted_count();
                shared.metrics.set_queue_len(tx.len());
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                shared.metrics.add_dropped_count(1);
                let capacity = tx.capacity().unwrap_or_default();
                warn!(sink = %shared.name, capacity = capacity, "Queue full, record dropped");
                Err(SinkError::QueueFull {
                    sink_name: shared.name.clone(),
                    capacity,
                })
            }
            Err(TrySendError::Disconnected(_)) => {
                shared.metrics.add_dropped_count(1);
                Err(SinkError::closed(&shared.name))
            }
        }
    }

    /// Stop accepting records, drain the queue, close the last destination
    ///
    /// Returns once every writer and background close thread has been
    /// joined. Later calls are no-ops. A fatal open error is reported by the
    /// call that performs the shutdown.
    #[instrument(name = "rotating_sink_close", skip(self), fields(sink = %self.shared.name))]
    pub fn close(&self) -> Result<(), SinkError> {
        let shared = &self.shared;
        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.closed {
            return Ok(());
        }

        let _ = shared.status.compare_exchange(
            SinkStatus::Running as u8,
            SinkStatus::Draining as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        // writers drain what is queued and exit once the sender is gone
        drop(write(&self.tx).take());

        for worker in lifecycle.workers.drain(..) {
            if let Err(e) = worker.join() {
                error!(sink = %shared.name, error = ?e, "Writer thread panicked");
            }
        }

        let leftovers = self.rx.try_iter().count() as u64;
        if leftovers > 0 {
            shared.metrics.add_dropped_count(leftovers);
            warn!(sink = %shared.name, records = leftovers, "Discarded records left after failure");
        }
        shared.metrics.set_queue_len(0);

        shared.close_final();
        shared.join_closers();
        lifecycle.closed = true;

        let failed = shared.status() == SinkStatus::Failed;
        if !failed {
            shared
                .status
                .store(SinkStatus::Closed as u8, Ordering::Release);
        }
        info!(
            sink = %shared.name,
            rows = shared.metrics.rows_written(),
            rotations = shared.metrics.rotation_count(),
            "Rotating sink closed"
        );

        if failed {
            Err(SinkError::failed(&shared.name, shared.fatal_message()))
        } else {
            Ok(())
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> SinkStatus {
        self.shared.status()
    }

    /// Message of the fatal error that stopped the sink, if any
    pub fn last_error(&self) -> Option<String> {
        lock(&self.shared.fatal).clone()
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.shared.metrics
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Path of the destination currently open
    pub fn current_path(&self) -> Option<PathBuf> {
        read(&self.shared.active).as_ref().map(|d| d.path.clone())
    }

    /// Destinations still tracked by retention, oldest first
    pub fn retained(&self) -> Vec<PathBuf> {
        lock(&self.shared.rotation)
            .retention
            .retained()
            .map(Path::to_path_buf)
            .collect()
    }
}

impl<R: Send + 'static, FS: SinkFileSystem<R>> Drop for RotatingSink<R, FS> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!(sink = %self.shared.name, error = %e, "Sink closed with error");
        }
    }
}

fn writer_loop<R: Send + 'static, FS: SinkFileSystem<R>>(shared: Arc<Shared<R, FS>>, rx: Receiver<R>) {
    while let Ok(record) = rx.recv() {
        shared.metrics.set_queue_len(rx.len());
        if shared.status() == SinkStatus::Failed {
            shared.metrics.add_dropped_count(1);
            break;
        }

        match shared.reserve() {
            Ok(active) => shared.write_record(active, record),
            Err(e) => {
                error!(sink = %shared.name, error = %e, "Failed to open destination, stopping sink");
                shared.metrics.add_dropped_count(1);
                shared.fail(&e);
                break;
            }
        }
    }
    debug!(sink = %shared.name, "Writer thread exiting");
}

impl<R: Send + 'static, FS: SinkFileSystem<R>> Shared<R, FS> {
    fn status(&self) -> SinkStatus {
        SinkStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn fatal_message(&self) -> String {
        lock(&self.fatal)
            .clone()
            .unwrap_or_else(|| "unknown failure".to_string())
    }

    fn fail(&self, err: &SinkError) {
        let mut fatal = lock(&self.fatal);
        if fatal.is_none() {
            *fatal = Some(err.to_string());
        }
        self.status
            .store(SinkStatus::Failed as u8, Ordering::Release);
    }

    /// Rotate if due, then reserve one write on the active destination
    ///
    /// Opens the first destination when none is open yet.
    fn reserve(&self) -> Result<ActiveGuard<'_, FS>, SinkError> {
        let mut state = lock(&self.rotation);
        let due = match read(&self.active).as_ref() {
            None => true,
            Some(destination) => state.policy.should_roll(destination.counted_rows()),
        };
        if due {
            self.rotate(&mut state)?;
        }

        let active = read(&self.active);
        if let Some(destination) = active.as_ref() {
            destination.pending.fetch_add(1, Ordering::AcqRel);
        }
        Ok(active)
    }

    fn write_record(&self, active: ActiveGuard<'_, FS>, record: R) {
        let Some(destination) = active.as_ref() else {
            self.metrics.add_dropped_count(1);
            warn!(sink = %self.name, "No open destination, record dropped");
            return;
        };

        let result = {
            let _serial = (!FS::is_thread_safe()).then(|| lock(&self.write_lock));
            destination.fs.write(record)
        };

        match result {
            Ok(rows) => {
                destination.rows.fetch_add(rows, Ordering::AcqRel);
                self.metrics.record_write(rows);
            }
            Err(e) => {
                self.metrics.inc_failure_count();
                error!(
                    sink = %self.name,
                    path = %destination.path.display(),
                    error = %e,
                    "Write failed"
                );
                // Continue processing - don't crash on single failure
            }
        }
        destination.pending.fetch_sub(1, Ordering::AcqRel);
    }

    #[instrument(name = "rotating_sink_rotate", skip(self, state), fields(sink = %self.name))]
    fn rotate(&self, state: &mut RotationState) -> Result<(), SinkError> {
        let path = self
            .namer
            .next_path(&mut state.index, Local::now(), |p| FS::exists(p, &self.adapter));
        let fs = FS::open(&path, &self.adapter)?;
        if !fs.is_open() {
            return Err(SinkError::open(&path, "destination not open after open()"));
        }

        let next = Destination {
            fs,
            path: path.clone(),
            sequence: state.index,
            rows: AtomicU64::new(0),
            pending: AtomicU64::new(0),
        };
        let previous = write(&self.active).replace(next);

        if let Some(previous) = previous {
            let snapshot = state
                .policy
                .snapshot(previous.rows.load(Ordering::Acquire), previous.sequence);
            self.retire(previous, snapshot);
        }

        state.index += 1;
        state.policy.advance();
        info!(sink = %self.name, path = %path.display(), "Destination opened");

        state.retention.push(path);
        let removed = state.retention.prune(|p| {
            // a destination is only removed once its close and callback are done
            self.await_close(p);
            FS::remove(p, &self.adapter)
        });
        self.metrics.add_removed_count(removed.len() as u64);
        Ok(())
    }

    /// Close a swapped-out destination inline or on a background thread
    fn retire(&self, previous: Destination<FS>, snapshot: RollSnapshot) {
        if !self.config.close_in_threads {
            self.close_destination(previous, snapshot);
            return;
        }

        let path = previous.path.clone();
        // shared slot so the destination is still reachable if spawning fails
        let job = Arc::new(Mutex::new(Some((previous, snapshot))));
        let thread_job = Arc::clone(&job);
        let name = self.name.clone();
        let metrics = Arc::clone(&self.metrics);
        let on_roll = self.on_roll.clone();

        let spawned = thread::Builder::new()
            .name(format!("{name}-closer"))
            .spawn(move || {
                let job = lock(&thread_job).take();
                if let Some((destination, snapshot)) = job {
                    close_destination::<R, FS>(
                        &name,
                        &metrics,
                        on_roll.as_ref(),
                        destination,
                        snapshot,
                    );
                }
            });

        match spawned {
            Ok(handle) => {
                let mut closers = lock(&self.closers);
                self.reap_finished(&mut closers);
                closers.push((path, handle));
            }
            Err(e) => {
                warn!(sink = %self.name, error = %e, "Failed to spawn close thread, closing inline");
                let job = lock(&job).take();
                if let Some((destination, snapshot)) = job {
                    self.close_destination(destination, snapshot);
                }
            }
        }
    }

    fn close_destination(&self, destination: Destination<FS>, snapshot: RollSnapshot) {
        close_destination::<R, FS>(
            &self.name,
            &self.metrics,
            self.on_roll.as_ref(),
            destination,
            snapshot,
        );
    }

    /// Close the destination still open at shutdown
    fn close_final(&self) {
        let state = lock(&self.rotation);
        let Some(last) = write(&self.active).take() else {
            return;
        };
        let snapshot = state
            .policy
            .snapshot(last.rows.load(Ordering::Acquire), last.sequence);
        drop(state);
        self.close_destination(last, snapshot);
    }

    fn join_closers(&self) {
        let closers = std::mem::take(&mut *lock(&self.closers));
        for (path, closer) in closers {
            self.join_closer(&path, closer);
        }
    }

    /// Wait for the background close of `path`, if one is running
    fn await_close(&self, path: &Path) {
        let pending: Vec<_> = {
            let mut closers = lock(&self.closers);
            let (matching, rest) = std::mem::take(&mut *closers)
                .into_iter()
                .partition(|(p, _)| p.as_path() == path);
            *closers = rest;
            matching
        };
        for (path, closer) in pending {
            debug!(sink = %self.name, path = %path.display(), "Waiting for close before removal");
            self.join_closer(&path, closer);
        }
    }

    /// Join close threads that already exited
    fn reap_finished(&self, closers: &mut Vec<(PathBuf, JoinHandle<()>)>) {
        let (finished, running) = std::mem::take(closers)
            .into_iter()
            .partition(|(_, h)| h.is_finished());
        *closers = running;
        for (path, closer) in finished {
            self.join_closer(&path, closer);
        }
    }

    fn join_closer(&self, path: &Path, closer: JoinHandle<()>) {
        if let Err(e) = closer.join() {
            error!(sink = %self.name, path = %path.display(), error = ?e, "Close thread panicked");
        }
    }
}

/// Flush and close a retired destination, then report it
///
/// Close failures are logged; the callback still runs.
fn close_destination<R, FS: SinkFileSystem<R>>(
    name: &str,
    metrics: &SinkMetrics,
    on_roll: Option<&OnRollCallback>,
    destination: Destination<FS>,
    snapshot: RollSnapshot,
) {
    let path = destination.path.as_path();
    if let Err(e) = destination.fs.flush() {
        error!(sink = %name, path = %path.display(), error = %e, "Flush failed");
    }
    if let Err(e) = destination.fs.close() {
        error!(sink = %name, path = %path.display(), error = %e, "Close failed");
    }
    metrics.inc_rotation_count();
    info!(sink = %name, path = %path.display(), rows = snapshot.rows, "Destination closed");

    if let Some(on_roll) = on_roll {
        on_roll(path, &snapshot);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
