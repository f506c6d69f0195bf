//! Concurrent depth-first maze exploration.
//!
//! An [`Explorer`] walks the grid from a start position with a fixed pool of worker threads. Each
//! worker takes a position off a bounded [`WorkQueue`] and walks from it depth-first, claiming
//! every cell it enters. At a branch point the walker keeps the first candidate for itself and
//! offers the others to the queue so idle workers can take them; when the queue is full the walker
//! keeps them on a local backlog instead. The first walker to claim an exit records it in the
//! shared [`SearchResult`], and every other walker stops at its next step.

use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        OnceLock,
    },
    thread,
    time::{Duration, Instant},
};

use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::{
    display::Render,
    grid::{BoundsError, Claim, Grid},
    pool::WorkQueue,
    types::{Cell, Position},
};

/// Default capacity of the branch queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Upper bound on the number of worker threads.
pub const MAX_WORKERS: usize = 512;

/// Tuning knobs for a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExploreConfig {
    /// Number of worker threads, including the calling thread.
    pub workers: usize,
    /// Maximum number of branches waiting in the queue before walkers keep them for themselves.
    pub queue_capacity: usize,
    /// Pause after each rendered frame. Zero disables it.
    pub frame_delay: Duration,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().clamp(1, MAX_WORKERS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            frame_delay: Duration::ZERO,
        }
    }
}

impl ExploreConfig {
    /// Returns the configuration with the given number of workers.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Returns the configuration with the given queue capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Returns the configuration with the given frame delay.
    #[must_use]
    pub const fn with_frame_delay(mut self, frame_delay: Duration) -> Self {
        self.frame_delay = frame_delay;
        self
    }
}

/// Shared, write-once record of a successful search.
///
/// The flag only ever moves from unset to set. It is polled by every walker before each step
/// without holding any lock.
#[derive(Debug, Default)]
pub struct SearchResult {
    /// Whether some walker has claimed an exit.
    found: AtomicBool,
    /// Exit claimed by the winning walker.
    exit: OnceLock<Position>,
    /// Number of unset-to-set transitions, which can only ever be zero or one.
    transitions: AtomicUsize,
}

impl SearchResult {
    /// Returns `true` once an exit has been recorded.
    pub fn is_found(&self) -> bool {
        self.found.load(Ordering::Acquire)
    }

    /// Records that a walker reached the exit at `exit`.
    ///
    /// Returns `true` for the single call that sets the flag and `false` for every other call.
    pub fn record(&self, exit: Position) -> bool {
        if self
            .found
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let _ = self.exit.get_or_init(|| exit);
        let _ = self.transitions.fetch_add(1, Ordering::AcqRel);

        true
    }

    /// Returns the exit recorded by the winning walker, if any.
    pub fn exit(&self) -> Option<Position> {
        self.exit.get().copied()
    }

    /// Returns how many times the flag went from unset to set.
    pub fn transitions(&self) -> usize {
        self.transitions.load(Ordering::Acquire)
    }
}

/// Final state of a single walker task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchOutcome {
    /// The task claimed an exit.
    Succeeded,
    /// Every path the task followed ended without reaching an exit.
    DeadEnd,
    /// The task stopped because another walker already found an exit.
    Cancelled,
    /// At least one path of the task hit an error; see [`BranchError`].
    Failed,
}

/// Unexpected failure while following a single path.
///
/// These never propagate past the path: the walker logs them and moves on to its next branch.
#[derive(Debug, Error)]
pub enum BranchError {
    /// The path tried to access a cell outside the grid.
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    /// A progress frame could not be rendered.
    #[error("failed to render frame: {0}")]
    Render(#[from] io::Error),
    /// The path panicked.
    #[error("explorer panicked: {0}")]
    Panicked(String),
}

/// Running counters, updated by every worker.
#[derive(Debug, Default)]
struct ExploreStats {
    /// Cells claimed.
    visited: AtomicU64,
    /// Branches accepted by the queue.
    queued: AtomicU64,
    /// Branches kept on a walker's backlog because the queue was full.
    inlined: AtomicU64,
    /// Paths that hit a [`BranchError`].
    failed: AtomicU64,
    /// Wall-clock time of the last search, in microseconds.
    elapsed_micros: AtomicU64,
}

/// Summary of a finished search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExploreReport {
    /// Whether an exit was found.
    pub found: bool,
    /// Exit claimed by the winning walker.
    pub exit: Option<Position>,
    /// Number of cells claimed.
    pub cells_visited: u64,
    /// Number of branches handed to the worker pool.
    pub branches_queued: u64,
    /// Number of branches explored inline because the queue was full.
    pub branches_inlined: u64,
    /// Number of paths abandoned because of an error or panic.
    pub branches_failed: u64,
    /// Wall-clock duration of the search.
    pub elapsed: Duration,
}

/// Concurrent maze explorer over a shared grid.
pub struct Explorer<'run> {
    /// Grid being explored.
    grid: &'run Grid,
    /// Sink for progress frames.
    renderer: &'run dyn Render,
    /// Search configuration.
    config: ExploreConfig,
    /// Shared success flag.
    result: SearchResult,
    /// Shared counters.
    stats: ExploreStats,
}

impl<'run> Explorer<'run> {
    /// Creates an explorer over `grid` that reports frames to `renderer`.
    pub fn new(grid: &'run Grid, renderer: &'run dyn Render, config: ExploreConfig) -> Self {
        Self {
            grid,
            renderer,
            config,
            result: SearchResult::default(),
            stats: ExploreStats::default(),
        }
    }

    /// Returns the shared success flag.
    pub const fn result(&self) -> &SearchResult {
        &self.result
    }

    /// Explores the grid from `start` until an exit is claimed or every reachable cell is visited.
    ///
    /// Returns `true` if an exit was found. Returns `false` right away if this explorer already
    /// found one in an earlier call. All workers are joined before this function returns, so no
    /// frame is rendered after it.
    pub fn explore(&self, start: Position) -> bool {
        if self.result.is_found() {
            return false;
        }

        let started = Instant::now();
        let workers = self.config.workers.clamp(1, MAX_WORKERS);
        let queue = WorkQueue::new(self.config.queue_capacity);

        if !queue.offer(start) {
            error!(row = start.row, col = start.col, "failed to seed the branch queue");
            return false;
        }

        info!(
            workers,
            row = start.row,
            col = start.col,
            "Starting exploration"
        );

        let joined = crossbeam::thread::scope(|scope| {
            for id in 1..workers {
                let queue = &queue;
                if let Err(err) = scope
                    .builder()
                    .name(format!("explorer-{id}"))
                    .spawn(move |_| self.run_worker(id, queue))
                {
                    warn!(worker = id, error = %err, "Failed to spawn worker");
                }
            }

            // The calling thread is always worker 0, so the search progresses even if no thread
            // could be spawned.
            self.run_worker(0, &queue);
        });
        if joined.is_err() {
            error!("A worker thread panicked outside of a branch");
        }

        let elapsed = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.stats.elapsed_micros.store(elapsed, Ordering::Relaxed);

        let queue_stats = queue.stats();
        debug!(
            enqueued = queue_stats.enqueued.load(Ordering::Relaxed),
            dequeued = queue_stats.dequeued.load(Ordering::Relaxed),
            backpressure = queue_stats.backpressure_events.load(Ordering::Relaxed),
            "Branch queue drained"
        );

        let found = self.result.is_found();
        info!(
            found,
            visited = self.stats.visited.load(Ordering::Relaxed),
            elapsed_us = elapsed,
            "Exploration finished"
        );

        found
    }

    /// Returns a summary of the searches run so far.
    pub fn report(&self) -> ExploreReport {
        ExploreReport {
            found: self.result.is_found(),
            exit: self.result.exit(),
            cells_visited: self.stats.visited.load(Ordering::Relaxed),
            branches_queued: self.stats.queued.load(Ordering::Relaxed),
            branches_inlined: self.stats.inlined.load(Ordering::Relaxed),
            branches_failed: self.stats.failed.load(Ordering::Relaxed),
            elapsed: Duration::from_micros(self.stats.elapsed_micros.load(Ordering::Relaxed)),
        }
    }

    /// Takes tasks off the queue until the search is exhausted.
    fn run_worker(&self, id: usize, queue: &WorkQueue) {
        debug!(worker = id, "Worker starting");
        let mut tasks = 0_u64;

        while let Some((position, _guard)) = queue.next() {
            tasks += 1;

            let outcome = self.walk(id, position, queue);
            trace!(
                worker = id,
                row = position.row,
                col = position.col,
                ?outcome,
                "Branch finished"
            );
        }

        debug!(worker = id, tasks, "Worker finished");
    }

    /// Logs and counts a failed path.
    fn fail(&self, id: usize, position: Position, err: &BranchError) -> BranchOutcome {
        warn!(
            worker = id,
            row = position.row,
            col = position.col,
            error = %err,
            "Branch failed"
        );
        let _ = self.stats.failed.fetch_add(1, Ordering::Relaxed);

        BranchOutcome::Failed
    }

    /// Walks a task depth-first from `start`, claiming every cell it enters.
    ///
    /// Branches the queue refuses go onto a heap-allocated backlog owned by this task. Each
    /// backlog entry is followed on its own: an error or panic ends that path only, and the
    /// remaining entries are still explored.
    fn walk(&self, id: usize, start: Position, queue: &WorkQueue) -> BranchOutcome {
        let mut backlog = vec![start];
        let mut outcome = BranchOutcome::DeadEnd;

        while let Some(path) = backlog.pop() {
            let followed =
                panic::catch_unwind(AssertUnwindSafe(|| self.follow(path, queue, &mut backlog)));

            match followed {
                Ok(Ok(BranchOutcome::DeadEnd)) => {}
                Ok(Ok(finished)) => return finished,
                Ok(Err(err)) => outcome = self.fail(id, path, &err),
                Err(payload) => {
                    outcome =
                        self.fail(id, path, &BranchError::Panicked(panic_message(&*payload)));
                }
            }
        }

        outcome
    }

    /// Follows a single path from `start` until it reaches an exit or a dead end.
    ///
    /// Straight corridors are followed in a loop rather than by recursion, so the call stack never
    /// grows with the maze. Side branches go to `queue`, or to `backlog` when it is full.
    ///
    /// # Errors
    ///
    /// Returns [`BranchError`] on out-of-bounds access or when a frame cannot be rendered.
    fn follow(
        &self,
        start: Position,
        queue: &WorkQueue,
        backlog: &mut Vec<Position>,
    ) -> Result<BranchOutcome, BranchError> {
        let mut current = start;

        loop {
            if self.result.is_found() {
                return Ok(BranchOutcome::Cancelled);
            }

            match self.grid.try_claim(current)? {
                Claim::Claimed(Cell::Exit) => {
                    let _ = self.stats.visited.fetch_add(1, Ordering::Relaxed);
                    if self.result.record(current) {
                        info!(row = current.row, col = current.col, "Exit found");
                    }
                    return Ok(BranchOutcome::Succeeded);
                }
                Claim::Claimed(_) => {
                    let _ = self.stats.visited.fetch_add(1, Ordering::Relaxed);
                }
                // Claimed by another walker since it was listed as a candidate.
                Claim::Unavailable(_) => return Ok(BranchOutcome::DeadEnd),
            }

            self.renderer.frame(self.grid, current)?;
            if !self.config.frame_delay.is_zero() {
                thread::sleep(self.config.frame_delay);
            }

            let mut candidates = self.grid.enterable_neighbors(current).into_iter();
            let Some(next) = candidates.next() else {
                return Ok(BranchOutcome::DeadEnd);
            };

            for branch in candidates {
                if queue.offer(branch) {
                    let _ = self.stats.queued.fetch_add(1, Ordering::Relaxed);
                } else {
                    let _ = self.stats.inlined.fetch_add(1, Ordering::Relaxed);
                    backlog.push(branch);
                }
            }

            current = next;
        }
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Silent;

    /// Builds a grid from compact rows, one character per cell.
    fn grid_from_rows(rows: &[&str]) -> Grid {
        let cols = rows.first().map_or(0, |row| row.len());
        let cells = rows
            .iter()
            .flat_map(|row| row.chars().map(Cell::from_input))
            .collect();

        Grid::from_cells(rows.len(), cols, cells).expect("rows should have equal length")
    }

    /// Configuration with a single worker, which makes exploration order deterministic.
    fn sequential() -> ExploreConfig {
        ExploreConfig::default().with_workers(1)
    }

    /// Renderer that fails when asked to draw a specific cell.
    struct FailAt(Position);

    impl Render for FailAt {
        fn frame(&self, _grid: &Grid, at: Position) -> io::Result<()> {
            if at == self.0 {
                Err(io::Error::other("terminal went away"))
            } else {
                Ok(())
            }
        }
    }

    /// Renderer that panics when asked to draw a specific cell.
    struct PanicAt(Position);

    impl Render for PanicAt {
        fn frame(&self, _grid: &Grid, at: Position) -> io::Result<()> {
            assert_ne!(at, self.0, "renderer exploded");
            Ok(())
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = ExploreConfig::default();

        assert!(config.workers >= 1);
        assert!(config.workers <= MAX_WORKERS);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.frame_delay, Duration::ZERO);
    }

    #[test]
    fn test_config_builders() {
        let config = ExploreConfig::default()
            .with_workers(3)
            .with_queue_capacity(7)
            .with_frame_delay(Duration::from_millis(5));

        assert_eq!(config.workers, 3);
        assert_eq!(config.queue_capacity, 7);
        assert_eq!(config.frame_delay, Duration::from_millis(5));
    }

    #[test]
    fn test_search_result_records_once() {
        let result = SearchResult::default();
        assert!(!result.is_found());
        assert_eq!(result.exit(), None);

        assert!(result.record(Position::new(1, 1)));
        assert!(!result.record(Position::new(2, 2)));

        assert!(result.is_found());
        assert_eq!(result.exit(), Some(Position::new(1, 1)));
        assert_eq!(result.transitions(), 1);
    }

    #[test]
    fn test_search_result_concurrent_records() {
        let result = SearchResult::default();
        let shared = &result;

        let winners = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|col| scope.spawn(move || shared.record(Position::new(0, col))))
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().expect("recording thread should not panic"))
                .filter(|won| *won)
                .count()
        });

        assert_eq!(winners, 1);
        assert_eq!(result.transitions(), 1);
    }

    #[test]
    fn test_explore_corridor() {
        let grid = grid_from_rows(&["exxxs"]);
        let explorer = Explorer::new(&grid, &Silent, sequential());

        assert!(explorer.explore(Position::new(0, 0)));
        assert_eq!(grid.render(), ".....\n");

        let report = explorer.report();
        assert!(report.found);
        assert_eq!(report.exit, Some(Position::new(0, 4)));
        assert_eq!(report.cells_visited, 5);
        assert_eq!(report.branches_queued, 0);
        assert_eq!(report.branches_failed, 0);
    }

    #[test]
    fn test_explore_open_square() {
        let grid = grid_from_rows(&["exx", "xxx", "xxs"]);
        let explorer = Explorer::new(&grid, &Silent, ExploreConfig::default().with_workers(4));

        assert!(explorer.explore(Position::new(0, 0)));
        assert_eq!(explorer.result().transitions(), 1);
        assert_eq!(explorer.result().exit(), Some(Position::new(2, 2)));
        assert_eq!(grid.cell(Position::new(2, 2)), Ok(Cell::Visited));
        assert_eq!(grid.count(Cell::Entrance), 0);
    }

    #[test]
    fn test_explore_enclosed_entrance() {
        let grid = grid_from_rows(&["###", "#e#", "###", "xxs"]);
        let explorer = Explorer::new(&grid, &Silent, sequential());

        assert!(!explorer.explore(Position::new(1, 1)));
        assert_eq!(grid.render(), "###\n#.#\n###\nxxs\n");
        assert_eq!(explorer.report().cells_visited, 1);
    }

    #[test]
    fn test_explore_visits_every_reachable_cell_without_exit() {
        let grid = grid_from_rows(&["exxx#x", "x#xx#x", "xxx##s"]);
        let explorer = Explorer::new(&grid, &Silent, ExploreConfig::default().with_workers(3));

        assert!(!explorer.explore(Position::new(0, 0)));
        assert_eq!(grid.render(), "....#x\n.#..#x\n...##s\n");
        assert_eq!(explorer.report().cells_visited, 10);
    }

    #[test]
    fn test_explore_after_success_returns_false() {
        let grid = grid_from_rows(&["exs"]);
        let explorer = Explorer::new(&grid, &Silent, sequential());

        assert!(explorer.explore(Position::new(0, 0)));
        assert!(!explorer.explore(Position::new(0, 0)));
        assert_eq!(explorer.result().transitions(), 1);
    }

    #[test]
    fn test_explore_branch_point_queues_work() {
        let grid = grid_from_rows(&["sxexs"]);
        let explorer = Explorer::new(&grid, &Silent, sequential());

        assert!(explorer.explore(Position::new(0, 2)));

        let report = explorer.report();
        assert_eq!(report.branches_queued, 1);
        assert_eq!(report.exit, Some(Position::new(0, 0)));
        assert_eq!(explorer.result().transitions(), 1);
    }

    #[test]
    fn test_explore_full_queue_explores_inline() {
        let grid = grid_from_rows(&["xxx", "xex", "xxx"]);
        let config = sequential().with_queue_capacity(1);
        let explorer = Explorer::new(&grid, &Silent, config);

        assert!(!explorer.explore(Position::new(1, 1)));

        let report = explorer.report();
        assert!(report.branches_inlined >= 1, "the single slot should overflow");
        assert_eq!(report.cells_visited, 9);
        assert_eq!(grid.count(Cell::Visited), 9);
    }

    #[test]
    fn test_explore_out_of_bounds_start_fails_locally() {
        let grid = grid_from_rows(&["exs"]);
        let explorer = Explorer::new(&grid, &Silent, sequential());

        assert!(!explorer.explore(Position::new(5, 5)));
        assert_eq!(explorer.report().branches_failed, 1);
        assert_eq!(grid.render(), "exs\n");
    }

    #[test]
    fn test_render_failure_is_isolated_to_its_branch() {
        let grid = grid_from_rows(&["xxexs"]);
        let renderer = FailAt(Position::new(0, 1));
        let explorer = Explorer::new(&grid, &renderer, sequential());

        assert!(explorer.explore(Position::new(0, 2)));

        let report = explorer.report();
        assert_eq!(report.branches_failed, 1);
        assert_eq!(report.exit, Some(Position::new(0, 4)));
        assert_eq!(grid.cell(Position::new(0, 0)), Ok(Cell::Open));
    }

    #[test]
    fn test_panic_is_isolated_to_its_branch() {
        let grid = grid_from_rows(&["xxexs"]);
        let renderer = PanicAt(Position::new(0, 1));
        let explorer = Explorer::new(&grid, &renderer, sequential());

        assert!(explorer.explore(Position::new(0, 2)));
        assert_eq!(explorer.report().branches_failed, 1);
    }

    #[test]
    fn test_render_failure_keeps_backlogged_branches() {
        let grid = grid_from_rows(&["#x#", "xes", "#x#"]);
        let renderer = FailAt(Position::new(0, 1));
        let explorer = Explorer::new(&grid, &renderer, sequential().with_queue_capacity(1));

        assert!(explorer.explore(Position::new(1, 1)));

        let report = explorer.report();
        assert_eq!(report.exit, Some(Position::new(1, 2)));
        assert_eq!(report.branches_inlined, 2);
        assert_eq!(report.branches_failed, 1);
        assert_eq!(grid.cell(Position::new(0, 1)), Ok(Cell::Visited));
    }

    #[test]
    fn test_panic_keeps_backlogged_branches() {
        let grid = grid_from_rows(&["#x#", "xes", "#x#"]);
        let renderer = PanicAt(Position::new(0, 1));
        let explorer = Explorer::new(&grid, &renderer, sequential().with_queue_capacity(1));

        assert!(explorer.explore(Position::new(1, 1)));

        let report = explorer.report();
        assert_eq!(report.exit, Some(Position::new(1, 2)));
        assert_eq!(report.branches_failed, 1);
    }

    #[test]
    fn test_failures_under_backpressure_with_many_workers() {
        let fail = FailAt(Position::new(2, 2));
        let panic = PanicAt(Position::new(2, 2));
        let renderers: [&dyn Render; 2] = [&fail, &panic];

        for renderer in renderers {
            let grid = grid_from_rows(&["exxxx", "xxxxx", "xxxxx", "xxxxx", "xxxxx"]);
            let config = ExploreConfig::default()
                .with_workers(4)
                .with_queue_capacity(1);
            let explorer = Explorer::new(&grid, renderer, config);

            assert!(!explorer.explore(Position::new(0, 0)));

            let report = explorer.report();
            assert_eq!(report.branches_failed, 1);
            assert_eq!(report.cells_visited, 25);
            assert_eq!(grid.count(Cell::Visited), 25);
        }
    }

    #[test]
    fn test_panic_message() {
        let static_payload: Box<dyn Any + Send> = Box::new("static message");
        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        let other_payload: Box<dyn Any + Send> = Box::new(42_u8);

        assert_eq!(panic_message(&*static_payload), "static message");
        assert_eq!(panic_message(&*owned_payload), "owned message");
        assert_eq!(panic_message(&*other_payload), "unknown panic payload");
    }
}
