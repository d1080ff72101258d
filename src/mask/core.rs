//! The mask handle: ownership, scheduling and synchronization.

use std::convert::Infallible;
use std::fmt;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::MaskError;
use super::grid::Grid;
use super::symmetry::SymmetryGeometry;
use super::value::MaskValue;
use crate::debug::{DebugFrame, VisualDebugger};
use crate::pipeline::{NodeId, PipelineContext};
use crate::schema::{SymmetrySettings, SymmetryType};

/// Materialized data of a mask, owned exclusively by that mask.
pub(crate) struct MaskState<T> {
    pub(crate) grid: Grid<T>,
    pub(crate) rng: Option<ChaCha8Rng>,
}

/// Pipeline bookkeeping: the last node that wrote the mask and every node
/// enqueued since then that reads it.
#[derive(Default)]
struct Chain {
    tail: Option<NodeId>,
    readers: Vec<NodeId>,
}

struct DebugHook {
    debugger: Arc<dyn VisualDebugger>,
    mask: String,
    operation: &'static str,
}

impl DebugHook {
    fn report(&self, size: usize, parallel: bool) {
        self.debugger.visualize(&DebugFrame {
            mask: &self.mask,
            operation: self.operation,
            size,
            parallel,
        });
    }
}

/// Square grid of values with symmetry, a seeded RNG and optional pipeline
/// membership.
///
/// Every mutating method returns the mask for chaining. Outside a pipeline
/// operations run immediately on the calling thread. Inside a
/// [`PipelineContext`] each operation becomes a node that runs on the
/// context's workers once its dependencies are done; reads such as
/// [`get`](Self::get) or [`to_hash`](Self::to_hash) block until the mask's
/// chain has caught up.
pub struct Mask<T: MaskValue> {
    state: Arc<RwLock<MaskState<T>>>,
    chain: Mutex<Chain>,
    planned_size: usize,
    seed: Option<u64>,
    derivations: AtomicU64,
    symmetry_settings: SymmetrySettings,
    name: String,
    pipeline: Option<PipelineContext>,
    debugger: Option<Arc<dyn VisualDebugger>>,
}

impl<T: MaskValue> fmt::Debug for Mask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mask")
            .field("name", &self.name)
            .field("size", &self.planned_size)
            .field("seed", &self.seed)
            .field("symmetry_settings", &self.symmetry_settings)
            .field("parallel", &self.is_parallel())
            .finish()
    }
}

/// Mix a root seed with a counter into an independent seed.
fn derive_seed(seed: u64, counter: u64) -> u64 {
    let mut z = seed ^ counter.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl<T: MaskValue> Mask<T> {
    /// Create a synchronous mask filled with the default value.
    ///
    /// Without a seed the mask is non-random: random operations fail with
    /// [`MaskError::Unseeded`].
    pub fn new(
        size: usize,
        seed: Option<u64>,
        symmetry_settings: SymmetrySettings,
        name: impl Into<String>,
    ) -> Self {
        Self::from_grid(Grid::new(size, symmetry_settings), seed, name)
    }

    /// Wrap an existing grid.
    pub fn from_grid(grid: Grid<T>, seed: Option<u64>, name: impl Into<String>) -> Self {
        Self {
            planned_size: grid.size(),
            symmetry_settings: grid.symmetry_settings(),
            state: Arc::new(RwLock::new(MaskState {
                grid,
                rng: seed.map(ChaCha8Rng::seed_from_u64),
            })),
            chain: Mutex::new(Chain::default()),
            seed,
            derivations: AtomicU64::new(0),
            name: name.into(),
            pipeline: None,
            debugger: None,
        }
    }

    /// Move the mask into a pipeline. Later operations are deferred.
    pub fn in_pipeline(mut self, pipeline: &PipelineContext) -> Self {
        self.pipeline = Some(pipeline.clone());
        self
    }

    pub fn with_debugger(mut self, debugger: Arc<dyn VisualDebugger>) -> Self {
        self.debugger = Some(debugger);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Planned size: the size after every enqueued operation has run.
    pub fn size(&self) -> usize {
        self.planned_size
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn symmetry_settings(&self) -> SymmetrySettings {
        self.symmetry_settings
    }

    /// Whether operations are deferred to a pipeline.
    pub fn is_parallel(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn pipeline(&self) -> Option<&PipelineContext> {
        self.pipeline.as_ref()
    }

    /// Symmetry geometry at the planned size.
    pub fn geometry(&self) -> SymmetryGeometry {
        SymmetryGeometry::new(self.planned_size, self.symmetry_settings)
    }

    pub fn symmetry_points(
        &self,
        x: usize,
        y: usize,
        symmetry_type: SymmetryType,
    ) -> Vec<(usize, usize)> {
        self.geometry().symmetry_points(x, y, symmetry_type)
    }

    /// Seed for a mask derived from this one. Derived on the calling thread
    /// so it never depends on scheduling.
    pub(crate) fn next_seed(&self) -> Option<u64> {
        self.seed.map(|seed| {
            let counter = self.derivations.fetch_add(1, Ordering::Relaxed) + 1;
            derive_seed(seed, counter)
        })
    }

    /// Empty mask sharing this mask's pipeline, debugger and symmetry.
    pub(crate) fn sibling<U: MaskValue>(&self, size: usize, name: String) -> Mask<U> {
        let mut mask = Mask::new(size, self.next_seed(), self.symmetry_settings, name);
        mask.pipeline = self.pipeline.clone();
        mask.debugger = self.debugger.clone();
        mask
    }

    /// New mask in `source`'s pipeline whose grid is computed from `source`.
    pub(crate) fn derived<U: MaskValue>(
        source: &Mask<U>,
        operation: &'static str,
        name: String,
        f: impl FnOnce(&Grid<U>) -> Grid<T> + Send + 'static,
    ) -> Mask<T> {
        let mut mask = source.sibling::<T>(source.size(), name);
        let Ok(()) = mask.schedule_reading(
            operation,
            source,
            move |state, source| -> Result<(), Infallible> {
                state.grid = f(source);
                Ok(())
            },
        );
        mask
    }

    /// Copy with a derived seed, in the same pipeline.
    pub fn copy(&self) -> Mask<T> {
        self.copy_named(format!("{}-copy", self.name))
    }

    pub fn copy_named(&self, name: impl Into<String>) -> Mask<T> {
        let mut copy = self.sibling::<T>(self.planned_size, name.into());
        let Ok(()) = copy.schedule_reading(
            "copy",
            self,
            |state, source| -> Result<(), Infallible> {
                state.grid = source.clone();
                Ok(())
            },
        );
        copy
    }

    /// Block until every operation enqueued on this mask has run.
    pub fn await_mask(&self) -> Result<&Self, MaskError> {
        if let Some(pipeline) = &self.pipeline {
            let tail = self.chain.lock().tail;
            if let Some(tail) = tail {
                pipeline.wait_for(tail)?;
            }
        }
        Ok(self)
    }

    /// Await, then return an isolated synchronous copy.
    pub fn final_mask(&self) -> Result<Mask<T>, MaskError> {
        let grid = self.to_grid()?;
        let mut mask = Mask::from_grid(grid, self.next_seed(), format!("{}-final", self.name));
        mask.debugger = self.debugger.clone();
        Ok(mask)
    }

    /// Await, then clone the grid.
    pub fn to_grid(&self) -> Result<Grid<T>, MaskError> {
        self.read(Grid::clone)
    }

    /// Run `f` on the up-to-date grid.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Grid<T>) -> R) -> Result<R, MaskError> {
        self.await_mask()?;
        let state = self.state.read();
        Ok(f(&state.grid))
    }

    fn read_or_panic<R>(&self, f: impl FnOnce(&Grid<T>) -> R) -> R {
        match self.read(f) {
            Ok(value) => value,
            Err(err) => panic!("mask `{}` unavailable: {err}", self.name),
        }
    }

    /// Value at `(x, y)`, waiting for pending operations.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds or an operation in the
    /// mask's pipeline chain failed. Use [`to_grid`](Self::to_grid) to
    /// handle pipeline failures.
    pub fn get(&self, x: usize, y: usize) -> T {
        self.read_or_panic(|grid| grid.get(x, y))
    }

    /// Value at a signed coordinate, `None` outside the grid.
    ///
    /// # Panics
    ///
    /// Panics if an operation in the mask's pipeline chain failed.
    pub fn try_get(&self, x: i64, y: i64) -> Option<T> {
        self.read_or_panic(|grid| grid.try_get(x, y))
    }

    /// SHA-256 hex digest over the canonical spawn region.
    pub fn to_hash(&self) -> Result<String, MaskError> {
        self.read(Grid::to_hash)
    }

    /// Hand an operation to the mask's chain.
    ///
    /// Returns the node id when the mask lives in a pipeline. A failing task
    /// returns its error directly on a synchronous mask and fails the node
    /// in a pipeline.
    fn schedule<F, E>(
        &mut self,
        operation: &'static str,
        read_deps: Vec<NodeId>,
        task: F,
    ) -> Result<Option<NodeId>, E>
    where
        F: FnOnce(&mut MaskState<T>) -> Result<(), E> + Send + 'static,
        E: fmt::Display + 'static,
    {
        let hook = self.debugger.clone().map(|debugger| DebugHook {
            debugger,
            mask: self.name.clone(),
            operation,
        });

        let Some(pipeline) = &self.pipeline else {
            let mut state = self.state.write();
            task(&mut state)?;
            if let Some(hook) = hook {
                hook.report(state.grid.size(), false);
            }
            return Ok(None);
        };

        let mut deps = {
            let mut chain = self.chain.lock();
            let mut deps: Vec<NodeId> = chain.readers.drain(..).collect();
            deps.extend(chain.tail);
            deps
        };
        deps.extend(read_deps);

        let state = Arc::clone(&self.state);
        let id = pipeline.submit(
            &self.name,
            operation,
            deps,
            Box::new(move || {
                let mut state = state.write();
                if let Err(err) = task(&mut state) {
                    drop(state);
                    panic::resume_unwind(Box::new(err.to_string()));
                }
                if let Some(hook) = hook {
                    hook.report(state.grid.size(), true);
                }
            }),
        );
        self.chain.lock().tail = Some(id);
        Ok(Some(id))
    }

    fn schedule_reading<U, F, E>(
        &mut self,
        operation: &'static str,
        source: &Mask<U>,
        task: F,
    ) -> Result<(), E>
    where
        U: MaskValue,
        F: FnOnce(&mut MaskState<T>, &Grid<U>) -> Result<(), E> + Send + 'static,
        E: fmt::Display + 'static,
    {
        let shared = Arc::clone(&source.state);
        let deps = source.chain.lock().tail.into_iter().collect();
        let id = self.schedule(operation, deps, move |state| {
            let source = shared.read();
            task(state, &source.grid)
        })?;
        if let Some(id) = id {
            source.chain.lock().readers.push(id);
        }
        Ok(())
    }

    fn schedule_reading2<U, V, F>(
        &mut self,
        operation: &'static str,
        first: &Mask<U>,
        second: &Mask<V>,
        task: F,
    ) -> Result<(), MaskError>
    where
        U: MaskValue,
        V: MaskValue,
        F: FnOnce(&mut MaskState<T>, &Grid<U>, &Grid<V>) -> Result<(), MaskError> + Send + 'static,
    {
        let a = Arc::clone(&first.state);
        let b = Arc::clone(&second.state);
        let deps = [first.chain.lock().tail, second.chain.lock().tail]
            .into_iter()
            .flatten()
            .collect();
        let id = self.schedule(operation, deps, move |state| {
            let a = a.read();
            let b = b.read();
            task(state, &a.grid, &b.grid)
        })?;
        if let Some(id) = id {
            first.chain.lock().readers.push(id);
            second.chain.lock().readers.push(id);
        }
        Ok(())
    }

    pub(crate) fn enqueue(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Grid<T>) + Send + 'static,
    ) -> &mut Self {
        let Ok(_) = self.schedule(operation, Vec::new(), |state| -> Result<(), Infallible> {
            f(&mut state.grid);
            Ok(())
        });
        self
    }

    /// Enqueue an operation that can fail part way. The grid is expected to
    /// be left untouched on failure.
    pub(crate) fn try_enqueue(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Grid<T>) -> Result<(), MaskError> + Send + 'static,
    ) -> Result<&mut Self, MaskError> {
        self.schedule(operation, Vec::new(), |state| f(&mut state.grid))?;
        Ok(self)
    }

    pub(crate) fn require_seed(&self) -> Result<(), MaskError> {
        match self.seed {
            Some(_) => Ok(()),
            None => Err(MaskError::Unseeded(self.name.clone())),
        }
    }

    /// Enqueue an operation that draws from the mask's RNG.
    pub(crate) fn enqueue_random(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Grid<T>, &mut ChaCha8Rng) + Send + 'static,
    ) -> Result<&mut Self, MaskError> {
        self.require_seed()?;
        self.schedule(operation, Vec::new(), |state| {
            if let Some(rng) = state.rng.as_mut() {
                f(&mut state.grid, rng);
            }
            Ok::<(), MaskError>(())
        })?;
        Ok(self)
    }

    /// Enqueue an operation reading a compatible mask.
    pub(crate) fn enqueue_with<U: MaskValue>(
        &mut self,
        operation: &'static str,
        other: &Mask<U>,
        f: impl FnOnce(&mut Grid<T>, &Grid<U>) + Send + 'static,
    ) -> Result<&mut Self, MaskError> {
        self.try_enqueue_with(operation, other, |grid, source| {
            f(grid, source);
            Ok(())
        })
    }

    pub(crate) fn try_enqueue_with<U: MaskValue>(
        &mut self,
        operation: &'static str,
        other: &Mask<U>,
        f: impl FnOnce(&mut Grid<T>, &Grid<U>) -> Result<(), MaskError> + Send + 'static,
    ) -> Result<&mut Self, MaskError> {
        self.check_compatible(other)?;
        self.schedule_reading(operation, other, |state, source| f(&mut state.grid, source))?;
        Ok(self)
    }

    /// Enqueue an operation reading a mask of any size in the same
    /// pipeline, with access to the RNG when the mask is seeded.
    pub(crate) fn enqueue_reading<U: MaskValue>(
        &mut self,
        operation: &'static str,
        other: &Mask<U>,
        f: impl FnOnce(&mut Grid<T>, &Grid<U>, Option<&mut ChaCha8Rng>) + Send + 'static,
    ) -> Result<&mut Self, MaskError> {
        self.check_pipeline(other)?;
        self.schedule_reading(operation, other, |state, source| {
            f(&mut state.grid, source, state.rng.as_mut());
            Ok::<(), MaskError>(())
        })?;
        Ok(self)
    }

    /// Enqueue a fallible operation reading a mask of any size in the same
    /// pipeline.
    pub(crate) fn try_enqueue_reading<U: MaskValue>(
        &mut self,
        operation: &'static str,
        other: &Mask<U>,
        f: impl FnOnce(&mut Grid<T>, &Grid<U>) -> Result<(), MaskError> + Send + 'static,
    ) -> Result<&mut Self, MaskError> {
        self.check_pipeline(other)?;
        self.schedule_reading(operation, other, |state, source| f(&mut state.grid, source))?;
        Ok(self)
    }

    /// Enqueue an operation reading two compatible masks.
    pub(crate) fn enqueue_with2<U: MaskValue, V: MaskValue>(
        &mut self,
        operation: &'static str,
        first: &Mask<U>,
        second: &Mask<V>,
        f: impl FnOnce(&mut Grid<T>, &Grid<U>, &Grid<V>) + Send + 'static,
    ) -> Result<&mut Self, MaskError> {
        self.try_enqueue_with2(operation, first, second, |grid, a, b| {
            f(grid, a, b);
            Ok(())
        })
    }

    pub(crate) fn try_enqueue_with2<U: MaskValue, V: MaskValue>(
        &mut self,
        operation: &'static str,
        first: &Mask<U>,
        second: &Mask<V>,
        f: impl FnOnce(&mut Grid<T>, &Grid<U>, &Grid<V>) -> Result<(), MaskError> + Send + 'static,
    ) -> Result<&mut Self, MaskError> {
        self.check_compatible(first)?;
        self.check_compatible(second)?;
        self.schedule_reading2(operation, first, second, move |state, a, b| {
            f(&mut state.grid, a, b)
        })?;
        Ok(self)
    }

    /// Enqueue an operation reading two masks of any size in the same
    /// pipeline, with access to the RNG when the mask is seeded.
    pub(crate) fn enqueue_reading2<U: MaskValue, V: MaskValue>(
        &mut self,
        operation: &'static str,
        first: &Mask<U>,
        second: &Mask<V>,
        f: impl FnOnce(&mut Grid<T>, &Grid<U>, &Grid<V>, Option<&mut ChaCha8Rng>) + Send + 'static,
    ) -> Result<&mut Self, MaskError> {
        self.check_pipeline(first)?;
        self.check_pipeline(second)?;
        self.schedule_reading2(operation, first, second, move |state, a, b| {
            f(&mut state.grid, a, b, state.rng.as_mut());
            Ok(())
        })?;
        Ok(self)
    }

    fn check_pipeline<U: MaskValue>(&self, other: &Mask<U>) -> Result<(), MaskError> {
        match (&self.pipeline, &other.pipeline) {
            (None, None) => Ok(()),
            (Some(a), Some(b)) if a.same_pipeline(b) => Ok(()),
            _ => Err(MaskError::PipelineMismatch {
                left: self.name.clone(),
                right: other.name.clone(),
            }),
        }
    }

    /// Same size, same symmetry settings and same pipeline membership.
    pub fn check_compatible<U: MaskValue>(&self, other: &Mask<U>) -> Result<(), MaskError> {
        self.check_pipeline(other)?;
        if self.planned_size != other.planned_size {
            return Err(MaskError::SizeMismatch {
                left: self.planned_size,
                right: other.planned_size,
            });
        }
        if self.symmetry_settings != other.symmetry_settings {
            return Err(MaskError::SymmetryMismatch {
                left: self.symmetry_settings,
                right: other.symmetry_settings,
            });
        }
        Ok(())
    }

    /// # Panics
    ///
    /// Panics (on the executing thread) if the coordinate is out of bounds.
    pub fn set(&mut self, x: usize, y: usize, value: T) -> &mut Self {
        self.enqueue("set", move |grid| grid.set(x, y, value))
    }

    pub fn apply_symmetry(&mut self, symmetry_type: SymmetryType) -> &mut Self {
        self.enqueue("apply_symmetry", move |grid| grid.apply_symmetry(symmetry_type))
    }

    pub fn apply_symmetry_reverse(&mut self, symmetry_type: SymmetryType) -> &mut Self {
        self.enqueue("apply_symmetry_reverse", move |grid| {
            grid.apply_symmetry_reverse(symmetry_type)
        })
    }

    /// Nearest-neighbour resize, then spawn symmetry.
    pub fn resample(&mut self, size: usize) -> &mut Self {
        self.planned_size = size;
        self.enqueue("resample", move |grid| grid.resample(size))
    }

    /// Enlarge and smooth the blocky result.
    pub fn interpolate(&mut self, size: usize) -> &mut Self {
        self.planned_size = size;
        self.enqueue("interpolate", move |grid| grid.interpolate(size))
    }

    /// Blur, then shrink.
    pub fn decimate(&mut self, size: usize) -> &mut Self {
        self.planned_size = size;
        self.enqueue("decimate", move |grid| grid.decimate(size))
    }
}
