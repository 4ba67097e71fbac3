use std::{convert::Infallible, rc::Rc};

use tracing::trace;

use crate::interpreter::value::matrix::Matrix;

/// One reusable intermediate result.
#[derive(Debug, Clone)]
enum AuxSlot {
    Series(Rc<Vec<f64>>),
    Matrix(Rc<Matrix>),
}

/// Whether the pool is being filled for the first time or replayed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum AuxMode {
    /// First pass: every request allocates.
    #[default]
    Starting,
    /// Later passes: requests walk the slots of earlier passes in order.
    Continuing,
}

/// Counters describing how the pool has been used.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct AuxStats {
    /// Requests that needed fresh storage.
    pub allocated: usize,
    /// Requests served by overwriting an existing slot.
    pub reused:    usize,
}

/// Scratch storage for the intermediate results of one compiled statement.
///
/// Requests are served in traversal order through a cursor that
/// [`AuxPool::begin_pass`] resets. On a replay the same tree asks for the
/// same sequence of shapes, so each request finds the buffer it got last
/// time and overwrites it in place. A slot is only reused when nothing else
/// still holds its buffer and the shape matches; otherwise it is replaced
/// with fresh storage, so a pass that takes a different branch degrades to
/// allocating instead of corrupting results.
///
/// # Example
/// ```
/// use genr::interpreter::evaluator::auxiliary::AuxPool;
///
/// let mut pool = AuxPool::new();
/// for pass in 0..3 {
///     pool.begin_pass();
///     let s = pool.fill_series(4, |buf, _| buf.fill(f64::from(pass)));
///     assert_eq!(s[0], f64::from(pass));
/// }
///
/// assert_eq!(pool.stats().allocated, 1);
/// assert_eq!(pool.stats().reused, 2);
/// ```
#[derive(Debug, Default)]
pub struct AuxPool {
    slots:  Vec<AuxSlot>,
    cursor: usize,
    mode:   AuxMode,
    stats:  AuxStats,
}

impl AuxPool {
    /// Creates an empty pool in starting mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewinds the cursor for a new top-level pass.
    ///
    /// Must only be called between passes, never in the middle of one.
    pub fn begin_pass(&mut self) {
        if !self.slots.is_empty() {
            self.mode = AuxMode::Continuing;
        }
        self.cursor = 0;
    }

    /// The current mode.
    #[must_use]
    pub const fn mode(&self) -> AuxMode {
        self.mode
    }

    /// Usage counters.
    #[must_use]
    pub const fn stats(&self) -> AuxStats {
        self.stats
    }

    /// Number of slots held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` if no slot has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Serves a series buffer of `len` values, filled by `fill`.
    ///
    /// `fill` receives the buffer and `true` if it is freshly allocated
    /// (and so holds zeros rather than the previous pass's values).
    pub fn fill_series(&mut self, len: usize, fill: impl FnOnce(&mut [f64], bool)) -> Rc<Vec<f64>> {
        let pos = self.cursor;
        self.cursor += 1;

        if let Some(AuxSlot::Series(rc)) = self.slots.get_mut(pos)
           && rc.len() == len
           && let Some(buf) = Rc::get_mut(rc)
        {
            fill(buf, false);
            self.stats.reused += 1;
            trace!(slot = pos, "reused series slot");
            return Rc::clone(rc);
        }

        let mut buf = vec![0.0; len];
        fill(&mut buf, true);
        let rc = Rc::new(buf);
        self.store_slot(pos, AuxSlot::Series(Rc::clone(&rc)));
        rc
    }

    /// Serves a `rows` x `cols` matrix, filled by `fill`.
    ///
    /// A reused matrix has its names and observation range cleared before
    /// `fill` runs.
    pub fn fill_matrix(&mut self,
                       rows: usize,
                       cols: usize,
                       fill: impl FnOnce(&mut Matrix))
                       -> Rc<Matrix> {
        let Ok(m) = self.serve_matrix(rows, cols, fill, || {
                            Ok::<_, Infallible>(Matrix::zeros(rows, cols))
                        });
        m
    }

    /// Like [`AuxPool::fill_matrix`], for a shape chosen by the script:
    /// returns `None` instead of aborting when a new matrix of that size
    /// cannot be allocated.
    pub fn try_fill_matrix(&mut self,
                           rows: usize,
                           cols: usize,
                           fill: impl FnOnce(&mut Matrix))
                           -> Option<Rc<Matrix>> {
        self.serve_matrix(rows, cols, fill, || Matrix::try_filled(rows, cols, 0.0).ok_or(()))
            .ok()
    }

    fn serve_matrix<E>(&mut self,
                       rows: usize,
                       cols: usize,
                       fill: impl FnOnce(&mut Matrix),
                       alloc: impl FnOnce() -> Result<Matrix, E>)
                       -> Result<Rc<Matrix>, E> {
        let pos = self.cursor;
        self.cursor += 1;

        if let Some(AuxSlot::Matrix(rc)) = self.slots.get_mut(pos)
           && rc.rows() == rows
           && rc.cols() == cols
           && let Some(m) = Rc::get_mut(rc)
        {
            m.rownames = None;
            m.colnames = None;
            m.obs = None;
            fill(m);
            self.stats.reused += 1;
            trace!(slot = pos, "reused matrix slot");
            return Ok(Rc::clone(rc));
        }

        let mut m = alloc().inspect_err(|_| self.cursor = pos)?;
        fill(&mut m);
        let rc = Rc::new(m);
        self.store_slot(pos, AuxSlot::Matrix(Rc::clone(&rc)));
        Ok(rc)
    }

    /// Takes ownership of a matrix computed elsewhere, such as a product or
    /// an inverse, and records it as the next slot.
    pub fn adopt_matrix(&mut self, m: Matrix) -> Rc<Matrix> {
        let pos = self.cursor;
        self.cursor += 1;
        let rc = Rc::new(m);
        self.store_slot(pos, AuxSlot::Matrix(Rc::clone(&rc)));
        rc
    }

    fn store_slot(&mut self, pos: usize, slot: AuxSlot) {
        self.stats.allocated += 1;
        trace!(slot = pos, mode = ?self.mode, "allocated slot");
        if pos < self.slots.len() {
            self.slots[pos] = slot;
        } else {
            self.slots.push(slot);
        }
    }

    /// Releases every slot and returns the final counters.
    ///
    /// Values already handed out stay alive for as long as something holds
    /// them; only the pool's own references are dropped.
    pub fn destroy(self) -> AuxStats {
        trace!(slots = self.slots.len(),
               allocated = self.stats.allocated,
               reused = self.stats.reused,
               "destroyed auxiliary pool");
        self.stats
    }
}
