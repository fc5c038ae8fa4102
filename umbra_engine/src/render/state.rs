use crate::core::types::Number;

/// Size of the per-thread scratch buffer that materials may use during a query
pub const SCRATCH_SIZE: usize = 1024;

type Scratch = Box<[u8; SCRATCH_SIZE]>;

/// Mutable state owned by a single render thread, passed into every query it makes.
///
/// Never share one between threads.
#[derive(Clone, Debug)]
pub struct RenderState {
    /// Sample time in `0..=1`, for moving geometry
    pub time: Number,
    /// How many nested rays deep the current query is
    pub ray_level: u32,
    scratch: Scratch,
    /// Buffers handed out to nested queries, kept for reuse
    spare: Vec<Scratch>,
}

impl Default for RenderState {
    fn default() -> Self { Self::new() }
}

impl RenderState {
    pub fn new() -> Self {
        Self {
            time: 0.,
            ray_level: 0,
            scratch: Box::new([0; SCRATCH_SIZE]),
            spare: Vec::new(),
        }
    }

    pub fn scratch(&self) -> &[u8; SCRATCH_SIZE] { &self.scratch }

    pub fn scratch_mut(&mut self) -> &mut [u8; SCRATCH_SIZE] { &mut self.scratch }

    /// Runs `f` with a separate scratch buffer, then puts the caller's buffer back untouched
    pub fn with_nested_scratch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let nested = self
            .spare
            .pop()
            .unwrap_or_else(|| Box::new([0; SCRATCH_SIZE]));
        let outer = std::mem::replace(&mut self.scratch, nested);
        let result = f(self);
        let nested = std::mem::replace(&mut self.scratch, outer);
        self.spare.push(nested);
        result
    }
}
