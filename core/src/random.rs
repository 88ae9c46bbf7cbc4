//! Injectable source of uniform random draws.

/// Uniform random generator consumed by local rule resolution.
///
/// Replay never receives a source, so recorded turns cannot depend on one.
pub trait RandomSource {
    /// Returns a value in `0..bound`. `bound` is always greater than zero.
    fn next_index(&mut self, bound: usize) -> usize;
}

/// Deterministic source that cycles through a fixed sequence of draws.
///
/// Each stored value is reduced modulo the requested bound, which lets tests
/// pin exact outcomes without depending on a generator's internals.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    values: Vec<usize>,
    cursor: usize,
    draws: usize,
}

impl ScriptedRandom {
    /// Creates a source cycling through `values`; an empty list always yields zero.
    #[must_use]
    pub fn new(values: Vec<usize>) -> Self {
        Self {
            values,
            cursor: 0,
            draws: 0,
        }
    }

    /// Number of draws served so far.
    #[must_use]
    pub const fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomSource for ScriptedRandom {
    fn next_index(&mut self, bound: usize) -> usize {
        self.draws = self.draws.saturating_add(1);
        let Some(value) = self.values.get(self.cursor).copied() else {
            return 0;
        };
        self.cursor = (self.cursor + 1) % self.values.len();
        value % bound.max(1)
    }
}
