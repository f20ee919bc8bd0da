//! Source of randomness for synthesized record fields.

use rand::Rng;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Uniform integer source.
///
/// Every synthesized value is drawn through this trait so a batch can be
/// reproduced from a seed or scripted in tests.
pub trait RandomSource: Send {
    /// Uniform integer in `[min, max]`. Returns `min` when `max < min`.
    fn int_in(&mut self, min: i64, max: i64) -> i64;

    /// Uniformly chosen element of a non-empty slice.
    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T
    where
        Self: Sized,
    {
        let idx = self.int_in(0, items.len() as i64 - 1);
        &items[idx as usize]
    }

    /// Upper-case alphanumeric code of `len` characters.
    fn code(&mut self, len: usize) -> String
    where
        Self: Sized,
    {
        (0..len)
            .map(|_| char::from(*self.pick(ALPHANUMERIC)))
            .collect()
    }
}

impl<R: Rng + Send> RandomSource for R {
    fn int_in(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.gen_range(min..=max)
    }
}

/// Replays a fixed list of values, cycling when exhausted.
///
/// Each value is folded into the requested range, so `0` always yields the
/// lower bound.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<i64>,
    pos: usize,
}

impl ScriptedRandom {
    pub fn new(values: Vec<i64>) -> Self {
        Self { values, pos: 0 }
    }

    /// Always returns the lower bound.
    pub fn lowest() -> Self {
        Self::new(vec![0])
    }
}

impl RandomSource for ScriptedRandom {
    fn int_in(&mut self, min: i64, max: i64) -> i64 {
        if max <= min || self.values.is_empty() {
            return min;
        }
        let value = self.values[self.pos % self.values.len()];
        self.pos += 1;
        min + value.rem_euclid(max - min + 1)
    }
}
