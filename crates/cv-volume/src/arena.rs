//! Dense per-point storage for state and reaction blocks.

use cv_core::{CvError, CvResult};

/// Items keyed by `(time, length)` position, allocated once and never resized.
///
/// 0D volumes use a length extent of one.
pub struct PointArena<T> {
    nt: usize,
    nx: usize,
    items: Vec<T>,
}

impl<T> PointArena<T> {
    pub fn build(
        nt: usize,
        nx: usize,
        mut make: impl FnMut(usize, usize) -> CvResult<T>,
    ) -> CvResult<Self> {
        let mut items = Vec::with_capacity(nt * nx);
        for t in 0..nt {
            for x in 0..nx {
                items.push(make(t, x)?);
            }
        }
        Ok(Self { nt, nx, items })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nt, self.nx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn slot(&self, t: usize, x: usize) -> Option<usize> {
        (t < self.nt && x < self.nx).then_some(t * self.nx + x)
    }

    pub fn get(&self, t: usize, x: usize) -> Option<&T> {
        self.slot(t, x).map(|i| &self.items[i])
    }

    pub fn get_mut(&mut self, t: usize, x: usize) -> Option<&mut T> {
        self.slot(t, x).map(|i| &mut self.items[i])
    }

    pub fn at(&self, t: usize, x: usize) -> CvResult<&T> {
        self.get(t, x)
            .ok_or_else(|| CvError::internal(format!("no block at point ({t}, {x})")))
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let nx = self.nx;
        self.items
            .iter()
            .enumerate()
            .map(move |(i, item)| ((i / nx, i % nx), item))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = ((usize, usize), &mut T)> {
        let nx = self.nx;
        self.items
            .iter_mut()
            .enumerate()
            .map(move |(i, item)| ((i / nx, i % nx), item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_layout() {
        let arena = PointArena::build(2, 3, |t, x| Ok(t * 10 + x)).unwrap();
        assert_eq!(arena.len(), 6);
        assert_eq!(arena.get(1, 2), Some(&12));
        assert!(arena.get(2, 0).is_none());
        assert!(arena.at(0, 3).is_err());
        let keys: Vec<_> = arena.iter().map(|(k, _)| k).collect();
        assert_eq!(keys[4], (1, 1));
    }

    #[test]
    fn build_stops_on_first_error() {
        let mut calls = 0;
        let res = PointArena::<usize>::build(2, 2, |t, x| {
            calls += 1;
            if t == 1 && x == 0 {
                Err(CvError::config("boom"))
            } else {
                Ok(0)
            }
        });
        assert!(res.is_err());
        assert_eq!(calls, 3);
    }
}
