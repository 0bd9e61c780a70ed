//! Time-series buffer — history container with two addressing conventions.
//!
//! Strategy code addresses values by "bars ago" (series mode) or
//! chronologically (non-series mode). The most recent, still-forming value
//! lives in a separate pending slot so completed history is never partially
//! mutated.
//!
//! Ownership is plain Rust move semantics: storage is never duplicated, and
//! handing a freshly built buffer to long-lived storage transfers the backing
//! allocation instead of cloning it. Shared readers go through `&self`.

use std::cell::Cell;

pub struct TimeSeriesBuffer<T> {
    data: Vec<T>,
    current: T,
    series: Cell<bool>,
}

impl<T: Clone + Default> TimeSeriesBuffer<T> {
    /// Empty buffer in series mode (index 0 = pending current value).
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            current: T::default(),
            series: Cell::new(true),
        }
    }

    /// Number of *stored* (completed) elements; the pending slot is extra.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flip the addressing convention. O(1), no data movement. The flag uses
    /// interior mutability so shared readers can pick their own convention.
    pub fn set_series_mode(&self, series: bool) {
        self.series.set(series);
    }

    pub fn is_series(&self) -> bool {
        self.series.get()
    }

    /// Map a logical index onto the pending slot (`None`) or a storage
    /// position (`Some`). Out-of-range indices are a contract violation.
    fn slot(&self, i: usize) -> Option<usize> {
        let len = self.data.len();
        if i > len {
            panic!(
                "time-series index {i} out of range (len {len}, series={})",
                self.series.get()
            );
        }
        if self.series.get() {
            if i == 0 { None } else { Some(len - i) }
        } else if i == len {
            None
        } else {
            Some(i)
        }
    }

    /// Read under the active addressing mode. Panics on out-of-range access.
    pub fn get(&self, i: usize) -> &T {
        match self.slot(i) {
            None => &self.current,
            Some(pos) => &self.data[pos],
        }
    }

    /// Mutable access under the active addressing mode.
    pub fn get_mut(&mut self, i: usize) -> &mut T {
        match self.slot(i) {
            None => &mut self.current,
            Some(pos) => &mut self.data[pos],
        }
    }

    /// The pending (still-forming) value.
    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn set_current(&mut self, value: T) {
        self.current = value;
    }

    /// Append a completed element to history.
    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }

    /// Commit the pending value to history and reset the pending slot.
    pub fn commit(&mut self) {
        let value = std::mem::take(&mut self.current);
        self.data.push(value);
    }

    /// Resize stored history. Growing past capacity with a positive
    /// `reserve_hint` pre-reserves `new_len + reserve_hint` slots to amortize
    /// bar-by-bar growth. Shrinking drops trailing elements under the active
    /// mode: oldest in series mode, newest otherwise.
    pub fn resize(&mut self, new_len: usize, reserve_hint: usize) {
        let len = self.data.len();
        if new_len > self.data.capacity() && reserve_hint > 0 {
            self.data.reserve(new_len + reserve_hint - len);
        }
        if new_len >= len {
            self.data.resize(new_len, T::default());
        } else if self.series.get() {
            self.data.drain(..len - new_len);
        } else {
            self.data.truncate(new_len);
        }
    }

    /// Overwrite every stored slot and the pending slot. Length unchanged.
    pub fn fill(&mut self, value: T) {
        for slot in &mut self.data {
            *slot = value.clone();
        }
        self.current = value;
    }

    /// Chronological view of stored history (oldest first), pending excluded.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }
}

impl<T: Clone + Default> Default for TimeSeriesBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Default> FromIterator<T> for TimeSeriesBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buf = Self::new();
        buf.data = iter.into_iter().collect();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TimeSeriesBuffer<f64> {
        // stored oldest→newest: 1, 2, 3; pending: 4
        let mut buf: TimeSeriesBuffer<f64> = [1.0, 2.0, 3.0].into_iter().collect();
        buf.set_current(4.0);
        buf
    }

    #[test]
    fn test_series_addressing() {
        let buf = sample();
        assert!(buf.is_series());
        assert_eq!(*buf.get(0), 4.0);
        assert_eq!(*buf.get(1), 3.0);
        assert_eq!(*buf.get(2), 2.0);
        assert_eq!(*buf.get(3), 1.0);
    }

    #[test]
    fn test_non_series_addressing() {
        let buf = sample();
        buf.set_series_mode(false);
        assert_eq!(*buf.get(0), 1.0);
        assert_eq!(*buf.get(2), 3.0);
        assert_eq!(*buf.get(3), 4.0); // index == len maps to pending
    }

    #[test]
    fn test_mode_flip_is_pure_relabeling() {
        let buf = sample();
        let newest = *buf.get(1);
        buf.set_series_mode(false);
        assert_eq!(*buf.get(buf.len() - 1), newest);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_access_panics() {
        let buf = sample();
        buf.get(4);
    }

    #[test]
    fn test_resize_then_fill_round_trip() {
        let mut buf: TimeSeriesBuffer<f64> = TimeSeriesBuffer::new();
        buf.resize(5, 8);
        buf.fill(7.5);
        for i in 0..=5 {
            assert_eq!(*buf.get(i), 7.5);
        }
        buf.set_series_mode(false);
        for i in 0..=5 {
            assert_eq!(*buf.get(i), 7.5);
        }
    }

    #[test]
    fn test_resize_reserves_past_requested() {
        let mut buf: TimeSeriesBuffer<f64> = TimeSeriesBuffer::new();
        buf.resize(4, 16);
        assert_eq!(buf.len(), 4);
        assert!(buf.capacity() >= 20);
    }

    #[test]
    fn test_shrink_follows_mode() {
        let mut buf = sample();
        buf.resize(2, 0); // series mode: drop oldest
        assert_eq!(buf.as_slice(), &[2.0, 3.0]);

        let mut buf = sample();
        buf.set_series_mode(false);
        buf.resize(2, 0); // non-series: drop newest
        assert_eq!(buf.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_commit_moves_pending_into_history() {
        let mut buf = sample();
        buf.commit();
        assert_eq!(buf.len(), 4);
        assert_eq!(*buf.get(1), 4.0);
        assert_eq!(*buf.get(0), 0.0); // pending reset
    }

    #[test]
    fn test_move_preserves_backing_storage() {
        let buf = sample();
        let ptr = buf.as_slice().as_ptr();
        let moved = buf; // ownership transfer, no duplication
        assert_eq!(moved.as_slice().as_ptr(), ptr);
    }
}
