//! Array-backed binary min-heap with a pluggable comparator.
//!
//! The water surface uses it to rank vertices by horizontal distance to a
//! query point when it falls back to nearest-vertex plane fitting.

use std::cmp::Ordering;

use bevy::math::Vec3;

use crate::constants::MIN_HEAP_INITIAL_CAPACITY;
use crate::error::{BuoyancyError, Result};

/// Binary min-heap ordered by `compare`.
///
/// Ties are broken arbitrarily. The backing storage doubles when full and
/// shrinks back to its initial capacity on [`MinHeap::clear`].
pub struct MinHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    items: Vec<T>,
    initial_capacity: usize,
    compare: F,
}

impl<T: Ord> MinHeap<T, fn(&T, &T) -> Ordering> {
    /// Heap using the natural order of `T`.
    pub fn new() -> Self {
        Self::with_comparator(T::cmp)
    }
}

impl<T: Ord> Default for MinHeap<T, fn(&T, &T) -> Ordering> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> MinHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    pub fn with_comparator(compare: F) -> Self {
        Self::with_capacity_and_comparator(MIN_HEAP_INITIAL_CAPACITY, compare)
    }

    pub fn with_capacity_and_comparator(capacity: usize, compare: F) -> Self {
        let initial_capacity = capacity.max(1);
        Self {
            items: Vec::with_capacity(initial_capacity),
            initial_capacity,
            compare,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current size of the backing storage.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Inserts an item in `O(log n)` amortized.
    pub fn add(&mut self, item: T) {
        if self.items.len() == self.items.capacity() {
            let grow_by = self.items.capacity().max(self.initial_capacity);
            self.items.reserve_exact(grow_by);
        }
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    /// Returns the minimal element without removing it.
    pub fn peek(&self) -> Result<&T> {
        self.items.first().ok_or(BuoyancyError::EmptyQueue)
    }

    /// Removes and returns the minimal element.
    pub fn remove_min(&mut self) -> Result<T> {
        if self.items.is_empty() {
            return Err(BuoyancyError::EmptyQueue);
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let min = self.items.pop().ok_or(BuoyancyError::EmptyQueue)?;
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        Ok(min)
    }

    /// Empties the heap and releases storage beyond the initial capacity.
    pub fn clear(&mut self) {
        self.items = Vec::with_capacity(self.initial_capacity);
    }

    fn less(&self, a: usize, b: usize) -> bool {
        (self.compare)(&self.items[a], &self.items[b]) == Ordering::Less
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.less(index, parent) {
                break;
            }
            self.items.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.items.swap(index, smallest);
            index = smallest;
        }
    }
}

/// Squared distance between two points projected onto the horizontal plane.
pub fn horizontal_distance_squared(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// Comparator ranking points by horizontal distance to `reference`,
/// ignoring height.
pub fn by_horizontal_distance(reference: Vec3) -> impl Fn(&Vec3, &Vec3) -> Ordering {
    move |a, b| {
        horizontal_distance_squared(*a, reference)
            .total_cmp(&horizontal_distance_squared(*b, reference))
    }
}
