pub mod min_heap;

pub use min_heap::{by_horizontal_distance, horizontal_distance_squared, MinHeap};
