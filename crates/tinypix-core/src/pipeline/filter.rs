//! The size predicate.

/// Selects images with at least one dimension under `max_size` pixels.
#[derive(Debug, Clone, Copy)]
pub struct SizeFilter {
    max_size: u32,
}

impl SizeFilter {
    pub fn new(max_size: u32) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// True when width or height is strictly below the threshold.
    pub fn is_small(&self, width: u32, height: u32) -> bool {
        width < self.max_size || height < self.max_size
    }
}
