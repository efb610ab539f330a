use std::ops::RangeInclusive;

/// Restricts `value` to `min..=max`, both bounds inclusive.
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// A value pinned to an inclusive range. Out-of-range input is clamped both
/// at construction and on every [`Clamp::set`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clamp<T> {
    value: T,
    min: T,
    max: T,
}

impl<T: PartialOrd + Copy> Clamp<T> {
    /// A reversed range is normalized so that `min <= max`.
    pub fn new(value: T, range: RangeInclusive<T>) -> Self {
        let (start, end) = range.into_inner();
        let (min, max) = if start <= end { (start, end) } else { (end, start) };
        Self {
            value: clamp(value, min, max),
            min,
            max,
        }
    }

    pub fn get(&self) -> T {
        self.value
    }

    pub fn set(&mut self, value: T) {
        self.value = clamp(value, self.min, self.max);
    }

    pub fn range(&self) -> RangeInclusive<T> {
        self.min..=self.max
    }
}
