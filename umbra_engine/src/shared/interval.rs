use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

/// Represents a interval of values. There may/not be a `start` and/or `end` bound.
///
/// # Requirements
/// It is a logic error for `start > end`. This requirement is not enforced.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct Interval<T> {
    pub start: Option<T>,
    pub end: Option<T>,
}

impl<T> From<RangeInclusive<T>> for Interval<T> {
    fn from(value: RangeInclusive<T>) -> Self {
        let (min, max) = value.into_inner();
        Self {
            start: Some(min),
            end: Some(max),
        }
    }
}

impl<T: PartialOrd> Interval<T> {
    pub fn contains(&self, item: &T) -> bool {
        match self {
            Self {
                start: Some(start),
                end: Some(end),
            } => start <= item && item <= end,
            Self {
                start: Some(start),
                end: None,
            } => start <= item,
            Self {
                start: None,
                end: Some(end),
            } => item <= end,
            Self { start: None, end: None } => true,
        }
    }
}

impl<T: PartialOrd> std::ops::BitAnd for Interval<T> {
    type Output = Interval<T>;

    /// Intersection of both intervals: the larger start and the smaller end
    fn bitand(self, other: Self) -> Self::Output {
        let start = match (self.start, other.start) {
            (None, start) | (start, None) => start,
            (Some(a), Some(b)) => Some(if a < b { b } else { a }),
        };
        let end = match (self.end, other.end) {
            (None, end) | (end, None) => end,
            (Some(a), Some(b)) => Some(if a < b { a } else { b }),
        };

        Self { start, end }
    }
}

impl<T: Display> Display for Interval<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(start) = &self.start {
            write!(f, "{start}")?;
        }
        write!(f, "..")?;
        if let Some(end) = &self.end {
            write!(f, "{end}")?
        }
        Ok(())
    }
}
