use serde::Serialize;

/// Displayed value range of one plot axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub lo: f64,
    pub hi: f64,
}

impl AxisRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn union(self, other: AxisRange) -> AxisRange {
        AxisRange {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }
}

/// `[min - 10%|min|, max + 10%|max|]` over every finite value.
pub fn window_range<I>(values: I) -> Option<AxisRange>
where
    I: IntoIterator<Item = f64>,
{
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    Some(AxisRange {
        lo: lo - 0.1 * lo.abs(),
        hi: hi + 0.1 * hi.abs(),
    })
}

/// Range that only ever widens, so the axis never flickers back after an
/// outlier has been seen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowOnlyRange {
    current: Option<AxisRange>,
}

impl GrowOnlyRange {
    pub fn seeded(initial: AxisRange) -> Self {
        Self {
            current: Some(initial),
        }
    }

    pub fn widen(&mut self, window: Option<AxisRange>) -> Option<AxisRange> {
        self.current = match (self.current, window) {
            (Some(cur), Some(w)) => Some(cur.union(w)),
            (cur, w) => cur.or(w),
        };
        self.current
    }

    pub fn current(&self) -> Option<AxisRange> {
        self.current
    }
}
