//! Running sums of generator weights

use serde::{Deserialize, Serialize};

/// Compensated floating-point accumulator.
///
/// Holds the running value as an unevaluated pair `hi + lo`, where `lo`
/// carries the rounding error of every addition into `hi` (Neumaier's
/// variant of Kahan summation). This gives the sums roughly twice the
/// precision of a plain `f64` without needing a wider float type.
///
/// Addition is commutative. It is associative up to rounding of the
/// compensation term, so merged results are order-independent up to
/// floating-point rounding, not bit-exact across permutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompensatedSum {
    hi: f64,
    lo: f64,
}

impl CompensatedSum {
    /// The zero sum
    pub const ZERO: Self = Self { hi: 0.0, lo: 0.0 };

    /// Create a sum holding a single value
    pub fn new(value: f64) -> Self {
        Self { hi: value, lo: 0.0 }
    }

    /// Add a single value
    #[inline]
    pub fn add(&mut self, value: f64) {
        let (sum, err) = two_sum(self.hi, value);
        self.hi = sum;
        // The error term is meaningless once the running value overflows
        if sum.is_finite() {
            self.lo += err;
        }
    }

    /// Add another compensated sum
    #[inline]
    pub fn add_sum(&mut self, other: &CompensatedSum) {
        let (sum, err) = two_sum(self.hi, other.hi);
        self.hi = sum;
        if sum.is_finite() {
            self.lo += err + other.lo;
        }
    }

    /// Best `f64` estimate of the accumulated value
    pub fn value(&self) -> f64 {
        if self.hi.is_finite() {
            self.hi + self.lo
        } else {
            self.hi
        }
    }
}

/// Error-free transformation: `a + b == sum + err` exactly.
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let sum = a + b;
    let err = if a.abs() >= b.abs() { (a - sum) + b } else { (b - sum) + a };
    (sum, err)
}

/// A single mergeable running-statistics record.
///
/// Tracks the number of observed events together with the sum and the sum
/// of squares of their weights. Weights may be negative (generators with
/// negative-weight events), so `sum` may be negative; `sum_squares` never is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    count: u64,
    sum: CompensatedSum,
    sum_squares: CompensatedSum,
}

impl Counter {
    /// Create a zero counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counter from already-accumulated parts
    pub fn from_parts(count: u64, sum: f64, sum_squares: f64) -> Self {
        Self {
            count,
            sum: CompensatedSum::new(sum),
            sum_squares: CompensatedSum::new(sum_squares),
        }
    }

    /// Zero all fields
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record one event with the given weight
    ///
    /// No validation is performed: NaN and infinite weights propagate into
    /// the sums.
    #[inline]
    pub fn observe(&mut self, weight: f64) {
        self.count += 1;
        self.sum.add(weight);
        self.sum_squares.add(weight * weight);
    }

    /// Add another counter into this one
    #[inline]
    pub fn merge(&mut self, other: &Counter) {
        self.count += other.count;
        self.sum.add_sum(&other.sum);
        self.sum_squares.add_sum(&other.sum_squares);
    }

    /// Number of observed events
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of weights
    pub fn sum(&self) -> f64 {
        self.sum.value()
    }

    /// Sum of squared weights
    pub fn sum_squares(&self) -> f64 {
        self.sum_squares.value()
    }

    /// Whether nothing has been accumulated
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_of(weights: &[f64]) -> Counter {
        let mut c = Counter::new();
        for &w in weights {
            c.observe(w);
        }
        c
    }

    fn merged(a: &Counter, b: &Counter) -> Counter {
        let mut out = *a;
        out.merge(b);
        out
    }

    #[test]
    fn test_new_counter_is_zero() {
        let c = Counter::new();
        assert_eq!(c.count(), 0);
        assert_eq!(c.sum(), 0.0);
        assert_eq!(c.sum_squares(), 0.0);
        assert!(c.is_zero());
    }

    #[test]
    fn test_observe() {
        let c = counter_of(&[1.0, 2.0, 3.0]);
        assert_eq!(c.count(), 3);
        assert_eq!(c.sum(), 6.0);
        assert_eq!(c.sum_squares(), 14.0);
    }

    #[test]
    fn test_negative_weights() {
        let c = counter_of(&[-1.5, 0.5]);
        assert_eq!(c.count(), 2);
        assert_eq!(c.sum(), -1.0);
        assert_eq!(c.sum_squares(), 2.5);
    }

    #[test]
    fn test_nan_propagates() {
        let c = counter_of(&[1.0, f64::NAN]);
        assert_eq!(c.count(), 2);
        assert!(c.sum().is_nan());
    }

    #[test]
    fn test_infinite_weight_propagates() {
        let c = counter_of(&[1.0, f64::INFINITY]);
        assert_eq!(c.sum(), f64::INFINITY);
        assert_eq!(c.sum_squares(), f64::INFINITY);

        let c = counter_of(&[f64::NEG_INFINITY]);
        assert_eq!(c.sum(), f64::NEG_INFINITY);
        assert_eq!(c.sum_squares(), f64::INFINITY);
    }

    #[test]
    fn test_overflowing_square_is_infinite() {
        let c = counter_of(&[1e200]);
        assert_eq!(c.sum(), 1e200);
        assert_eq!(c.sum_squares(), f64::INFINITY);
        assert!(c.sum_squares() >= 0.0);

        let c = counter_of(&[f64::MAX, f64::MAX]);
        assert_eq!(c.sum(), f64::INFINITY);
    }

    #[test]
    fn test_opposite_infinities_give_nan() {
        let c = counter_of(&[f64::INFINITY, f64::NEG_INFINITY]);
        assert!(c.sum().is_nan());
        assert_eq!(c.sum_squares(), f64::INFINITY);
    }

    #[test]
    fn test_merge_with_infinite_counter() {
        let finite = counter_of(&[2.0, 3.0]);
        let infinite = counter_of(&[f64::INFINITY]);
        assert_eq!(merged(&finite, &infinite).sum(), f64::INFINITY);
        assert_eq!(merged(&infinite, &finite).sum(), f64::INFINITY);
        assert_eq!(merged(&finite, &counter_of(&[1e200])).sum_squares(), f64::INFINITY);
    }

    #[test]
    fn test_reset() {
        let mut c = counter_of(&[4.0, 5.0]);
        c.reset();
        assert!(c.is_zero());
    }

    #[test]
    fn test_observe_equals_merge_of_single() {
        for w in [0.0, 1.0, -2.5, 1e-12, 3.0e7] {
            let mut observed = Counter::new();
            observed.observe(w);

            let mut via_merge = Counter::new();
            via_merge.merge(&Counter::from_parts(1, w, w * w));

            assert_eq!(observed, via_merge);
        }
    }

    #[test]
    fn test_merge_commutative() {
        let a = counter_of(&[1.0, -0.25, 7.5]);
        let b = counter_of(&[2.0, 3.0]);
        assert_eq!(merged(&a, &b), merged(&b, &a));
    }

    #[test]
    fn test_merge_associative() {
        let a = counter_of(&[1.0, 2.0]);
        let b = counter_of(&[3.0]);
        let c = counter_of(&[-4.0, 0.5]);

        let left = merged(&merged(&a, &b), &c);
        let right = merged(&a, &merged(&b, &c));

        assert_eq!(left.count(), right.count());
        assert_eq!(left.sum(), right.sum());
        assert_eq!(left.sum_squares(), right.sum_squares());
    }

    #[test]
    fn test_zero_is_identity() {
        let a = counter_of(&[1.25, 2.5]);
        assert_eq!(merged(&a, &Counter::new()), a);
        assert_eq!(merged(&Counter::new(), &a).sum(), a.sum());
        assert_eq!(merged(&Counter::new(), &a).count(), a.count());
    }

    #[test]
    fn test_compensated_sum_keeps_small_terms() {
        // 1e16 + 1.0 loses the 1.0 in plain f64 arithmetic.
        let mut sum = CompensatedSum::new(1e16);
        for _ in 0..10 {
            sum.add(1.0);
        }
        sum.add(-1e16);
        assert_eq!(sum.value(), 10.0);

        let mut naive = 1e16_f64;
        for _ in 0..10 {
            naive += 1.0;
        }
        naive -= 1e16;
        assert_ne!(naive, 10.0);
    }

    #[test]
    fn test_compensated_merge_keeps_small_terms() {
        let mut big = Counter::new();
        big.observe(1e16);
        let mut small = Counter::new();
        for _ in 0..4 {
            small.observe(1.0);
        }
        let mut negative = Counter::new();
        negative.observe(-1e16);

        let mut total = big;
        total.merge(&small);
        total.merge(&negative);
        assert_eq!(total.count(), 6);
        assert_eq!(total.sum(), 4.0);
    }
}
