//! Binary search over monotone functions

/// Find the least `x` in `[lo, hi)` with `pred(x)` true, given that `pred`
/// is false then true over the range. Returns `hi` when no such `x` exists.
pub fn partition_point(lo: u64, hi: u64, mut pred: impl FnMut(u64) -> bool) -> u64 {
    let (mut lo, mut hi) = (lo, hi);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Invert a strictly increasing `f` over `[0, len)`: the `x` with
/// `f(x) == target`, if any.
pub fn invert_monotone(len: u64, target: u64, mut f: impl FnMut(u64) -> u64) -> Option<u64> {
    let x = partition_point(0, len, |x| f(x) >= target);
    (x < len && f(x) == target).then_some(x)
}
