use std::ops::Range;

pub fn abs_diff(a: usize, b: usize) -> usize {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Splits `0..len` into `count` contiguous ranges whose sizes differ by at most
/// one; the first `len % count` ranges are the longer ones.
pub fn shard_ranges(len: usize, count: usize) -> Vec<Range<usize>> {
    let count = count.max(1);
    let (avg, extra) = (len / count, len % count);
    let mut ranges = Vec::with_capacity(count);
    let mut start = 0;
    for i in 0..count {
        let num = if i < extra { avg + 1 } else { avg };
        ranges.push(start..start + num);
        start += num;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abs_diff() {
        assert_eq!(abs_diff(3, 7), 4);
        assert_eq!(abs_diff(7, 3), 4);
        assert_eq!(abs_diff(0, 0), 0);
    }

    #[test]
    fn test_shard_ranges() {
        assert_eq!(shard_ranges(10, 3), [0..4, 4..7, 7..10]);
        assert_eq!(shard_ranges(2, 4), [0..1, 1..2, 2..2, 2..2]);
        assert_eq!(shard_ranges(0, 2), [0..0, 0..0]);
        assert_eq!(shard_ranges(5, 0), [0..5]);
    }
}
