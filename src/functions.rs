pub fn mean(xs: impl Iterator<Item = f64>) -> f64 {
    let mut count = 0;
    let mut total = 0.0;
    for x in xs {
        count += 1;
        total += x;
    }
    assert_ne!(count, 0);
    total / count as f64
}

/// `c * log2(c)`, with `0 * log2(0)` taken as zero.
pub fn plogp(count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        let c = count as f64;
        c * c.log2()
    }
}

/// Index of the largest count. Ties go to the lowest index.
pub fn argmax(counts: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, &c) in counts.iter().enumerate() {
        if best.map_or(true, |(_, b)| c > b) {
            best = Some((i, c));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[2, 5, 5, 1]), Some(1));
        assert_eq!(argmax(&[3, 3]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn plogp_handles_zero() {
        assert_eq!(plogp(0), 0.0);
        assert_eq!(plogp(1), 0.0);
        assert_eq!(plogp(4), 8.0);
    }

    #[test]
    fn mean_works() {
        assert_eq!(mean([1.0, 2.0, 3.0, 6.0].iter().copied()), 3.0);
    }
}
