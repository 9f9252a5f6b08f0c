/// Lexicographic walk over the `k`-subsets of `0..n`.
///
/// Yields borrowed index slices so the search can drive it without
/// allocating per subset.
#[derive(Clone, Debug)]
pub(crate) struct Subsets {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    started: bool,
    finished: bool,
}

impl Subsets {
    pub(crate) fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            indices: Vec::with_capacity(k),
            started: false,
            finished: k > n,
        }
    }

    pub(crate) fn advance(&mut self) -> Option<&[usize]> {
        if self.finished {
            return None;
        }

        if !self.started {
            self.started = true;
            self.indices.extend(0..self.k);
            return Some(&self.indices);
        }

        let mut position = self.k;
        loop {
            if position == 0 {
                self.finished = true;
                return None;
            }
            position -= 1;
            if self.indices[position] < self.n - self.k + position {
                break;
            }
        }

        self.indices[position] += 1;
        for next in position + 1..self.k {
            self.indices[next] = self.indices[next - 1] + 1;
        }
        Some(&self.indices)
    }
}

/// Number of `k`-subsets of an `n`-set, saturating at `u128::MAX`.
pub(crate) fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut value: u128 = 1;
    for step in 0..k {
        let numerator = (n - step) as u128;
        let denominator = (step + 1) as u128;
        value = match value.checked_mul(numerator) {
            Some(product) => product / denominator,
            None => return u128::MAX,
        };
    }
    value
}
