use std::collections::VecDeque;

/// Bounded record of solver chatter for one equilibrium solve.
///
/// Holds at most `capacity` lines and drops the oldest first. With a capacity
/// of zero nothing is kept and the line closures are never called, so no
/// formatting happens in the hot path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    capacity: usize,
    lines: VecDeque<String>,
}

impl Transcript {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends the line produced by `line`, evicting the oldest if full.
    pub fn record(&mut self, line: impl FnOnce() -> String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line());
    }

    /// Recorded lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_never_formats() {
        let mut transcript = Transcript::with_capacity(0);
        transcript.record(|| unreachable!("closure must not run"));
        assert!(transcript.is_empty());
    }

    #[test]
    fn keeps_most_recent_lines() {
        let mut transcript = Transcript::with_capacity(2);
        for i in 0..5 {
            transcript.record(|| format!("line {i}"));
        }
        assert_eq!(transcript.lines().collect::<Vec<_>>(), ["line 3", "line 4"]);
    }
}
