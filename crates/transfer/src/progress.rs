/// Turns byte counters from a running transfer into percentages.
///
/// Percentages stay within `[0, 100]` and never go down within one attempt.
/// A transfer whose total is unknown or zero produces no percentages.
#[derive(Debug, Clone)]
pub struct ProgressMeter {
    total: Option<u64>,
    last: f64,
}

impl ProgressMeter {
    pub fn new(total: Option<u64>) -> Self {
        Self { total, last: 0.0 }
    }

    /// Starts a new attempt at 0%.
    pub fn reset(&mut self) {
        self.last = 0.0;
    }

    /// Last percentage reported in the current attempt.
    pub fn last(&self) -> f64 {
        self.last
    }

    /// Records `sent` bytes and returns the new percentage if it moved forward.
    pub fn update(&mut self, sent: u64) -> Option<f64> {
        let total = self.total.filter(|&t| t > 0)?;
        let percent = ((sent as f64 / total as f64) * 100.0).clamp(0.0, 100.0);
        if percent > self.last {
            self.last = percent;
            Some(percent)
        } else {
            None
        }
    }
}
