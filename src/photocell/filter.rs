use std::collections::VecDeque;

/// Smooths raw photocell readings into a stable value
pub trait PhotocellFilter: Send {
    /// Record a raw reading; returns the stable value once enough history exists
    fn update(&mut self, raw: f64) -> Option<f64>;

    /// Raw readings currently retained, oldest first
    fn history(&self) -> Vec<f64>;
}

/// Arithmetic mean of the most recent readings
#[derive(Debug, Clone)]
pub struct MeanFilter {
    history: VecDeque<f64>,
    window: usize,
}

impl MeanFilter {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
        }
    }
}

impl PhotocellFilter for MeanFilter {
    fn update(&mut self, raw: f64) -> Option<f64> {
        push_bounded(&mut self.history, raw, self.window);
        let sum: f64 = self.history.iter().sum();
        Some(sum / self.history.len() as f64)
    }

    fn history(&self) -> Vec<f64> {
        self.history.iter().copied().collect()
    }
}

/// Median-filtered sliding history
///
/// The stable value is the second-to-last filtered sample, one step behind the
/// newest raw reading so a single transient spike never reaches the output.
#[derive(Debug, Clone)]
pub struct MedianFilter {
    history: VecDeque<f64>,
    capacity: usize,
    window: usize,
    min_samples: usize,
}

impl MedianFilter {
    pub fn new(capacity: usize, window: usize, min_samples: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            window: window.max(1) | 1,
            min_samples: min_samples.clamp(2, capacity),
        }
    }
}

impl PhotocellFilter for MedianFilter {
    fn update(&mut self, raw: f64) -> Option<f64> {
        push_bounded(&mut self.history, raw, self.capacity);
        if self.history.len() < self.min_samples {
            return None;
        }

        let filtered = median_filter(self.history.make_contiguous(), self.window);
        filtered.get(filtered.len() - 2).copied()
    }

    fn history(&self) -> Vec<f64> {
        self.history.iter().copied().collect()
    }
}

fn push_bounded(history: &mut VecDeque<f64>, value: f64, capacity: usize) {
    history.push_back(value);
    while history.len() > capacity {
        history.pop_front();
    }
}

/// Length-`k` median filter with edges extended by repeating the end samples
///
/// `k` must be odd; an even `k` is widened by one.
pub fn median_filter(samples: &[f64], k: usize) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }

    let half = (k.max(1) | 1) / 2;
    let last = samples.len() - 1;
    let mut window = Vec::with_capacity(2 * half + 1);

    (0..samples.len())
        .map(|i| {
            window.clear();
            for offset in 0..=2 * half {
                // Out-of-range neighbours clamp to the first/last sample
                let j = (i + offset).saturating_sub(half).min(last);
                window.push(samples[j]);
            }
            window.sort_by(|a, b| a.total_cmp(b));
            window[half]
        })
        .collect()
}
