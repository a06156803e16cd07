//! Sensor sample conditioning for the load cell and the ultrasonic height pole.

use heapless::Deque;

/// Samples averaged by the load cell filter.
pub const WEIGHT_FILTER_WINDOW: usize = 10;

/// Fixed-window moving average.
///
/// Holds the last `window` samples (at most `N`); the oldest is dropped when
/// a new one arrives on a full window.
#[derive(Debug, Clone)]
pub struct MovingAverage<const N: usize> {
    samples: Deque<f32, N>,
    window: usize,
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MovingAverage<N> {
    /// Average over all `N` slots.
    pub const fn new() -> Self {
        Self {
            samples: Deque::new(),
            window: N,
        }
    }

    /// Average over the last `window` samples, clamped to `1..=N`.
    pub fn with_window(window: usize) -> Self {
        Self {
            samples: Deque::new(),
            window: window.clamp(1, N),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Add a sample and return the new average.
    pub fn push(&mut self, value: f32) -> f32 {
        while self.samples.len() >= self.window {
            self.samples.pop_front();
        }
        // cannot fail: window <= N and a slot was freed above
        let _ = self.samples.push_back(value);
        self.average().unwrap_or(value)
    }

    /// Mean of the stored samples, `None` before the first sample.
    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f32 = self.samples.iter().sum();
        Some(sum / self.samples.len() as f32)
    }

    /// Difference between the largest and smallest stored sample.
    pub fn spread(&self) -> f32 {
        let mut iter = self.samples.iter().copied();
        let Some(first) = iter.next() else {
            return 0.0;
        };
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        max - min
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.window
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Filtered load cell read-out with a software zero point.
#[derive(Debug, Clone, Default)]
pub struct Scale {
    filter: MovingAverage<WEIGHT_FILTER_WINDOW>,
    tare_kg: f32,
}

impl Scale {
    pub const fn new() -> Self {
        Self {
            filter: MovingAverage::new(),
            tare_kg: 0.0,
        }
    }

    /// Scale averaging over `window` readings, clamped to
    /// `1..=WEIGHT_FILTER_WINDOW`.
    pub fn with_window(window: usize) -> Self {
        Self {
            filter: MovingAverage::with_window(window),
            tare_kg: 0.0,
        }
    }

    /// Feed a raw reading in kilograms.
    pub fn push_raw(&mut self, kg: f32) {
        self.filter.push(kg);
    }

    /// Filtered weight minus the zero point, never negative.
    pub fn weight_kg(&self) -> f32 {
        match self.filter.average() {
            Some(avg) => (avg - self.tare_kg).max(0.0),
            None => 0.0,
        }
    }

    /// Whether a full window of readings agrees to within `tolerance_kg`.
    pub fn is_stable(&self, tolerance_kg: f32) -> bool {
        self.filter.is_full() && self.filter.spread() <= tolerance_kg
    }

    /// Take the current filtered reading as the new zero point.
    pub fn tare(&mut self) -> f32 {
        self.tare_kg = self.filter.average().unwrap_or(0.0);
        self.tare_kg
    }

    pub fn tare_kg(&self) -> f32 {
        self.tare_kg
    }

    /// Forget buffered readings, keeping the zero point.
    pub fn reset(&mut self) {
        self.filter.clear();
    }
}

/// Child height from the ultrasonic distance measured down from the pole top.
///
/// Readings longer than the pole (nobody standing) give 0.
pub fn height_from_distance(pole_height_cm: f32, distance_cm: f32) -> f32 {
    (pole_height_cm - distance_cm).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_over_partial_and_full_window() {
        let mut avg: MovingAverage<3> = MovingAverage::new();
        assert_eq!(avg.average(), None);
        assert_eq!(avg.push(3.0), 3.0);
        assert_eq!(avg.push(6.0), 4.5);
        assert_eq!(avg.push(9.0), 6.0);
        assert!(avg.is_full());
        // 3.0 drops out
        assert_eq!(avg.push(12.0), 9.0);
        assert_eq!(avg.len(), 3);
    }

    #[test]
    fn spread_tracks_extremes() {
        let mut avg: MovingAverage<4> = MovingAverage::new();
        assert_eq!(avg.spread(), 0.0);
        for v in [10.0, 10.5, 9.75, 10.25] {
            avg.push(v);
        }
        assert_eq!(avg.spread(), 0.75);
    }

    #[test]
    fn scale_tare_and_stability() {
        let mut scale = Scale::new();
        for _ in 0..WEIGHT_FILTER_WINDOW {
            scale.push_raw(0.5);
        }
        assert_eq!(scale.tare(), 0.5);
        assert_eq!(scale.weight_kg(), 0.0);

        scale.reset();
        assert!(!scale.is_stable(0.1));
        for _ in 0..WEIGHT_FILTER_WINDOW {
            scale.push_raw(18.5);
        }
        assert!(scale.is_stable(0.1));
        assert_eq!(scale.weight_kg(), 18.0);

        scale.push_raw(25.0);
        assert!(!scale.is_stable(0.1));
    }

    #[test]
    fn shorter_window_settles_sooner() {
        let mut scale = Scale::with_window(4);
        for _ in 0..3 {
            scale.push_raw(12.0);
        }
        assert!(!scale.is_stable(0.1));
        scale.push_raw(12.0);
        assert!(scale.is_stable(0.1));

        // only the last four readings count
        scale.push_raw(12.4);
        for _ in 0..4 {
            scale.push_raw(13.0);
        }
        assert!(scale.is_stable(0.1));
        assert_eq!(scale.weight_kg(), 13.0);

        let clamped: MovingAverage<3> = MovingAverage::with_window(9);
        assert_eq!(clamped.window(), 3);
    }

    #[test]
    fn height_is_pole_minus_distance() {
        assert_eq!(height_from_distance(199.0, 99.0), 100.0);
        assert_eq!(height_from_distance(199.0, 250.0), 0.0);
    }
}
