/// Frame-count hysteresis for noisy per-frame detections.
///
/// A detection channel only commits after the condition has held for
/// `threshold` consecutive-ish frames: positive frames accumulate in `hits`
/// and fire exactly once when the threshold is reached; negative frames
/// accumulate in `misses` and, once a full threshold span has passed without
/// a detection, wipe both counters. A single dropped frame therefore does
/// not discard progress.
#[derive(Debug, Clone)]
pub struct Debouncer {
    hits: u32,
    misses: u32,
    threshold: u32,
}

impl Debouncer {
    pub fn new(threshold: u32) -> Self {
        assert!(threshold > 0, "debounce threshold must be positive");
        Self {
            hits: 0,
            misses: 0,
            threshold,
        }
    }

    /// Feed one frame's detection result. Returns `true` when the positive
    /// counter reaches the threshold (the trigger frame), at which point the
    /// positive counter restarts from zero.
    pub fn observe(&mut self, detected: bool) -> bool {
        if detected {
            self.hits += 1;
            if self.hits >= self.threshold {
                self.hits = 0;
                return true;
            }
        } else {
            self.misses += 1;
            if self.misses >= self.threshold {
                self.hits = 0;
                self.misses = 0;
            }
        }
        false
    }

    pub fn reset(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    #[cfg(test)]
    fn hits(&self) -> u32 {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_exactly_at_threshold() {
        let mut d = Debouncer::new(15);
        for _ in 0..14 {
            assert!(!d.observe(true));
        }
        assert!(d.observe(true));
        assert_eq!(d.hits(), 0);
    }

    #[test]
    fn fires_again_after_another_full_span() {
        let mut d = Debouncer::new(3);
        assert_eq!((0..3).filter(|_| d.observe(true)).count(), 1);
        assert_eq!((0..3).filter(|_| d.observe(true)).count(), 1);
    }

    #[test]
    fn single_miss_does_not_discard_progress() {
        let mut d = Debouncer::new(4);
        d.observe(true);
        d.observe(true);
        d.observe(false);
        assert!(!d.observe(true));
        // hits were 2, one miss, then 3rd and 4th hit completes the span
        assert!(d.observe(true));
    }

    #[test]
    fn full_miss_span_resets_both_counters() {
        let mut d = Debouncer::new(3);
        d.observe(true);
        d.observe(true);
        for _ in 0..3 {
            assert!(!d.observe(false));
        }
        // progress was wiped, a fresh full span is required
        assert!(!d.observe(true));
        assert!(!d.observe(true));
        assert!(d.observe(true));
    }

    #[test]
    fn partial_miss_span_resets_nothing() {
        let mut d = Debouncer::new(3);
        d.observe(true);
        d.observe(false);
        d.observe(false);
        assert!(!d.observe(true));
        assert!(d.observe(true));
    }
}
