//! Screen change detection by frame differencing.

use crate::{Image, OwnedImage};

/// Sum of absolute per-channel differences below which two frames count as the same screen.
pub const DEFAULT_CHANGE_THRESHOLD: u64 = 1000;

/// Sum of absolute channel differences over all pixels.
///
/// Returns `None` if the two views differ in size.
pub fn difference_sum(a: Image, b: Image) -> Option<u64> {
    if a.width() != b.width() || a.height() != b.height() {
        return None;
    }

    Some(
        a.pixels()
            .zip(b.pixels())
            .map(|(a, b)| a.abs_diff(b) as u64)
            .sum(),
    )
}

#[derive(Debug)]
pub enum Change {
    None,
    Changed(OwnedImage),
}

impl Change {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// Compares each captured frame against the previous one.
#[derive(Debug)]
pub struct ChangeDetector {
    threshold: u64,
    previous: Option<OwnedImage>,
    last_difference: Option<u64>,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_THRESHOLD)
    }
}

impl ChangeDetector {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            previous: None,
            last_difference: None,
        }
    }

    pub fn set_threshold(&mut self, threshold: u64) {
        self.threshold = threshold;
    }

    /// Difference measured by the last comparison, if one happened.
    pub fn last_difference(&self) -> Option<u64> {
        self.last_difference
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.last_difference = None;
    }

    /// Feeds the next capture. `None` means the capture failed (e.g. the window is minimized),
    /// which also forgets the previous frame.
    pub fn observe(&mut self, frame: Option<OwnedImage>) -> Change {
        let Some(frame) = frame else {
            self.reset();
            return Change::None;
        };

        let difference = self
            .previous
            .as_ref()
            .and_then(|previous| difference_sum(previous.as_image(), frame.as_image()));
        self.last_difference = difference;

        match difference {
            Some(sum) if sum > self.threshold => {
                self.previous = Some(frame.clone());
                Change::Changed(frame)
            }
            _ => {
                self.previous = Some(frame);
                Change::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    fn frame(fill: Color) -> OwnedImage {
        OwnedImage::new(8, 8, fill)
    }

    #[test]
    fn sums_channel_differences() {
        let a = frame(Color::new(10, 10, 10));
        let b = frame(Color::new(12, 7, 10));
        assert_eq!(difference_sum(a.as_image(), b.as_image()), Some(64 * 5));
        assert_eq!(difference_sum(a.as_image(), a.as_image().sub_image(0, 0, 4, 4)), None);
    }

    #[test]
    fn first_frame_is_never_a_change() {
        let mut detector = ChangeDetector::default();
        assert!(!detector.observe(Some(frame(Color::BLACK))).is_changed());
        assert_eq!(detector.last_difference(), None);
    }

    #[test]
    fn detects_change_above_threshold() {
        let mut detector = ChangeDetector::new(1000);
        detector.observe(Some(frame(Color::BLACK)));

        // 64 pixels * 3 channels * 5 = 960, still under the threshold.
        assert!(!detector.observe(Some(frame(Color::new(5, 5, 5)))).is_changed());
        assert_eq!(detector.last_difference(), Some(960));

        match detector.observe(Some(frame(Color::WHITE))) {
            Change::Changed(img) => assert_eq!(img, frame(Color::WHITE)),
            Change::None => panic!("expected a change"),
        }

        // Same screen again: compared against the frame that triggered.
        assert!(!detector.observe(Some(frame(Color::WHITE))).is_changed());
    }

    #[test]
    fn failed_capture_resets() {
        let mut detector = ChangeDetector::new(0);
        detector.observe(Some(frame(Color::BLACK)));
        assert!(!detector.observe(None).is_changed());
        assert!(!detector.observe(Some(frame(Color::WHITE))).is_changed());
        assert!(detector.observe(Some(frame(Color::BLACK))).is_changed());
    }

    #[test]
    fn resolution_change_is_not_a_change() {
        let mut detector = ChangeDetector::new(0);
        detector.observe(Some(frame(Color::BLACK)));
        assert!(!detector.observe(Some(OwnedImage::new(4, 4, Color::WHITE))).is_changed());
    }
}
