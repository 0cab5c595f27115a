// SPDX-License-Identifier: MPL-2.0

//! Recording epoch alignment
//!
//! A recording session's epoch is the capture timestamp of the first sample
//! it accepts, regardless of media type. Every timestamp written to the
//! container is relative to that single epoch, so the first written sample
//! lands at exactly zero and both tracks share one time base.

use gstreamer as gst;

/// Epoch-relative timestamp mapping for one recording session
#[derive(Debug, Default)]
pub struct EpochClock {
    epoch: Option<gst::ClockTime>,
}

impl EpochClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the epoch has been established
    pub fn is_established(&self) -> bool {
        self.epoch.is_some()
    }

    /// The epoch, once established
    pub fn epoch(&self) -> Option<gst::ClockTime> {
        self.epoch
    }

    /// Map a capture timestamp to the session time base
    ///
    /// The first call establishes the epoch and returns zero. Later samples
    /// map to `pts − epoch`; a sample captured before the epoch (possible
    /// for audio buffered across the start boundary) saturates to zero
    /// rather than going negative.
    pub fn align(&mut self, pts: gst::ClockTime) -> gst::ClockTime {
        let epoch = *self.epoch.get_or_insert(pts);
        pts.saturating_sub(epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> gst::ClockTime {
        gst::ClockTime::from_nseconds((s * 1_000_000_000.0) as u64)
    }

    #[test]
    fn test_first_sample_is_zero() {
        let mut clock = EpochClock::new();
        assert!(!clock.is_established());
        assert_eq!(clock.align(secs(100.0)), gst::ClockTime::ZERO);
        assert!(clock.is_established());
        assert_eq!(clock.epoch(), Some(secs(100.0)));
    }

    #[test]
    fn test_epoch_is_established_once() {
        let mut clock = EpochClock::new();
        clock.align(secs(100.0));
        clock.align(secs(200.0));
        assert_eq!(clock.epoch(), Some(secs(100.0)));
    }

    #[test]
    fn test_relative_timestamps_across_tracks() {
        // Video at 100.0/100.03/100.06, audio at 100.01/100.04; one epoch
        let mut clock = EpochClock::new();
        assert_eq!(clock.align(secs(100.0)), secs(0.0));
        assert_eq!(clock.align(secs(100.01)), secs(0.01));
        assert_eq!(clock.align(secs(100.03)), secs(0.03));
        assert_eq!(clock.align(secs(100.04)), secs(0.04));
        assert_eq!(clock.align(secs(100.06)), secs(0.06));
    }

    #[test]
    fn test_pre_epoch_sample_saturates() {
        let mut clock = EpochClock::new();
        clock.align(secs(100.0));
        assert_eq!(clock.align(secs(99.5)), gst::ClockTime::ZERO);
    }
}
