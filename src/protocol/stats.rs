/// Counters kept by one [`Parser`](super::Parser).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserStats {
    /// Bytes passed to the parser
    pub bytes_fed: u64,
    /// Non-marker bytes dropped while hunting for a frame
    pub noise_bytes: u64,
    /// Marker bytes that opened a frame
    pub frames_started: u64,
    /// Frames delivered as packets
    pub frames_completed: u64,
    /// Frames discarded by a reset before completing
    pub frames_abandoned: u64,
    /// Completed frames with the signature flag set
    pub signed_frames: u64,
    /// Completed frames whose message id had no definition
    pub unknown_messages: u64,
}

impl ParserStats {
    /// Share of fed bytes that were discarded as noise.
    #[must_use]
    pub fn noise_ratio(&self) -> Option<f64> {
        ratio(self.noise_bytes, self.bytes_fed)
    }

    /// Share of completed frames that could be decoded.
    #[must_use]
    pub fn decoded_ratio(&self) -> Option<f64> {
        ratio(
            self.frames_completed.saturating_sub(self.unknown_messages),
            self.frames_completed,
        )
    }

    /// Frames started but not yet completed or abandoned
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.frames_started
            .saturating_sub(self.frames_completed)
            .saturating_sub(self.frames_abandoned)
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(part as f64 / total as f64)
}
