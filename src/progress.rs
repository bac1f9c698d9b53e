/// Progress accounting for a single file transfer.
///
/// Percent complete is integer-truncated against the expected byte count
/// and clamped so it never moves backwards, even if the expected count
/// turns out to be smaller than what the server actually sends.
#[derive(Debug)]
pub struct TransferProgress {
    expected_bytes: u64,
    received_bytes: u64,
    percent: u8,
}

impl TransferProgress {
    pub fn new(expected_bytes: u64) -> Self {
        Self {
            expected_bytes,
            received_bytes: 0,
            // Nothing to transfer counts as already complete.
            percent: if expected_bytes == 0 { 100 } else { 0 },
        }
    }

    /// Records a received chunk and returns the updated cumulative percent.
    pub fn advance(&mut self, chunk_len: u64) -> u8 {
        self.received_bytes += chunk_len;
        if self.expected_bytes > 0 {
            let p = (self.received_bytes * 100 / self.expected_bytes).min(100) as u8;
            self.percent = self.percent.max(p);
        }
        self.percent
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn received_bytes(&self) -> u64 {
        self.received_bytes
    }
}
