//! Messages from the render loop to the audio thread.

/// Sent over the lock-free ring buffer; the audio thread never allocates for them.
#[derive(Debug)]
pub enum AudioCommand {
    /// Interleaved stereo frames (L, R, L, R, ...), played after anything queued.
    Block(Vec<f32>),
    /// Master volume, 0.0 to 1.0.
    SetVolume(f32),
    /// Drop everything queued and play silence until the next block.
    Flush,
}

impl AudioCommand {
    /// Stereo frames carried by this command.
    pub fn frames(&self) -> usize {
        match self {
            AudioCommand::Block(samples) => samples.len() / 2,
            _ => 0,
        }
    }
}
