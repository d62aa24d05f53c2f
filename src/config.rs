use crate::codec::{MAX_RECORD_LEN, MIN_RECORD_LEN};
use crate::error::CountError;

pub(crate) const KB_TO_BYTES: usize = 1024;
pub(crate) const DEFAULT_CHUNK_SIZE: usize = 256 * KB_TO_BYTES;
pub(crate) const DEFAULT_WORKERS: usize = 8;

#[derive(Debug, Clone, Copy)]
pub(crate) struct PipelineConfig {
    /// Capacity in bytes of every worker's chunk buffer.
    pub(crate) chunk_size: usize,
    pub(crate) workers: usize,
    /// Validate every record instead of trusting the input.
    pub(crate) strict: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: DEFAULT_WORKERS,
            strict: false,
        }
    }
}

impl PipelineConfig {
    pub(crate) fn validate(&self) -> Result<(), CountError> {
        if self.chunk_size <= MAX_RECORD_LEN {
            return Err(CountError::Config(format!(
                "chunk size {} must exceed the maximum record length {}",
                self.chunk_size, MAX_RECORD_LEN
            )));
        }
        if self.workers == 0 {
            return Err(CountError::Config("at least one worker is required".into()));
        }
        Ok(())
    }

    /// Worst-case number of records that fit in one chunk.
    pub(crate) fn batch_capacity(&self) -> usize {
        self.chunk_size.div_ceil(MIN_RECORD_LEN)
    }
}
