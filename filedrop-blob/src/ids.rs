use std::sync::atomic::{AtomicU64, Ordering};

use rand::{rngs::OsRng, RngCore};

use crate::{FileHostError, FileHostResult, FileId};

/// Bytes of OS randomness in every identifier
const RANDOM_BYTES: usize = 8;

/// Strategy for generating file identifiers
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh identifier. Fails only if the randomness source is gone.
    fn generate(&self) -> FileHostResult<FileId>;
}

/// Default generator: `<micros-hex>_<16 hex chars of OS randomness>`.
///
/// The time component never repeats within a process, even when the clock stands
/// still or steps backwards; the random component keeps ids unguessable.
#[derive(Debug, Default)]
pub struct DefaultIdGenerator {
    last_micros: AtomicU64,
}

impl DefaultIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_micros(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_micros().max(0) as u64;
        let prev = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }
}

impl IdGenerator for DefaultIdGenerator {
    fn generate(&self) -> FileHostResult<FileId> {
        let mut random = [0u8; RANDOM_BYTES];
        OsRng
            .try_fill_bytes(&mut random)
            .map_err(|e| FileHostError::Entropy {
                reason: e.to_string(),
            })?;

        Ok(FileId(format!(
            "{:x}_{}",
            self.next_micros(),
            hex::encode(random)
        )))
    }
}
