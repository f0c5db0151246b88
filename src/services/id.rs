use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of temporary file names for incoming uploads.
///
/// Every call must return a name no other call in this process (or a
/// previous run writing to the same directory) has returned.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// 32 lowercase hex characters from a random v4 UUID.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomId;

impl IdGenerator for RandomId {
    fn next_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// `<prefix>-<counter>` names. With a fixed prefix the sequence is fully
/// deterministic; [`SequentialId::with_process_entropy`] picks a random
/// prefix so restarts do not reuse names.
#[derive(Debug)]
pub struct SequentialId {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialId {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn with_process_entropy() -> Self {
        let entropy = Uuid::new_v4().simple().to_string();
        Self::new(&entropy[..12])
    }
}

impl IdGenerator for SequentialId {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:06}", self.prefix, n)
    }
}
