pub mod error;
pub mod options;
pub mod recording;
pub mod snapshot;
pub mod state;
pub mod url_key;
pub mod word;

pub use error::TypesError;
pub use options::{SnapshotOptions, MUTABLE_OPTIONS};
pub use recording::{Compilation, Recording, RecordingCompilation, SavedUrl};
pub use snapshot::{Snapshot, SnapshotInfo, Topology};
pub use state::SnapshotState;
pub use word::{SnapshotWord, Word};

/// Priority buckets. The low 1000 units of a priority value are reserved for
/// randomized tie-breaking within the bucket (spec calls this "the low 10
/// bits"; in practice any value in `0..1000` works as jitter).
pub mod priority {
    pub const NONE: i64 = 0;
    pub const SCOUT: i64 = 1000;
    pub const RECORD: i64 = 2000;
    pub const PUBLISH: i64 = 3000;

    /// Which bucket a raw priority value falls into.
    pub fn bucket(p: i64) -> i64 {
        (p / 1000) * 1000
    }

    /// The tie-break jitter within the bucket.
    pub fn jitter(p: i64) -> i64 {
        p % 1000
    }
}
