use sqlx::FromRow;

/// A vocabulary entry. Unique on `(word, is_tag)` (spec §3).
#[derive(Debug, Clone, FromRow)]
pub struct Word {
    pub id: i64,
    pub word: String,
    pub is_tag: bool,
    pub points: f64,
    pub is_sensitive: bool,
}

/// Bag-of-words count for one snapshot.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct SnapshotWord {
    pub snapshot_id: i64,
    pub word_id: i64,
    pub count: i64,
}
