/// Common SQL query fragments to reduce duplication and ensure consistency
pub struct QueryBuilder;

impl QueryBuilder {
    /// Base SELECT clause for image queries
    pub const IMAGE_SELECT: &'static str = r#"
        SELECT id, kind, file_name, owner_id, created_at,
               digest, width, height, bar_texts, photographer, license,
               thumb_file_name, original, meta
        FROM images
    "#;

    pub fn by_id() -> String {
        format!("{} WHERE id = $1", Self::IMAGE_SELECT)
    }

    /// Oldest raw image first, so coincidental duplicates link to the original upload
    pub fn raw_by_digest() -> String {
        format!(
            "{} WHERE kind = 'raw' AND digest = $1 ORDER BY created_at, id LIMIT 1",
            Self::IMAGE_SELECT
        )
    }

    /// Keyset page over all records; `$1` is the last id seen or NULL
    pub fn page_after() -> String {
        format!(
            "{} WHERE ($1::uuid IS NULL OR id > $1) ORDER BY id LIMIT $2",
            Self::IMAGE_SELECT
        )
    }
}
