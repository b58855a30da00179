//! Diesel schema for migration record persistence.

diesel::table! {
    /// Migration records kept as a permanent audit trail.
    course_migrations (id) {
        /// Internal migration identifier.
        id -> Uuid,
        /// Requested action.
        #[max_length = 20]
        action -> Varchar,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Source or restored course identifier.
        course_id -> Nullable<Int8>,
        /// Destination category identifier.
        destination_category_id -> Nullable<Int8>,
        /// Archive filename in the storage backend.
        #[max_length = 255]
        filename -> Nullable<Varchar>,
        /// Most recent failure text.
        error -> Nullable<Text>,
        /// Number of executions started.
        attempts -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        modified_at -> Timestamptz,
        /// Actor of the last modification.
        #[max_length = 255]
        modified_by -> Nullable<Varchar>,
    }
}
