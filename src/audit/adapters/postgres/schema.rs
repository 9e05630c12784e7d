//! Diesel schema for audit persistence.

diesel::table! {
    /// Append-only audit entries, unique per request, attempt, and action.
    audit_entries (log_id) {
        /// Entry identifier.
        log_id -> Uuid,
        /// Owning request.
        request_id -> Uuid,
        /// Attempt number; zero before the first invocation.
        attempt -> Int4,
        /// Per-request monotonic sequence.
        sequence -> Int8,
        /// Caller identifier.
        #[max_length = 255]
        user_id -> Varchar,
        /// Transition label.
        #[max_length = 100]
        action -> Varchar,
        /// Audited resource path.
        #[max_length = 255]
        resource -> Varchar,
        /// Event category.
        #[max_length = 50]
        event_type -> Varchar,
        /// Structured transition payload.
        details -> Jsonb,
        /// Write timestamp.
        recorded_at -> Timestamptz,
        /// Retention expiry.
        expires_at -> Timestamptz,
    }
}
