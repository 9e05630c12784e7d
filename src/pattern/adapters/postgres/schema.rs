//! Diesel schema for pattern persistence.

diesel::table! {
    /// Insert-only analyzer patterns.
    patterns (pattern_id) {
        /// Pattern identifier.
        pattern_id -> Uuid,
        /// Analyzer run timestamp.
        discovered_at -> Timestamptz,
        /// Aggregate type.
        #[max_length = 50]
        pattern_type -> Varchar,
        /// Described agent kind, if any.
        #[max_length = 50]
        agent_kind -> Nullable<Varchar>,
        /// Human-readable summary.
        description -> Text,
        /// Evidence strength in `[0, 1]`.
        confidence_score -> Float8,
        /// Measured value.
        metric -> Jsonb,
        /// Number of requests behind the measurement.
        sample_size -> Int4,
        /// Supporting request identifiers.
        evidence -> Jsonb,
        /// Pattern replaced by this one.
        supersedes -> Nullable<Uuid>,
        /// Retention expiry.
        expires_at -> Timestamptz,
    }
}
