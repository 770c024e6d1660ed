pub mod protected;
pub mod public;

/// Render a stored BSON timestamp for JSON responses
pub(crate) fn rfc3339(dt: bson::DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_default()
}
