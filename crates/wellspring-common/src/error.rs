/// Crate-wide error type. Variants map to subsystem boundaries: `Config` for
/// missing or invalid configuration (including a missing API credential),
/// `Agent` for LLM provider failures, `Database` for storage failures, and
/// `Auth` for credential verification failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("agent error: {0}")]
    Agent(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("auth error: {0}")]
    Auth(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn display_includes_subsystem_prefix() {
        let err = Error::Config("TOGETHER_API_KEY is missing".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: TOGETHER_API_KEY is missing"
        );

        let err = Error::Database("failed to open database: locked".to_string());
        assert!(err.to_string().starts_with("database error: "));
    }
}
