//! Display-name resolution for learners the system has not seen before.
//!
//! Deployments with an account system plug their own [`UserDirectory`] in;
//! standalone deployments run with [`NullDirectory`] and names derived from
//! the identifier itself.

use async_trait::async_trait;

/// Optional lookup of a human display name for an identifier.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn display_name(&self, identifier: &str) -> Option<String>;
}

/// Directory that knows nobody.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDirectory;

#[async_trait]
impl UserDirectory for NullDirectory {
    async fn display_name(&self, _identifier: &str) -> Option<String> {
        None
    }
}

/// Last-resort display name: the local part of an email-like identifier,
/// or the identifier itself when there is no '@'.
pub fn fallback_display_name(identifier: &str) -> String {
    let local = identifier.split('@').next().unwrap_or(identifier);
    if local.is_empty() {
        identifier.to_string()
    } else {
        local.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_uses_local_part() {
        assert_eq!(fallback_display_name("ada@example.com"), "ada");
        assert_eq!(fallback_display_name("plain-handle"), "plain-handle");
        assert_eq!(fallback_display_name("@odd.com"), "@odd.com");
    }

    #[tokio::test]
    async fn test_null_directory_knows_nobody() {
        assert_eq!(NullDirectory.display_name("ada@example.com").await, None);
    }
}
