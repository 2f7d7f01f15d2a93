//! Session key layout.
//!
//! Records live under `{prefix}:session:{id}` so several deployments can
//! share one Redis database.

use crate::record::SessionId;

pub fn session_key(prefix: &str, id: &SessionId) -> String {
    format!("{}:session:{}", prefix, id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_layout() {
        let id = SessionId::parse(&"ab".repeat(32)).unwrap();
        assert_eq!(
            session_key("lectern", &id),
            format!("lectern:session:{}", "ab".repeat(32))
        );
    }
}
