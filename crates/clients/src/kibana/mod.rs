//! Kibana API calls.

pub mod detection_rules;
pub mod models;

/// The space Kibana serves without a `/s/{space}` prefix.
pub const DEFAULT_SPACE: &str = "default";

/// Path segments that scope a request to `space_id`.
pub(crate) fn space_segments(space_id: &str) -> Vec<&str> {
    if space_id.is_empty() || space_id == DEFAULT_SPACE {
        Vec::new()
    } else {
        vec!["s", space_id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_segments() {
        assert!(space_segments("default").is_empty());
        assert!(space_segments("").is_empty());
        assert_eq!(space_segments("security"), vec!["s", "security"]);
    }
}
