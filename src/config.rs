//! Environment-backed credential configuration.
//!
//! Two credentials drive the planner: the mapping-provider key and the
//! generative-AI key. Both are read from the process environment (a `.env`
//! file is honored when the binary loads one). A missing key never crashes
//! startup; the component it belongs to degrades per its own fail-open
//! policy instead.

use std::env;

/// Credentials resolved from the process environment.
#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    /// `GOOGLE_MAPS_API_KEY`; routing/places/imagery calls degrade to empty
    /// results without it.
    pub maps_api_key: Option<String>,
    /// `GEMINI_API_KEY`; without it the route choice falls back to the
    /// scenic-spot heuristic and the narrative is a fixed degraded message.
    pub gemini_api_key: Option<String>,
}

impl PlannerConfig {
    /// Read both credentials from the environment. Blank values count as
    /// absent.
    pub fn from_env() -> Self {
        Self {
            maps_api_key: read_var("GOOGLE_MAPS_API_KEY"),
            gemini_api_key: read_var("GEMINI_API_KEY"),
        }
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_value_counts_as_absent() {
        // Use a test-only variable name to avoid clobbering real credentials.
        env::set_var("DRIVE_PLANNER_TEST_BLANK", "   ");
        assert_eq!(read_var("DRIVE_PLANNER_TEST_BLANK"), None);
        env::remove_var("DRIVE_PLANNER_TEST_BLANK");
    }

    #[test]
    fn test_value_is_trimmed() {
        env::set_var("DRIVE_PLANNER_TEST_KEY", " abc123 ");
        assert_eq!(read_var("DRIVE_PLANNER_TEST_KEY"), Some("abc123".into()));
        env::remove_var("DRIVE_PLANNER_TEST_KEY");
    }
}
