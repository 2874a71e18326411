use std::path::Path;
use std::sync::Arc;

use sessiongate::config::{parse_config, ConfigV1};
use sessiongate::startup;
use sessiongate::state::Gate;

/// A config pointing at `base_url`, with the token kept in a file at
/// `token_path` so a second gate on the same path behaves like a reload.
pub fn test_config(base_url: &str, token_path: &Path) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
api:
  base_url: "{}"
  timeout_in_ms: 2000
store:
  type: file
  path: "{}"
auth:
  timeout_in_ms: 1000
  resolvers:
    - type: who-am-i
guard:
  fail_open_after_ms: 2000
logging:
  level: debug
  format: console
"#,
        base_url,
        token_path.display()
    );
    parse_config(&yaml).expect("test config should parse")
}

pub fn build_gate(base_url: &str, token_path: &Path) -> Gate {
    startup::build(Arc::new(test_config(base_url, token_path))).expect("gate should build")
}

pub fn me_body(id: u64, email: &str, user_type: &str) -> String {
    format!(
        r#"{{"user": {{"id": {}, "email": "{}", "firstName": "Test", "lastName": "User", "userType": "{}"}}}}"#,
        id, email, user_type
    )
}
