//! Test fixtures and constants.

use std::collections::HashMap;

use gitops_api::core::domain::{Credentials, RepoRef, Token};

/// Caller login used across tests.
pub const USER: &str = "alice";

/// Caller token used across tests.
pub const TOKEN: &str = "ghp_test_caller_token";

/// Template cluster specification.
pub const TEMPLATE_SPEC: &str = r#"apiVersion: gitops.example.com/v1
kind: Cluster
spec:
  state: present
  template:
    metadata:
      name: cluster-template
  profiles:
    - base
"#;

/// A running cluster with two profiles.
pub const PRESENT_SPEC: &str = r#"apiVersion: gitops.example.com/v1
kind: Cluster
spec:
  state: present
  template:
    metadata:
      name: acme-prod
  profiles:
    - a
    - b
"#;

/// A template that already describes `acme-prod` as absent.
pub const ALREADY_TARGET_SPEC: &str = r#"spec:
  state: absent
  template:
    metadata:
      name: acme-prod
"#;

pub fn credentials() -> Credentials {
    Credentials::new(USER, Token::new(TOKEN)).unwrap()
}

pub fn repo(owner: &str, name: &str) -> RepoRef {
    RepoRef::new(owner, name).unwrap()
}

/// The two AWS secrets, optionally with an explicit CI token.
pub fn secrets(github_token: Option<&str>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("awsAccessKeyId".to_string(), "AKIAEXAMPLE".to_string());
    map.insert("awsSecretAccessKey".to_string(), "wJalrXUtnFEMI/K7MDENG".to_string());
    if let Some(token) = github_token {
        map.insert("githubToken".to_string(), token.to_string());
    }
    map
}
