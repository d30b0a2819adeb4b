use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::domain::entities::repository::Repository;

/// Clone protocol for a remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Https,
    Ssh,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Https => write!(f, "https"),
            Protocol::Ssh => write!(f, "ssh"),
        }
    }
}

/// Per-group overrides inside a remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RemoteGroup {
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
}

/// A configured git host repositories are cloned from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Remote {
    /// Host name, e.g. `github.com`
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    #[serde(default)]
    pub protocol: Protocol,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[validate(nested)]
    pub groups: Vec<RemoteGroup>,
}

impl Remote {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            protocol: Protocol::default(),
            user: None,
            email: None,
            groups: Vec::new(),
        }
    }

    fn match_group(&self, repo: &Repository) -> Option<&RemoteGroup> {
        self.groups.iter().find(|group| group.name == repo.group())
    }

    /// Clone URL for a repository, honoring the group's protocol override
    pub fn clone_url(&self, repo: &Repository) -> String {
        let protocol = self
            .match_group(repo)
            .and_then(|group| group.protocol)
            .unwrap_or(self.protocol);
        match protocol {
            Protocol::Https => format!("https://{}/{}.git", self.host, repo.name()),
            Protocol::Ssh => format!("git@{}:{}.git", self.host, repo.name()),
        }
    }

    /// Identity to configure in a fresh checkout, group values first
    pub fn user_email(&self, repo: &Repository) -> (Option<String>, Option<String>) {
        let group = self.match_group(repo);
        let user = group
            .and_then(|g| g.user.clone())
            .or_else(|| self.user.clone());
        let email = group
            .and_then(|g| g.email.clone())
            .or_else(|| self.email.clone());
        (user, email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn remote() -> Remote {
        Remote {
            host: "github.com".to_string(),
            protocol: Protocol::Https,
            user: Some("dev".to_string()),
            email: Some("dev@example.com".to_string()),
            groups: vec![RemoteGroup {
                name: "work".to_string(),
                protocol: Some(Protocol::Ssh),
                user: None,
                email: Some("dev@work.example.com".to_string()),
            }],
        }
    }

    #[test]
    fn test_clone_url() {
        let remote = remote();
        let personal = Repository::attach("github", "acme/widget", "/src/widget").unwrap();
        let work = Repository::attach("github", "work/api", "/src/api").unwrap();

        assert_eq!(remote.clone_url(&personal), "https://github.com/acme/widget.git");
        assert_eq!(remote.clone_url(&work), "git@github.com:work/api.git");
    }

    #[test]
    fn test_user_email_group_override() {
        let remote = remote();
        let work = Repository::attach("github", "work/api", "/src/api").unwrap();
        let (user, email) = remote.user_email(&work);
        assert_eq!(user.as_deref(), Some("dev"));
        assert_eq!(email.as_deref(), Some("dev@work.example.com"));
    }

    #[test]
    fn test_validation() {
        assert!(remote().validate().is_ok());

        let mut invalid = remote();
        invalid.email = Some("not-an-email".to_string());
        assert!(invalid.validate().is_err());

        assert!(Remote::new("").validate().is_err());
    }

    #[test]
    fn test_deserialize_yaml() {
        let yaml = "host: gitlab.example.com\nprotocol: ssh\ngroups:\n  - name: infra\n    protocol: https\n";
        let remote: Remote = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(remote.protocol, Protocol::Ssh);
        assert_eq!(remote.groups[0].protocol, Some(Protocol::Https));
        assert!(remote.user.is_none());
    }
}
