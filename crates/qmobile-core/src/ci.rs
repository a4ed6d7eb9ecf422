//! CI system detection

use serde::Serialize;

use crate::env::Environment;

/// Jenkins sets either of these on every build
const JENKINS_VARS: [&str; 2] = ["JENKINS_URL", "JENKINS_HOME"];

/// CI systems the uploader knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CiProvider {
    Jenkins,
    GitLab,
    Travis,
}

impl CiProvider {
    pub fn name(&self) -> &'static str {
        match self {
            CiProvider::Jenkins => "Jenkins",
            CiProvider::GitLab => "GitLab CI",
            CiProvider::Travis => "Travis CI",
        }
    }
}

impl std::fmt::Display for CiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn is_jenkins(env: &dyn Environment) -> bool {
    JENKINS_VARS.iter().any(|key| env.contains(key))
}

pub fn is_gitlab(env: &dyn Environment) -> bool {
    env.contains("GITLAB_CI")
}

pub fn is_travis(env: &dyn Environment) -> bool {
    env.contains("TRAVIS")
}

/// First matching provider, checked in the order Jenkins, GitLab, Travis
pub fn detect(env: &dyn Environment) -> Option<CiProvider> {
    if is_jenkins(env) {
        Some(CiProvider::Jenkins)
    } else if is_gitlab(env) {
        Some(CiProvider::GitLab)
    } else if is_travis(env) {
        Some(CiProvider::Travis)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    #[test]
    fn test_jenkins_by_either_variable() {
        assert!(is_jenkins(&MapEnv::new().with("JENKINS_URL", "https://ci.example.com")));
        assert!(is_jenkins(&MapEnv::new().with("JENKINS_HOME", "/var/jenkins")));
        assert!(!is_jenkins(&MapEnv::new().with("JOB_NAME", "build")));
    }

    #[test]
    fn test_detect() {
        assert_eq!(detect(&MapEnv::new()), None);
        assert_eq!(detect(&MapEnv::new().with("GITLAB_CI", "true")), Some(CiProvider::GitLab));
        assert_eq!(detect(&MapEnv::new().with("TRAVIS", "true")), Some(CiProvider::Travis));
        assert_eq!(
            detect(&MapEnv::new().with("TRAVIS", "true").with("JENKINS_HOME", "/j")),
            Some(CiProvider::Jenkins)
        );
    }

    #[test]
    fn test_presence_counts_even_when_empty() {
        assert!(is_gitlab(&MapEnv::new().with("GITLAB_CI", "")));
    }
}
