use reqwest::Url;
use serde::Serialize;
use std::fmt;

/// owner/repo pair parsed out of a GitHub repository URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse `https://github.com/{owner}/{repo}[...]`
    ///
    /// Extra path segments (`/tree/main/src`) are ignored and a `.git`
    /// suffix is stripped.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let url = Url::parse(raw.trim()).map_err(|e| format!("Not a valid URL: {}", e))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(format!("Unsupported URL scheme '{}'", url.scheme()));
        }

        match url.host_str() {
            Some("github.com") | Some("www.github.com") => {}
            _ => return Err("Not a GitHub URL".to_string()),
        }

        let mut segments = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter();

        let (owner, repo) = match (segments.next(), segments.next()) {
            (Some(owner), Some(repo)) => (owner, repo.strip_suffix(".git").unwrap_or(repo)),
            _ => return Err("URL does not contain an owner/repository path".to_string()),
        };

        for part in [owner, repo] {
            if !is_valid_name(part) {
                return Err(format!("Invalid repository path segment '{}'", part));
            }
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// From an API `full_name` such as `acme/widget`
    pub fn from_full_name(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.split_once('/')?;
        (is_valid_name(owner) && is_valid_name(repo)).then(|| Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Case-insensitive match against an `owner/repo` string
    pub fn matches_full_name(&self, full_name: &str) -> bool {
        self.full_name().eq_ignore_ascii_case(full_name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn is_valid_name(part: &str) -> bool {
    !part.is_empty()
        && part != "."
        && part != ".."
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_repo_url() {
        let repo = RepoRef::parse("https://github.com/acme/widget").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.repo, "widget");
        assert_eq!(repo.full_name(), "acme/widget");
    }

    #[test]
    fn test_parse_strips_git_suffix_and_extra_segments() {
        let repo = RepoRef::parse("https://www.github.com/acme/widget.git").unwrap();
        assert_eq!(repo.repo, "widget");

        let repo = RepoRef::parse("https://github.com/acme/widget/tree/main/src/").unwrap();
        assert_eq!(repo.full_name(), "acme/widget");
    }

    #[test]
    fn test_strips_only_one_git_suffix() {
        let repo = RepoRef::parse("https://github.com/acme/widget.git.git").unwrap();
        assert_eq!(repo.repo, "widget.git");
    }

    #[test]
    fn test_rejects_other_hosts() {
        assert!(RepoRef::parse("https://gitlab.com/acme/widget").is_err());
        assert!(RepoRef::parse("https://github.com.evil.io/acme/widget").is_err());
    }

    #[test]
    fn test_rejects_missing_repo_segment() {
        assert!(RepoRef::parse("https://github.com/acme").is_err());
        assert!(RepoRef::parse("https://github.com/").is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(RepoRef::parse("not a url").is_err());
        assert!(RepoRef::parse("ftp://github.com/acme/widget").is_err());
        assert!(RepoRef::parse("https://github.com/acme/wid%20get").is_err());
    }

    #[test]
    fn test_matches_full_name_ignores_case() {
        let repo = RepoRef::parse("https://github.com/Acme/Widget").unwrap();
        assert!(repo.matches_full_name("acme/widget"));
        assert!(!repo.matches_full_name("acme/gadget"));
    }

    #[test]
    fn test_from_full_name() {
        let repo = RepoRef::from_full_name("acme/widget").unwrap();
        assert_eq!(repo.to_string(), "acme/widget");
        assert!(RepoRef::from_full_name("acme").is_none());
        assert!(RepoRef::from_full_name("acme/..").is_none());
    }
}
