//! Resolution of user-supplied repository references into listing endpoints

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRepositoryUrl {
    pub owner: String,
    pub repo: String,
    pub r#ref: Option<String>,
}

impl ParsedRepositoryUrl {
    /// GitHub contents API endpoint for the repository's top-level path
    pub fn contents_url(&self, api_base_url: &str) -> String {
        let mut url = format!(
            "{}/repos/{}/{}/contents",
            api_base_url.trim_end_matches('/'),
            self.owner,
            self.repo
        );
        if let Some(r) = &self.r#ref {
            url.push_str("?ref=");
            url.push_str(r);
        }
        url
    }
}

/// Parse common GitHub URL forms:
/// - https://github.com/owner/repo
/// - https://github.com/owner/repo/
/// - https://github.com/owner/repo.git
/// - git@github.com:owner/repo.git
/// - https://github.com/owner/repo/tree/main (ref = main)
pub fn parse_github_repo_url(input: &str) -> Option<ParsedRepositoryUrl> {
    let trimmed = input.trim();

    if let Some(part) = trimmed.strip_prefix("git@github.com:") {
        let without_git = part.strip_suffix(".git").unwrap_or(part);
        let (owner, repo) = without_git.split_once('/')?;
        return owner_repo(owner, repo, None);
    }

    let after = trimmed
        .strip_prefix("https://github.com/")
        .or_else(|| trimmed.strip_prefix("http://github.com/"))
        .or_else(|| trimmed.strip_prefix("https://www.github.com/"))?;
    let after = after.split(['?', '#']).next().unwrap_or(after);
    let parts: Vec<&str> = after.split('/').collect();
    if parts.len() < 2 {
        return None;
    }

    let reference = match parts.as_slice() {
        [_, _, "tree", r, ..] if !r.is_empty() => Some(r.to_string()),
        _ => None,
    };
    let repo = parts[1].strip_suffix(".git").unwrap_or(parts[1]);
    owner_repo(parts[0], repo, reference)
}

/// `owner/repo` shorthand, as accepted by the GitHub CLI
pub fn parse_repo_shorthand(input: &str) -> Option<ParsedRepositoryUrl> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.contains("://") || trimmed.contains(':') {
        return None;
    }
    let (owner, repo) = trimmed.split_once('/')?;
    if repo.contains('/') {
        return None;
    }
    owner_repo(owner, repo, None)
}

/// Derive the listing endpoint for a repository reference.
///
/// GitHub URLs and `owner/repo` shorthand map onto the contents API under
/// `api_base_url`; any other absolute http(s) URL is taken as the listing
/// endpoint itself.
pub fn resolve_listing_url(reference: &str, api_base_url: &str) -> Option<String> {
    if let Some(parsed) =
        parse_github_repo_url(reference).or_else(|| parse_repo_shorthand(reference))
    {
        return Some(parsed.contents_url(api_base_url));
    }

    let trimmed = reference.trim();
    if is_github_web_url(trimmed) {
        // A github.com page that is not a repository root
        return None;
    }
    let is_http = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    let has_host = trimmed
        .split_once("://")
        .map(|(_, rest)| !rest.is_empty() && !rest.starts_with('/'))
        .unwrap_or(false);
    (is_http && has_host).then(|| trimmed.to_string())
}

fn is_github_web_url(input: &str) -> bool {
    ["https://github.com", "http://github.com", "https://www.github.com"]
        .iter()
        .any(|prefix| input.starts_with(prefix))
}

fn owner_repo(owner: &str, repo: &str, r#ref: Option<String>) -> Option<ParsedRepositoryUrl> {
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(ParsedRepositoryUrl {
        owner: owner.to_string(),
        repo: repo.to_string(),
        r#ref,
    })
}
