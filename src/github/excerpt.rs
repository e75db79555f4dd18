use globset::{Glob, GlobSet, GlobSetBuilder};

use super::Repository;
use crate::text::clip;

/// Paths listed in the prompt, mirroring the tree overview
pub const MAX_LISTED_PATHS: usize = 100;
const MAX_FILE_BYTES: usize = 4 * 1024;
const MAX_EXCERPT_BYTES: usize = 48 * 1024;

const EXCLUDED: &[&str] = &[
    "**/node_modules/**",
    "**/vendor/**",
    "**/dist/**",
    "**/build/**",
    "**/target/**",
    "**/.git/**",
    "**/*.min.js",
    "**/*.lock",
    "**/package-lock.json",
    "**/pnpm-lock.yaml",
];

const README: &[&str] = &["README*", "readme*", "Readme*"];

const MANIFESTS: &[&str] = &[
    "**/Cargo.toml",
    "**/package.json",
    "**/requirements.txt",
    "**/pyproject.toml",
    "**/go.mod",
    "**/pom.xml",
    "**/build.gradle",
    "**/build.gradle.kts",
    "**/Gemfile",
    "**/composer.json",
    "**/Dockerfile",
    "**/docker-compose.yml",
    "**/.github/workflows/*.yml",
];

const SOURCES: &[&str] = &[
    "**/*.rs", "**/*.py", "**/*.js", "**/*.jsx", "**/*.ts", "**/*.tsx", "**/*.go", "**/*.java",
    "**/*.kt", "**/*.rb", "**/*.php", "**/*.cs", "**/*.cpp", "**/*.c", "**/*.h", "**/*.swift",
    "**/*.scala", "**/*.vue", "**/*.svelte",
];

/// Picks which repository files go into the evaluation prompt
pub struct ExcerptSelector {
    excluded: GlobSet,
    // Ordered by priority: README, manifests, sources
    tiers: [GlobSet; 3],
}

impl ExcerptSelector {
    pub fn new() -> Result<Self, globset::Error> {
        Ok(Self {
            excluded: build_set(EXCLUDED)?,
            tiers: [build_set(README)?, build_set(MANIFESTS)?, build_set(SOURCES)?],
        })
    }

    /// Up to `max_files` paths, README first, then manifests, then sources;
    /// shallower paths win within a tier
    pub fn select(&self, paths: &[String], max_files: usize) -> Vec<String> {
        let mut ranked: Vec<(usize, usize, &String)> = paths
            .iter()
            .filter(|path| !self.excluded.is_match(path.as_str()))
            .filter_map(|path| {
                let tier = self.tiers.iter().position(|set| set.is_match(path.as_str()))?;
                Some((tier, path.matches('/').count(), path))
            })
            .collect();

        ranked.sort();
        ranked
            .into_iter()
            .take(max_files)
            .map(|(_, _, path)| path.clone())
            .collect()
    }
}

fn build_set(patterns: &[&str]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

/// Render the prompt excerpt: metadata, file listing, then file bodies
pub fn render(repository: &Repository, paths: &[String], files: &[(String, String)]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Repository: {}\n", repository.full_name));
    if let Some(description) = repository.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("Description: {}\n", description));
    }
    if let Some(language) = &repository.language {
        out.push_str(&format!("Primary language: {}\n", language));
    }

    let listed: Vec<&str> = paths.iter().take(MAX_LISTED_PATHS).map(String::as_str).collect();
    out.push_str(&format!("\nFiles ({} of {}):\n", listed.len(), paths.len()));
    out.push_str(&listed.join("\n"));
    out.push('\n');

    for (path, content) in files {
        let remaining = MAX_EXCERPT_BYTES.saturating_sub(out.len());
        if remaining < 256 {
            break;
        }
        let body = clip(content, MAX_FILE_BYTES.min(remaining - 128));
        out.push_str(&format!("\n--- {} ---\n{}\n", path, body));
        if body.len() < content.len() {
            out.push_str("[truncated]\n");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn repository() -> Repository {
        Repository {
            id: 1,
            name: "widget".into(),
            full_name: "acme/widget".into(),
            html_url: "https://github.com/acme/widget".into(),
            default_branch: "main".into(),
            description: Some("AI widget".into()),
            language: Some("Rust".into()),
            stargazers_count: 0,
        }
    }

    #[test]
    fn test_select_prioritizes_readme_and_manifests() {
        let selector = ExcerptSelector::new().unwrap();
        let tree = paths(&[
            "src/deep/nested/util.rs",
            "src/main.rs",
            "Cargo.toml",
            "README.md",
            "docs/logo.png",
            "node_modules/left-pad/index.js",
            "Cargo.lock",
        ]);

        let selected = selector.select(&tree, 10);
        assert_eq!(
            selected,
            paths(&["README.md", "Cargo.toml", "src/main.rs", "src/deep/nested/util.rs"])
        );
    }

    #[test]
    fn test_select_honors_limit() {
        let selector = ExcerptSelector::new().unwrap();
        let tree: Vec<String> = (0..50).map(|i| format!("src/file{}.py", i)).collect();
        assert_eq!(selector.select(&tree, 12).len(), 12);
    }

    #[test]
    fn test_render_truncates_large_files() {
        let big = "x".repeat(10 * 1024);
        let files = vec![("src/main.rs".to_string(), big)];
        let text = render(&repository(), &paths(&["src/main.rs"]), &files);

        assert!(text.contains("Repository: acme/widget"));
        assert!(text.contains("--- src/main.rs ---"));
        assert!(text.contains("[truncated]"));
        assert!(text.len() < 6 * 1024);
    }

    #[test]
    fn test_render_caps_total_size() {
        let files: Vec<(String, String)> = (0..40)
            .map(|i| (format!("src/f{}.rs", i), "y".repeat(4096)))
            .collect();
        let listing: Vec<String> = files.iter().map(|(p, _)| p.clone()).collect();
        let text = render(&repository(), &listing, &files);
        assert!(text.len() <= MAX_EXCERPT_BYTES + 64);
    }
}
