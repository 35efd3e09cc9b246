//! Branch names, commit messages and pull request text

use chrono::{DateTime, Utc};

const MAX_SLUG_LEN: usize = 50;

/// Timestamp used in branch names, e.g. `20260119-143005`
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d-%H%M%S").to_string()
}

/// Escape branch used when the checkout is found on a protected branch
pub fn escape_branch_name(now: DateTime<Utc>) -> String {
    format!("work/{}", timestamp(now))
}

/// Lowercase, ref-safe slug of a free-text description
pub fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    for c in description.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let mut slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() { "update".to_string() } else { slug }
}

/// Fill a branch template's `{timestamp}` and `{description}` placeholders
pub fn branch_name(pattern: &str, timestamp: &str, description: &str) -> String {
    pattern
        .replace("{timestamp}", timestamp)
        .replace("{description}", &slugify(description))
}

/// Fill the commit format's `{type}`, `{scope}` and `{description}` placeholders
pub fn commit_message(format: &str, commit_type: &str, scope: &str, description: &str) -> String {
    format
        .replace("{type}", commit_type)
        .replace("{scope}", scope)
        .replace("{description}", description)
}

/// Pull request body: summary, change type, file list and a static checklist
pub fn pr_body<S: AsRef<str>>(update_type: &str, branch: &str, paths: &[S], description: &str) -> String {
    let mut body = format!(
        "## Summary\n{}\n\n## Type of Change\n- Update Type: {}\n- Branch: {}\n\n## Files Changed\n",
        description, update_type, branch
    );

    for path in paths {
        body.push_str(&format!("- {}\n", path.as_ref()));
    }

    body.push_str(
        "\n## Checklist\n\
         - [x] Changes follow branch-based workflow\n\
         - [x] Commits follow conventional format\n\
         - [x] No direct commits to protected branches\n\
         - [ ] Tests pass (if applicable)\n\
         - [ ] Documentation updated (if needed)\n\
         \n---\n\
         *This PR was created automatically by branchwarden*\n",
    );
    body
}
