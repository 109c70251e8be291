//! Site URL normalization and slug derivation.

use url::Url;

/// Why a caller-supplied URL was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("URL is empty")]
    Empty,
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("{0}")]
    Malformed(#[from] url::ParseError),
}

/// Normalize a WordPress site root: trailing slashes stripped, bare hosts
/// coerced to HTTPS.
///
/// The returned string is used as a prefix for `/wp-json/...` endpoints and
/// for the slug URL, so it never ends with `/`.
pub fn normalize_site_url(raw: &str) -> Result<String, UrlError> {
    let with_scheme = coerce_scheme(raw.trim())?;
    let root = with_scheme.trim_end_matches('/');
    check_url(root)?;
    Ok(root.to_string())
}

/// Normalize a resource URL such as the featured image: only the scheme is
/// coerced, the path is left alone.
pub fn normalize_resource_url(raw: &str) -> Result<String, UrlError> {
    let with_scheme = coerce_scheme(raw.trim())?;
    check_url(&with_scheme)?;
    Ok(with_scheme)
}

fn coerce_scheme(raw: &str) -> Result<String, UrlError> {
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }
    if raw.contains("://") {
        Ok(raw.to_string())
    } else {
        Ok(format!("https://{}", raw.trim_start_matches('/')))
    }
}

fn check_url(candidate: &str) -> Result<(), UrlError> {
    let parsed = Url::parse(candidate)?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::UnsupportedScheme(other.to_string())),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::Malformed(url::ParseError::EmptyHost));
    }
    Ok(())
}

/// Lowercase a title and replace every run of characters outside `[a-z0-9]`
/// with a single hyphen. Runs at either end become hyphens too.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_run = false;

    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            in_run = false;
        } else if !in_run {
            slug.push('-');
            in_run = true;
        }
    }

    slug
}

/// Permalink of the form `<site>/<slug>/`.
pub fn slug_url(site_root: &str, slug: &str) -> String {
    format!("{}/{}/", site_root.trim_end_matches('/'), slug)
}
