//! Resolution of index-page hrefs into absolute article URLs.
//!
//! Links on the index page are a mix of absolute URLs, root-relative paths
//! with and without the locale segment, and bare relative paths. Rules, in
//! order:
//!
//! 1. Absent or blank href: no URL.
//! 2. Absolute `http(s)` URL: used as-is. Protocol-relative `//host/path`
//!    takes the site's scheme.
//! 3. Anything else with a scheme (`mailto:`, `javascript:`), or a bare
//!    fragment: no URL.
//! 4. Relative path: dot segments are resolved against the site root, then
//!    the path is prefixed with the site domain and, unless already present
//!    in any letter case, the locale segment.
//!
//! A link that cannot be resolved drops its own candidate, never the batch.

use url::Url;

#[derive(Debug, Clone)]
pub struct LinkNormalizer {
    /// `scheme://host[:port]`, no trailing slash.
    domain: String,
    /// `/es` style, or empty when the site has no locale segment.
    locale: String,
    origin: Url,
}

impl LinkNormalizer {
    /// Build a normalizer for `domain` (e.g. `https://orain.eus`) and
    /// `locale` (e.g. `/es`). Returns `None` when `domain` is not an absolute
    /// http(s) URL.
    pub fn new(domain: &str, locale: &str) -> Option<Self> {
        let origin = Url::parse(domain).ok()?;
        if !matches!(origin.scheme(), "http" | "https") || origin.host_str().is_none() {
            return None;
        }
        let locale = locale.trim_matches('/');
        Some(Self {
            domain: domain.trim_end_matches('/').to_string(),
            locale: if locale.is_empty() {
                String::new()
            } else {
                format!("/{}", locale)
            },
            origin,
        })
    }

    /// Resolve an article href. See the module docs for the rules.
    pub fn normalize(&self, href: Option<&str>) -> Option<String> {
        let path = match self.classify(href?)? {
            Href::Absolute(url) => return Some(url),
            Href::Relative(path) => path,
        };
        let path = if self.locale.is_empty() || has_prefix_segment(&path, &self.locale) {
            path
        } else if path == "/" {
            self.locale.clone()
        } else {
            format!("{}{}", self.locale, path)
        };
        self.validated(format!("{}{}", self.domain, path))
    }

    /// Resolve an asset href (images). Same as [`normalize`](Self::normalize)
    /// but relative paths only get the domain, never the locale segment.
    pub fn resolve_asset(&self, href: Option<&str>) -> Option<String> {
        match self.classify(href?)? {
            Href::Absolute(url) => Some(url),
            Href::Relative(path) => self.validated(format!("{}{}", self.domain, path)),
        }
    }

    /// Whether `url` belongs to the site: same scheme family and the same
    /// host or one of its subdomains, on the same port.
    pub fn is_same_site(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let (Some(host), Some(site)) = (parsed.host_str(), self.origin.host_str()) else {
            return false;
        };
        let host_matches = host.eq_ignore_ascii_case(site)
            || host
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", site.to_ascii_lowercase()));
        matches!(parsed.scheme(), "http" | "https")
            && host_matches
            && parsed.port_or_known_default() == self.origin.port_or_known_default()
    }

    fn classify(&self, href: &str) -> Option<Href> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        if let Some(rest) = href.strip_prefix("//") {
            let url = format!("{}://{}", self.origin.scheme(), rest);
            return self.validated(url).map(Href::Absolute);
        }
        if has_scheme(href) {
            let parsed = Url::parse(href).ok()?;
            return match parsed.scheme() {
                "http" | "https" if parsed.host_str().is_some() => {
                    Some(Href::Absolute(href.to_string()))
                }
                _ => None,
            };
        }
        let path = href.trim_start_matches("./").trim_start_matches('/');
        let resolved = self.origin.join(&format!("/{}", path)).ok()?;
        let mut path = resolved.path().to_string();
        if let Some(query) = resolved.query() {
            path.push('?');
            path.push_str(query);
        }
        if let Some(fragment) = resolved.fragment() {
            path.push('#');
            path.push_str(fragment);
        }
        Some(Href::Relative(path))
    }

    /// Serialized form of `url`, or `None` when it does not parse.
    fn validated(&self, url: String) -> Option<String> {
        Url::parse(&url).ok().map(String::from)
    }
}

enum Href {
    Absolute(String),
    Relative(String),
}

/// `scheme:` prefix per RFC 3986: a letter followed by letters, digits,
/// `+`, `-` or `.`.
fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// `/es`, `/ES/...`, `/es?..` and `/es#..` all start with the `/es` segment;
/// `/espana` does not.
fn has_prefix_segment(path: &str, segment: &str) -> bool {
    match (path.get(..segment.len()), path.get(segment.len()..)) {
        (Some(head), Some(rest)) if head.eq_ignore_ascii_case(segment) => {
            rest.is_empty() || rest.starts_with(['/', '?', '#'])
        }
        _ => false,
    }
}
