// Same-domain link scraping
// <a href> values resolved against the page URL, filtered by primary domain

use crate::error::FetchError;
use crate::transport::FeedClient;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use std::net::IpAddr;
use tracing::warn;

/// `<a ... href=...>` with double, single or no quotes around the value
static ANCHOR_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("anchor href pattern is valid")
});

/// GET `url` and return the same-domain links found in the page.
///
/// Relative links are resolved against the final URL after redirects.
pub async fn extract_links(client: &FeedClient, url: &str) -> Result<Vec<String>, FetchError> {
    let response = client.get(url).await?;
    let base = response.url().clone();
    let html = response.text().await?;

    Ok(links_in(&html, &base))
}

/// Same-domain links in `html`, in document order
pub fn links_in(html: &str, base: &Url) -> Vec<String> {
    let domain = host_domain(base);
    let mut links = Vec::new();

    for caps in ANCHOR_HREF.captures_iter(html) {
        let Some(href) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
            continue;
        };

        let link = match base.join(href.as_str().trim()) {
            Ok(link) => link,
            Err(e) => {
                warn!(href = href.as_str(), error = %e, "Ignoring bad link");
                continue;
            }
        };

        let same_domain = match (&domain, link.host_str()) {
            (Some(domain), Some(host)) => host.contains(domain.as_str()),
            _ => false,
        };
        if same_domain {
            links.push(link.to_string());
        }
    }

    links
}

/// Primary domain of a URL: the last two host labels.
///
/// IP literals and single-label hosts (`localhost`) are returned whole.
pub fn host_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return Some(host.to_string());
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return Some(host.to_string());
    }
    Some(labels[labels.len() - 2..].join("."))
}
