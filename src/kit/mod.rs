// Kit - small HTTP and file helpers that sit next to the feed extractor
//
// - download: fetch a URL to disk, hashing as it streams
// - links: same-domain <a href> links from an HTML page

pub mod download;
pub mod links;

pub use download::{download, hash_file, Download, FileDigest};
pub use links::{extract_links, host_domain, links_in};
