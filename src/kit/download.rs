// Download with content digest, and digests of local files

use crate::error::FetchError;
use crate::transport::FeedClient;
use futures::StreamExt;
use reqwest::Response;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Read buffer for hashing local files
const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Result of a completed download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    /// Bytes written
    pub size: u64,
    /// Lowercase hex SHA-256 of the bytes written
    pub sha256: String,
}

/// Digest and size of a local file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDigest {
    pub sha256: String,
    pub size: u64,
}

/// Download `url` to `path`, creating parent directories as needed.
///
/// The body is hashed while it is written, so the digest always describes
/// exactly what landed on disk. On a non-success status nothing is created;
/// if the body fails part way, the partial file is removed.
pub async fn download(
    client: &FeedClient,
    url: &str,
    path: &Path,
) -> Result<Download, FetchError> {
    let response = client.get(url).await?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut file = tokio::fs::File::create(path).await?;
    match write_body(response, &mut file).await {
        Ok(result) => {
            debug!(
                url = %url,
                path = %path.display(),
                size = result.size,
                sha256 = %result.sha256,
                "Downloaded"
            );
            Ok(result)
        }
        Err(e) => {
            // A truncated file would not match any digest we could report
            drop(file);
            if let Err(rm) = tokio::fs::remove_file(path).await {
                warn!(path = %path.display(), error = %rm, "Failed to remove partial download");
            }
            Err(e)
        }
    }
}

/// Stream a response body into `file`, hashing as it goes
async fn write_body(
    response: Response,
    file: &mut tokio::fs::File,
) -> Result<Download, FetchError> {
    let mut hasher = Sha256::new();
    let mut size = 0u64;

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        hasher.update(&chunk);
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(Download {
        size,
        sha256: format!("{:x}", hasher.finalize()),
    })
}

/// SHA-256 digest and size of a file
pub fn hash_file(path: &Path) -> io::Result<FileDigest> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok(FileDigest {
        sha256: format!("{:x}", hasher.finalize()),
        size,
    })
}
