//! Reading grammar sources from disk or over HTTP

use super::SourceError;

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Read `location`: an `http(s)://` URL is fetched, anything else is a file path
pub async fn fetch(location: &str) -> Result<Vec<u8>, SourceError> {
    tracing::info!(location, "fetching grammar source");
    if is_remote(location) {
        fetch_remote(location).await
    } else {
        tokio::fs::read(location)
            .await
            .map_err(|e| SourceError::Io {
                location: location.to_string(),
                message: e.to_string(),
            })
    }
}

async fn fetch_remote(location: &str) -> Result<Vec<u8>, SourceError> {
    let http_error = |e: reqwest::Error| SourceError::Http {
        location: location.to_string(),
        message: e.to_string(),
    };

    let response = reqwest::get(location).await.map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            location: location.to_string(),
            status: status.as_u16(),
        });
    }
    let bytes = response.bytes().await.map_err(http_error)?;
    Ok(bytes.to_vec())
}

/// Fetch and decode as UTF-8
pub async fn fetch_text(location: &str) -> Result<String, SourceError> {
    let bytes = fetch(location).await?;
    String::from_utf8(bytes).map_err(|_| SourceError::NotUtf8 {
        location: location.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("https://example.com/sql.y"));
        assert!(is_remote("http://localhost/sql.y"));
        assert!(!is_remote("../sql/parser/sql.y"));
        assert!(!is_remote("httpdocs/sql.y"));
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let path = std::env::temp_dir().join(format!("sqldiagram-fetch-{}.y", std::process::id()));
        tokio::fs::write(&path, "%%\na: 'x' ;\n").await.unwrap();
        let text = fetch_text(path.to_str().unwrap()).await.unwrap();
        assert_eq!(text, "%%\na: 'x' ;\n");
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = fetch("/definitely/not/here/sql.y").await.unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
