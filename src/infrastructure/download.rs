use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::common::error::GroveError;
use crate::common::executor::{BytesTask, Task};
use crate::common::result::GroveResult;

/// URLの最後のパスセグメントをファイル名として使う
pub fn file_name_from_url(url: &str) -> GroveResult<String> {
    let parsed = Url::parse(url).map_err(|e| {
        GroveError::validation_error("url", e.to_string(), Some(url.to_string()))
    })?;
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| {
            GroveError::validation_error(
                "url",
                "cannot derive a file name from the url",
                Some(url.to_string()),
            )
        })
}

/// HTTPダウンロードのソース
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> GroveResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("grove/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// GETリクエストを送り、レスポンスボディを読むバイト転送タスクを返す
    pub fn open(&self, url: &str) -> GroveResult<Task<BytesTask>> {
        let name = file_name_from_url(url)?;
        let response = self.client.get(url).send()?.error_for_status()?;
        let total = response.content_length();
        debug!("Opened {} ({:?} bytes)", url, total);
        Ok(BytesTask::task(name, response, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://example.com/releases/v1/tool-linux.tar.gz").unwrap(),
            "tool-linux.tar.gz"
        );
        assert_eq!(
            file_name_from_url("https://example.com/dir/asset.zip/?x=1").unwrap(),
            "asset.zip"
        );
        assert!(file_name_from_url("https://example.com/").is_err());
        assert!(file_name_from_url("not a url").is_err());
    }
}
