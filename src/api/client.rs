use crate::config::Config;
use crate::types::{ChartData, HistoryDetail, HistoryItem};
use crate::util::is_local_endpoint_url;
use anyhow::{anyhow, bail, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, query: &str) -> Result<ByteStream>;
}

#[derive(Deserialize)]
struct HistoryEnvelope {
    history: Vec<HistoryItem>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| anyhow!("invalid backend URL '{}': {e}", config.base_url))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "backend URL '{}' must use http or https",
                config.base_url
            );
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            #[cfg(test)]
            mock_stream_producer: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: Url::parse("http://localhost:5000").expect("static URL"),
            mock_stream_producer: Some(mock_producer),
        }
    }

    /// Opens the research run as a raw SSE byte stream. The caller feeds the
    /// chunks through `StreamParser`; chunk boundaries carry no meaning.
    pub async fn create_research_stream(&self, query: &str) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(query);
            }
        }

        let request_url = self.endpoint(&["api", "research"])?;
        let response = self
            .http
            .post(request_url.clone())
            .header("content-type", "application/json")
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|error| map_api_request_error(error, request_url.as_str()))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, request_url.as_str()))?;

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, request_url_for_stream.as_str()))
        });
        Ok(Box::pin(stream))
    }

    /// Chart lookup is keyed by the literal query string; the backend resolves
    /// the ticker. Any failure here degrades to a placeholder pane.
    pub async fn fetch_chart(&self, query: &str) -> Result<ChartData> {
        let request_url = self.endpoint(&["api", "chart", query])?;
        let body: serde_json::Value = self.get_json(request_url).await?;
        if let Some(error) = body.get("error").and_then(|v| v.as_str()) {
            bail!("chart unavailable: {error}");
        }
        Ok(serde_json::from_value(body)?)
    }

    pub async fn fetch_history(&self, limit: usize) -> Result<Vec<HistoryItem>> {
        let mut request_url = self.endpoint(&["api", "history"])?;
        request_url
            .query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let envelope: HistoryEnvelope =
            serde_json::from_value(self.get_json(request_url).await?)?;
        Ok(envelope.history)
    }

    pub async fn fetch_history_detail(&self, id: i64) -> Result<HistoryDetail> {
        let request_url = self.endpoint(&["api", "history", &id.to_string()])?;
        let body = self.get_json(request_url).await?;
        if let Some(error) = body.get("error").and_then(|v| v.as_str()) {
            bail!("history entry unavailable: {error}");
        }
        Ok(serde_json::from_value(body)?)
    }

    async fn get_json(&self, request_url: Url) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(request_url.clone())
            .send()
            .await
            .map_err(|error| map_api_request_error(error, request_url.as_str()))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, request_url.as_str()))?;
        Ok(response.json().await?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| anyhow!("backend URL '{}' cannot carry a path", self.base_url))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach research backend '{}': {}. Start the backend or set FINSIGHT_BASE_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach research backend '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!(
            "research backend '{}' returned HTTP {}: {}",
            request_url,
            status,
            error
        );
    }
    anyhow!("request to '{}' failed: {}", request_url, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_client::MockBackend;
    use crate::api::stream::StreamParser;
    use crate::state::Session;
    use crate::types::StageStatus;

    fn test_config(base_url: &str) -> Config {
        Config {
            base_url: base_url.to_string(),
            history_limit: 10,
            export_path: None,
            working_dir: std::path::PathBuf::from("."),
        }
    }

    #[test]
    fn test_endpoint_joins_and_encodes_path_segments() {
        let client = ApiClient::new(&test_config("http://localhost:5000")).expect("client");
        let url = client
            .endpoint(&["api", "chart", "Is Amazon a good investment?"])
            .expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/chart/Is%20Amazon%20a%20good%20investment%3F"
        );
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash_in_base_url() {
        let client = ApiClient::new(&test_config("http://localhost:5000/")).expect("client");
        let url = client.endpoint(&["api", "research"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:5000/api/research");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(ApiClient::new(&test_config("not a url")).is_err());
    }

    #[test]
    fn test_schemeless_base_url_is_rejected() {
        // "localhost:5000" parses with "localhost" as the scheme.
        assert!(ApiClient::new(&test_config("localhost:5000")).is_err());
    }

    #[tokio::test]
    async fn test_mock_stream_drives_a_full_run() {
        let backend = MockBackend::new(vec![vec![
            "event: status\ndata: {\"stage\": \"planning\", \"done\": true}\n\n".to_string(),
            "event: status\ndata: {\"stage\": \"searching\", \"done\": true}\n\n".to_string(),
            "event: status\ndata: {\"stage\": \"writing\", \"done\": true}\n\n".to_string(),
            "event: status\ndata: {\"stage\": \"verifying\", \"done\": true}\n\n".to_string(),
            concat!(
                "event: complete\n",
                "data: {\"short_summary\": \"Amazon is a strong buy.\", ",
                "\"markdown_report\": \"# R\", \"follow_up_questions\": [], ",
                "\"verification\": {\"verified\": true, \"issues\": \"\"}}\n\n"
            )
            .to_string(),
        ]]);
        let client = ApiClient::new_mock(Arc::new(backend));

        let mut session = Session::new();
        let generation = session
            .submit("Is Amazon a good investment?")
            .expect("idle session accepts submit");

        let mut stream = client
            .create_research_stream("Is Amazon a good investment?")
            .await
            .expect("mock stream");
        let mut parser = StreamParser::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.expect("mock chunk");
            for event in parser.process(&chunk).expect("parse") {
                session.dispatch(generation, event);
            }
        }

        let run = session.run();
        assert!(run.is_completed());
        assert!(run
            .stage_statuses()
            .iter()
            .all(|(_, status)| *status == StageStatus::Done));

        let summary = &run.result().expect("completed run has result").short_summary;
        assert_eq!(
            crate::render::recommendation(summary),
            crate::render::Recommendation::Buy
        );
        assert_eq!(
            crate::render::company_name(summary).as_deref(),
            Some("Amazon")
        );
    }
}
