use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{Interval, Orientation};
use crate::error::ExportError;
use crate::store::SequenceStore;

pub const DEFAULT_REST_URL: &str = "https://rest.ensembl.org";

#[derive(Clone)]
pub struct EnsemblRestSequenceStore {
    client: Client,
    base_url: String,
    species: String,
}

impl EnsemblRestSequenceStore {
    pub fn new(base_url: &str, species: &str) -> Result<Self, ExportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("spliced-fasta/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ExportError::InvalidConfig(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| ExportError::RestHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            species: species.to_string(),
        })
    }

    pub fn region_url(
        &self,
        seq_region: &str,
        interval: Interval,
        orientation: Orientation,
    ) -> String {
        format!(
            "{}/sequence/region/{}/{}:{}..{}:{}?content-type=text/plain",
            self.base_url,
            self.species,
            seq_region,
            interval.start,
            interval.end,
            orientation.as_db()
        )
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ExportError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "sequence request failed".to_string());
        Err(ExportError::RestStatus { status, message })
    }
}

impl SequenceStore for EnsemblRestSequenceStore {
    fn fetch_range(
        &self,
        seq_region: &str,
        interval: Interval,
        orientation: Orientation,
    ) -> Result<String, ExportError> {
        let interval = Interval::new(interval.start.max(1), interval.end);
        if interval.is_empty() {
            return Ok(String::new());
        }
        let url = self.region_url(seq_region, interval, orientation);
        tracing::trace!(%url, "fetching region");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| ExportError::RestHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let body = response
            .text()
            .map_err(|err| ExportError::RestHttp(err.to_string()))?;
        Ok(body.trim().to_string())
    }
}
