//! Tabular data source: CSV from a local path or an http(s) URL.
//!
//! The header row must name `sender`, `subject` and `body` (any case).
//! Every other column is kept as a passthrough field on the record.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{error, info};

use crate::error::SourceError;
use crate::pipeline::types::InputRecord;

const REQUIRED_COLUMNS: [&str; 3] = ["sender", "subject", "body"];

/// Load records from `location`, which is either a URL or a file path.
pub async fn load_records(location: &str) -> Result<Vec<InputRecord>, SourceError> {
    let text = if is_url(location) {
        fetch_url(&normalize_source_url(location)).await?
    } else {
        tokio::fs::read_to_string(Path::new(location))
            .await
            .map_err(|source| SourceError::Io {
                path: location.to_string(),
                source,
            })?
    };

    let records = parse_records(&text)?;
    info!(source = %location, count = records.len(), "Loaded records");
    Ok(records)
}

/// Like [`load_records`], but a load failure becomes an empty record set.
pub async fn load_or_empty(location: &str) -> Vec<InputRecord> {
    match load_records(location).await {
        Ok(records) => records,
        Err(e) => {
            error!(source = %location, error = %e, "Error loading data from source");
            Vec::new()
        }
    }
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Rewrite a GitHub file page URL to its raw-content URL.
///
/// `https://github.com/{owner}/{repo}/blob/{branch}/{path}` becomes
/// `https://raw.githubusercontent.com/{owner}/{repo}/{branch}/{path}`.
/// Other URLs pass through unchanged.
pub fn normalize_source_url(url: &str) -> String {
    let Some(rest) = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
    else {
        return url.to_string();
    };

    let parts: Vec<&str> = rest.splitn(4, '/').collect();
    match parts.as_slice() {
        [owner, repo, "blob", tail] => {
            format!("https://raw.githubusercontent.com/{owner}/{repo}/{tail}")
        }
        _ => url.to_string(),
    }
}

async fn fetch_url(url: &str) -> Result<String, SourceError> {
    let http_err = |reason: String| SourceError::Http {
        url: url.to_string(),
        reason,
    };

    let response = reqwest::get(url).await.map_err(|e| http_err(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(http_err(format!("HTTP {status}")));
    }
    response.text().await.map_err(|e| http_err(e.to_string()))
}

/// Parse CSV text with a header row into records.
pub fn parse_records(text: &str) -> Result<Vec<InputRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    for (i, header) in headers.iter().enumerate() {
        if headers[..i].iter().any(|h| h.eq_ignore_ascii_case(header)) {
            return Err(SourceError::DuplicateColumn(header.clone()));
        }
    }

    let mut index = [0usize; 3];
    for (slot, column) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
            .ok_or_else(|| SourceError::MissingColumn(column.to_string()))?;
    }
    let [sender_idx, subject_idx, body_idx] = index;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or_default().to_string();

        let extra: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !index.contains(i))
            .map(|(i, h)| (h.clone(), field(i)))
            .collect();

        records.push(InputRecord {
            sender: field(sender_idx),
            subject: field(subject_idx),
            body: field(body_idx),
            extra,
        });
    }
    Ok(records)
}
