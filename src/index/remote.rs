//! Reads the remote archive listing page.
//!
//! The listing is a plain HTML table: a header row, a separator row, then one
//! row per archive with name, last-modified date and size columns. Any other
//! column is ignored.

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::{debug, info};

use super::ArchiveRecord;
use crate::error::RemoteListingError;

/// Date format used in the listing's last-modified column.
pub const LISTING_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Header row and separator row.
const SKIP_ROWS: usize = 2;

/// Fetches the listing page and parses it into archive records.
pub async fn list_remote(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<ArchiveRecord>, RemoteListingError> {
    info!(url, "Fetching remote archive listing");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| RemoteListingError::Fetch {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(RemoteListingError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| RemoteListingError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let records = parse_listing(&body, url)?;
    info!(url, archives = records.len(), "Remote listing parsed");

    Ok(records)
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    name: usize,
    date: usize,
    size: usize,
}

/// Parses listing HTML. `url` is only used for error context.
pub fn parse_listing(html: &str, url: &str) -> Result<Vec<ArchiveRecord>, RemoteListingError> {
    let layout_error = |reason: &str| RemoteListingError::Layout {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let table = table_regex()
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| layout_error("no <table> element"))?
        .as_str();

    let rows: Vec<Vec<String>> = row_regex()
        .captures_iter(table)
        .filter_map(|c| c.get(1))
        .map(|row| {
            cell_regex()
                .captures_iter(row.as_str())
                .filter_map(|c| c.get(1))
                .map(|cell| clean_cell(cell.as_str()))
                .collect()
        })
        .collect();

    let header = rows.first().ok_or_else(|| layout_error("table has no rows"))?;
    let columns = locate_columns(header).ok_or_else(|| {
        layout_error(&format!(
            "expected name, last modified and size columns, found {:?}",
            header
        ))
    })?;

    let mut records = Vec::new();
    for row in rows.iter().skip(SKIP_ROWS) {
        let name = row.get(columns.name).map(String::as_str).unwrap_or("");
        if name.is_empty() {
            debug!(?row, "Skipping listing row without a name");
            continue;
        }

        let date = row.get(columns.date).map(String::as_str).unwrap_or("");
        let timestamp = if date.is_empty() {
            None
        } else {
            let parsed = NaiveDateTime::parse_from_str(date, LISTING_DATE_FORMAT).map_err(
                |source| RemoteListingError::Timestamp {
                    url: url.to_string(),
                    name: name.to_string(),
                    value: date.to_string(),
                    source,
                },
            )?;
            Some(parsed)
        };

        let size_kb = row
            .get(columns.size)
            .map(|s| parse_size_kb(s))
            .unwrap_or(0);

        records.push(ArchiveRecord::new(name, timestamp, size_kb));
    }

    Ok(records)
}

fn locate_columns(header: &[String]) -> Option<Columns> {
    let find = |pred: &dyn Fn(&str) -> bool| {
        header
            .iter()
            .position(|cell| pred(cell.to_lowercase().as_str()))
    };

    Some(Columns {
        name: find(&|c| c == "name")?,
        date: find(&|c| c.contains("modified") || c == "date")?,
        size: find(&|c| c == "size")?,
    })
}

/// Converts listing sizes such as `88K`, `94M`, `1.1G` or `-` to kilobytes.
pub fn parse_size_kb(size: &str) -> u64 {
    let size = size.trim();
    let (number, multiplier) = match size.chars().last() {
        Some('K') | Some('k') => (&size[..size.len() - 1], 1.0),
        Some('M') | Some('m') => (&size[..size.len() - 1], 1024.0),
        Some('G') | Some('g') => (&size[..size.len() - 1], 1024.0 * 1024.0),
        // Bare numbers are bytes
        _ => (size, 1.0 / 1000.0),
    };

    number
        .trim()
        .parse::<f64>()
        .map(|n| (n * multiplier).round() as u64)
        .unwrap_or(0)
}

fn clean_cell(cell: &str) -> String {
    let text = tag_regex().replace_all(cell, "");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

fn table_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<table[^>]*>(.*?)</table>").expect("valid regex"))
}

fn row_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("valid regex"))
}

fn cell_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<t[dh][^>]*>(.*?)</t[dh]>").expect("valid regex"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"))
}

// -- Tests -------------------------------------------------------------------
