//! TSV request list: `url<TAB>label;label`, one per line.
//!
//! Blank lines and lines starting with `#` are skipped. A missing label
//! column means the default "market price" label.

use anyhow::{Context, Result};
use price_extraction::ExtractionRequest;
use std::path::Path;
use tracing::warn;

pub fn read_requests(path: &Path) -> Result<Vec<ExtractionRequest>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_requests(&raw))
}

pub fn parse_requests(raw: &str) -> Vec<ExtractionRequest> {
    let mut requests = Vec::new();

    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut columns = line.splitn(2, '\t');
        let url = columns.next().unwrap_or_default().trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            warn!(line = line_no + 1, value = %url, "skipping line without an http(s) URL");
            continue;
        }

        let labels: Vec<&str> = columns
            .next()
            .map(|col| col.split(';').collect())
            .unwrap_or_default();
        requests.push(ExtractionRequest::new(url).with_labels(labels));
    }

    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_requests() {
        let raw = "# url\tlabels\n\
                   https://www.ishares.com/us/products/239726/\tClosing Price;NAV\n\
                   \n\
                   https://www.ipathetn.com/US/16/en/details.app?instrumentId=1\tNotes Outstanding\n\
                   https://funds.example/plain\n\
                   not-a-url\tprice\n";

        let requests = parse_requests(raw);
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].labels, vec!["closing price", "nav"]);
        assert!(requests[1].wants_share_count());
        assert_eq!(requests[2].primary_label(), "market price");
    }

    #[test]
    fn test_read_requests_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://funds.example/a\tnav").unwrap();

        let requests = read_requests(file.path()).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://funds.example/a");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(read_requests(Path::new("/nonexistent/requests.tsv")).is_err());
    }
}
