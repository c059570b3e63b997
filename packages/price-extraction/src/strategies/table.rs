//! Label-driven table scraping.
//!
//! Fund fact sheets put most figures in two-column tables or definition
//! lists. A row qualifies when its header cell carries one of the request
//! labels; the value is the first plausible number in a later cell.

use async_trait::async_trait;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::browsers::render::collapse_whitespace;
use crate::pipeline::session::PageAccess;
use crate::strategies::scan::{check_candidate, tally, CandidateRules, LabelValidators, ScanStats};
use crate::traits::strategy::ExtractionStrategy;
use crate::types::{
    outcome::{ExtractionOutcome, StrategyTier},
    request::ExtractionRequest,
};
use crate::validation::{find_keyword, numeric::NUMBER_TOKEN};

lazy_static! {
    static ref ROW: Selector = Selector::parse("tr").unwrap();
    static ref CELL: Selector = Selector::parse("th, td").unwrap();
    static ref TERM: Selector = Selector::parse("dt").unwrap();
}

/// One header/value row pulled out of the DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LabeledRow {
    header: String,
    values: Vec<String>,
}

pub struct TableStrategy {
    validators: LabelValidators,
}

impl Default for TableStrategy {
    fn default() -> Self {
        Self::new(LabelValidators::default())
    }
}

impl TableStrategy {
    pub fn new(validators: LabelValidators) -> Self {
        Self { validators }
    }

    /// Scan an HTML document for the request's labels.
    pub fn scan_html(
        &self,
        request: &ExtractionRequest,
        html: &str,
        source_url: &str,
    ) -> ExtractionOutcome {
        let rows = labeled_rows(html);
        let validator = self.validators.for_request(request);
        let rules = CandidateRules::default();
        let mut stats = ScanStats::default();

        for label in &request.labels {
            let wanted = [label.clone()];
            for row in &rows {
                if find_keyword(&row.header.to_lowercase(), &wanted).is_none() {
                    continue;
                }

                for cell in &row.values {
                    // The header rides along so the validator sees the label.
                    let line = format!("{} {}", row.header, cell);
                    let offset = row.header.len() + 1;

                    for number in NUMBER_TOKEN.find_iter(cell) {
                        let verdict = check_candidate(
                            &line,
                            offset + number.start(),
                            offset + number.end(),
                            &rules,
                            validator,
                            source_url,
                        );
                        if let Some(value) = tally(&mut stats, verdict) {
                            debug!(
                                label = %label,
                                header = %row.header,
                                %value,
                                "table row matched"
                            );
                            return ExtractionOutcome::success(value, label.as_str());
                        }
                    }
                }
            }
        }

        stats.into_failure(self.name())
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// `<tr>` rows (first cell is the header) and `<dt>`/`<dd>` pairs, in
/// document order per kind.
fn labeled_rows(html: &str) -> Vec<LabeledRow> {
    let document = Html::parse_document(html);
    let mut rows = Vec::new();

    for tr in document.select(&ROW) {
        let mut cells = tr.select(&CELL).map(element_text);
        let Some(header) = cells.next() else {
            continue;
        };
        let values: Vec<String> = cells.filter(|c| !c.is_empty()).collect();
        if !values.is_empty() {
            rows.push(LabeledRow { header, values });
        }
    }

    for dt in document.select(&TERM) {
        let dd = dt
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .filter(|el| el.value().name() == "dd");
        if let Some(dd) = dd {
            rows.push(LabeledRow {
                header: element_text(dt),
                values: vec![element_text(dd)],
            });
        }
    }

    rows
}

#[async_trait]
impl ExtractionStrategy for TableStrategy {
    fn name(&self) -> &str {
        "generic-table"
    }

    fn tier(&self) -> StrategyTier {
        StrategyTier::Generic
    }

    async fn attempt(
        &self,
        request: &ExtractionRequest,
        page: &mut PageAccess<'_>,
    ) -> ExtractionOutcome {
        match page.load(&request.url).await {
            Ok(snapshot) => self.scan_html(request, &snapshot.html, &snapshot.final_url),
            Err(err) => err.into(),
        }
    }
}
