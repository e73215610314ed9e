//! Interlibrary loan counts scraped from the statewide statistics page
//!
//! The page only ever shows the previous day, so any explicit date is
//! [`SourceError::Unsupported`]. The statistics live in a frame inside a
//! nested frameset; the table is a lender-by-borrower grid where our library
//! code marks one row (what we lent) and one column (what we borrowed).
//!
//! ## Table layout
//!
//! ```text
//!          col 0     col 1   col 2   col 3 ...
//! row 0    (title)
//! row 1    (header)          code_a  code_b ...     <- borrower codes
//! row 2    code_a    ...     lent_a  borrowed ...   <- borrowed counts
//! row 3    code_b    ...     lent_b
//! ```
//!
//! Usually the code's row index equals its column index. That is only a
//! shortcut: when the header cell at the row index holds another code, the
//! header row is scanned.

use async_trait::async_trait;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, trace};

use crate::config::InterlibraryConfig;
use crate::record::{ReconcileDate, Record};

use super::error::{SourceError, SourceResult};
use super::{Fields, Source, parse_count};

/// First row holding a lender code
const FIRST_LENDER_ROW: usize = 2;
/// Column of the lent total within a lender row
const LENT_COLUMN: usize = 2;
/// Row holding borrower codes
const BORROWER_HEADER_ROW: usize = 1;
/// First column holding a borrower code
const FIRST_BORROWER_COLUMN: usize = 2;
/// Row holding borrowed totals
const BORROWED_ROW: usize = 2;

/// Interlibrary loan contribution to the record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IllFields {
    pub ill_lent: Option<u64>,
    pub ill_borrowed: Option<u64>,
}

impl Fields for IllFields {
    fn apply_to(self, record: &mut Record) {
        record.ill_lent = self.ill_lent;
        record.ill_borrowed = self.ill_borrowed;
    }
}

/// Text content of the statistics table
#[derive(Debug, Clone, Default)]
pub struct ScrapedTable {
    /// All text of the element containing the table
    pub text: String,
    /// Cell texts, row by row
    pub rows: Vec<Vec<String>>,
}

impl ScrapedTable {
    fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }

    /// Find our lent and borrowed totals with bounded linear scans
    pub fn locate(&self, code: &str, max_scan: usize) -> SourceResult<IllFields> {
        let not_found = || SourceError::NotFound(code.to_string());

        let row = (FIRST_LENDER_ROW..self.rows.len())
            .take(max_scan)
            .find(|&row| self.cell(row, 0).is_some_and(|text| text.contains(code)))
            .ok_or_else(not_found)?;
        trace!("lender row {row}");

        let ill_lent = self.cell(row, LENT_COLUMN).and_then(parse_count);

        let column = if self.cell(BORROWER_HEADER_ROW, row) == Some(code) {
            row
        } else {
            let width = self.rows.get(BORROWER_HEADER_ROW).map_or(0, Vec::len);
            (FIRST_BORROWER_COLUMN..width)
                .take(max_scan)
                .find(|&column| {
                    self.cell(BORROWER_HEADER_ROW, column)
                        .is_some_and(|text| text.contains(code))
                })
                .ok_or_else(not_found)?
        };
        trace!("borrower column {column}");

        let ill_borrowed = self.cell(BORROWED_ROW, column).and_then(parse_count);

        Ok(IllFields {
            ill_lent,
            ill_borrowed,
        })
    }
}

fn selector(css: &str) -> SourceResult<Selector> {
    Selector::parse(css).map_err(|e| SourceError::PageStructure(format!("selector {css}: {e}")))
}

fn children<'a>(element: ElementRef<'a>, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

fn nth_child<'a>(element: ElementRef<'a>, name: &'a str, n: usize) -> SourceResult<ElementRef<'a>> {
    children(element, name)
        .nth(n)
        .ok_or_else(|| SourceError::PageStructure(format!("missing <{name}> #{}", n + 1)))
}

fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve the URL of the frame holding the statistics table
///
/// The frame is the second `<frame>` of the second frameset nested in the
/// top-level frameset.
pub fn frame_url(page: &str, base: &Url) -> SourceResult<Url> {
    let document = Html::parse_document(page);
    let outer = nth_child(document.root_element(), "frameset", 0)?;
    let inner = nth_child(outer, "frameset", 1)?;
    let frame = nth_child(inner, "frame", 1)?;

    let src = frame
        .value()
        .attr("src")
        .ok_or_else(|| SourceError::PageStructure("frame without src".to_string()))?;

    base.join(src)
        .map_err(|e| SourceError::PageStructure(format!("frame src {src:?}: {e}")))
}

/// Extract the table within the body's second `<center>` element
pub fn extract_table(frame: &str) -> SourceResult<ScrapedTable> {
    let document = Html::parse_document(frame);
    let body = nth_child(document.root_element(), "body", 0)?;
    let center = nth_child(body, "center", 1)?;

    let text = normalized_text(center);

    let tbody = selector("tbody")?;
    let rows: Vec<Vec<String>> = match center.select(&tbody).next() {
        Some(tbody) => children(tbody, "tr")
            .map(|tr| children(tr, "td").map(normalized_text).collect())
            .collect(),
        None => Vec::new(),
    };

    Ok(ScrapedTable { text, rows })
}

pub struct InterlibraryAdapter {
    client: reqwest::Client,
    config: InterlibraryConfig,
}

impl InterlibraryAdapter {
    pub fn new(client: reqwest::Client, config: InterlibraryConfig) -> Self {
        Self { client, config }
    }

    async fn get_page(&self, url: Url) -> SourceResult<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Source for InterlibraryAdapter {
    type Fields = IllFields;

    fn name(&self) -> &'static str {
        "interlibrary"
    }

    #[instrument(skip(self), fields(code = %self.config.code))]
    async fn fetch(&self, date: ReconcileDate) -> SourceResult<IllFields> {
        if !date.is_yesterday() {
            return Err(SourceError::Unsupported);
        }

        let base = Url::parse(&self.config.url)
            .map_err(|e| SourceError::PageStructure(format!("page url: {e}")))?;

        let page = self.get_page(base.clone()).await?;
        let frame = frame_url(&page, &base)?;
        trace!("statistics frame at {frame}");

        let table = extract_table(&self.get_page(frame).await?)?;

        if !table.text.contains(&self.config.code) {
            return Err(SourceError::NotFound(self.config.code.clone()));
        }

        let fields = table.locate(&self.config.code, self.config.max_scan)?;
        debug!("ill lent {:?}, borrowed {:?}", fields.ill_lent, fields.ill_borrowed);
        Ok(fields)
    }
}
