//! Price history loading from CSV files.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;

use super::ReturnSeries;
use crate::error::{AnalyticsError, Result};

/// Date format expected in the date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// CSV loader for a single asset's price history
///
/// Expects a header row. The date column defaults to one named `date`
/// (case-insensitive), else the first column; the price column defaults to
/// one whose name contains `close` or `price`, else the second column.
/// Rows may come in any order; non-numeric prices are skipped.
#[derive(Debug, Clone, Default)]
pub struct PriceCsvLoader {
    date_column: Option<String>,
    price_column: Option<String>,
}

/// Prices parsed from a CSV file, sorted by date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    /// Observation dates, strictly increasing
    pub dates: Vec<NaiveDate>,
    /// Prices, one per date
    pub prices: Vec<f64>,
    /// Header of the price column that was used
    pub column_name: String,
}

impl PriceHistory {
    /// Simple returns derived from the prices.
    ///
    /// # Errors
    ///
    /// Never fails for a history produced by [`PriceCsvLoader`]; the result
    /// type mirrors [`ReturnSeries::from_prices`].
    pub fn returns(&self) -> Result<ReturnSeries> {
        ReturnSeries::from_prices(self.dates.clone(), &self.prices)
    }
}

impl PriceCsvLoader {
    /// Loader with default column detection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific date column.
    #[must_use]
    pub fn with_date_column(mut self, name: impl Into<String>) -> Self {
        self.date_column = Some(name.into());
        self
    }

    /// Use a specific price column.
    #[must_use]
    pub fn with_price_column(mut self, name: impl Into<String>) -> Self {
        self.price_column = Some(name.into());
        self
    }

    /// Load a price history from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, a column is missing,
    /// a date is malformed or repeated, or no valid price is found.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<PriceHistory> {
        let path = path.as_ref();
        let reader = csv::Reader::from_path(path).map_err(|e| AnalyticsError::Io {
            path: path.display().to_string(),
            message: format!("Failed to open CSV: {e}"),
        })?;
        let history = self.parse(reader)?;
        tracing::debug!(
            path = %path.display(),
            rows = history.dates.len(),
            column = %history.column_name,
            "loaded price history"
        );
        Ok(history)
    }

    /// Load a price history from any reader, such as an in-memory string.
    ///
    /// # Errors
    ///
    /// Same conditions as [`load`](Self::load), minus file access.
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<PriceHistory> {
        self.parse(csv::Reader::from_reader(reader))
    }

    fn parse<R: Read>(&self, mut reader: csv::Reader<R>) -> Result<PriceHistory> {
        let headers = reader
            .headers()
            .map_err(|e| AnalyticsError::CsvParse {
                line: 1,
                message: format!("Failed to read headers: {e}"),
            })?
            .clone();
        let names: Vec<&str> = headers.iter().collect();

        let date_idx = match &self.date_column {
            Some(col) => find_column(&names, col)?,
            None => names
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case("date"))
                .unwrap_or(0),
        };
        let price_idx = match &self.price_column {
            Some(col) => find_column(&names, col)?,
            None => names
                .iter()
                .position(|h| {
                    let h = h.to_lowercase();
                    h.contains("close") || h.contains("price")
                })
                .or_else(|| (names.len() > 1).then_some(1))
                .ok_or_else(|| {
                    AnalyticsError::invalid_parameter(
                        "price column",
                        format!("{names:?}"),
                        "a column containing 'close' or 'price', or at least two columns",
                    )
                })?,
        };
        let column_name = names.get(price_idx).map_or_else(String::new, |s| (*s).to_string());

        let mut rows: Vec<(NaiveDate, f64, usize)> = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let line = i + 2;
            let record = record.map_err(|e| AnalyticsError::CsvParse {
                line,
                message: format!("Failed to read row: {e}"),
            })?;

            let raw_date = record.get(date_idx).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
                AnalyticsError::CsvParse {
                    line,
                    message: format!("invalid date '{raw_date}': {e}"),
                }
            })?;

            // Blank or non-numeric prices are gaps, not errors
            let Some(price) = record
                .get(price_idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|p| p.is_finite())
            else {
                continue;
            };
            rows.push((date, price, line));
        }

        if rows.is_empty() {
            return Err(AnalyticsError::insufficient_data(format!(
                "no valid prices in column '{column_name}'"
            )));
        }

        rows.sort_by_key(|(d, _, _)| *d);
        if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(AnalyticsError::CsvParse {
                line: pair[0].2.max(pair[1].2),
                message: format!("duplicate date {}", pair[1].0),
            });
        }

        let (dates, prices) = rows.into_iter().map(|(d, p, _)| (d, p)).unzip();
        Ok(PriceHistory {
            dates,
            prices,
            column_name,
        })
    }
}

fn find_column(names: &[&str], wanted: &str) -> Result<usize> {
    names.iter().position(|h| *h == wanted).ok_or_else(|| {
        AnalyticsError::invalid_parameter(
            "column",
            wanted,
            &format!("one of {names:?}"),
        )
    })
}
