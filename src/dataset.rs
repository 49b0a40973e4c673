// 📦 Dataset Store - load once, read many
// Sales records are parsed from CSV at startup and never mutated afterwards

use crate::error::{LoadError, LoadResult};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns that must be present in the CSV header. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "ORDERDATE",
    "YEAR_ID",
    "COUNTRY",
    "PRODUCTLINE",
    "DEALSIZE",
    "SALES",
    "PRICEEACH",
    "QUANTITYORDERED",
];

const DATE_TIME_FORMATS: [&str; 3] = ["%m/%d/%Y %H:%M", "%m/%d/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Cell values read as missing, in addition to an empty cell
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ============================================================================
// ENCODING
// ============================================================================

/// Text encoding of the source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// ISO-8859-1, the encoding the sample sales export ships in
    #[default]
    #[serde(alias = "iso-8859-1", alias = "latin-1")]
    Latin1,
    #[serde(alias = "utf-8")]
    Utf8,
}

impl Encoding {
    pub fn decode(&self, bytes: Vec<u8>) -> LoadResult<String> {
        match self {
            // Every Latin-1 byte is the code point of the same value
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Utf8 => String::from_utf8(bytes).map_err(|_| LoadError::Encoding("UTF-8")),
        }
    }
}

// ============================================================================
// MONTH
// ============================================================================

/// Order date truncated to year-month granularity.
///
/// `Undefined` is the sentinel for records whose order date could not be
/// parsed. It sorts after every real month and displays as `NaT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    Known { year: i32, month: u32 },
    Undefined,
}

impl Month {
    pub fn from_date(date: Option<NaiveDateTime>) -> Self {
        match date {
            Some(dt) => Month::Known {
                year: dt.year(),
                month: dt.month(),
            },
            None => Month::Undefined,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Month::Undefined)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Month::Known { year, month } => write!(f, "{:04}-{:02}", year, month),
            Month::Undefined => write!(f, "NaT"),
        }
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Coercing order-date parser: anything unrecognised yields `None`
pub fn parse_order_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

// ============================================================================
// SALES RECORD
// ============================================================================

/// Row as it appears in the CSV. Empty cells and missing markers deserialize to `None`.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "ORDERDATE", deserialize_with = "text_cell")]
    order_date: Option<String>,

    #[serde(rename = "YEAR_ID", deserialize_with = "number_cell")]
    year: Option<f64>,

    #[serde(rename = "COUNTRY", deserialize_with = "text_cell")]
    country: Option<String>,

    #[serde(rename = "PRODUCTLINE", deserialize_with = "text_cell")]
    product_line: Option<String>,

    #[serde(rename = "DEALSIZE", deserialize_with = "text_cell")]
    deal_size: Option<String>,

    #[serde(rename = "SALES", deserialize_with = "number_cell")]
    sales: Option<f64>,

    #[serde(rename = "PRICEEACH", deserialize_with = "number_cell")]
    price_each: Option<f64>,

    #[serde(rename = "QUANTITYORDERED", deserialize_with = "number_cell")]
    quantity_ordered: Option<f64>,
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

fn text_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let cell: Option<String> = Option::deserialize(deserializer)?;
    Ok(cell.filter(|c| !is_missing(c)))
}

/// Numeric cell: missing markers and non-finite values are `None`, other text is an error
fn number_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match text_cell(deserializer)? {
        None => Ok(None),
        Some(cell) => {
            let value: f64 = cell
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid number {:?}", cell)))?;
            Ok(Some(value).filter(|v| v.is_finite()))
        }
    }
}

/// Whole, in-range value or `None`
fn whole_number<T: TryFrom<i64>>(value: Option<f64>) -> Option<T> {
    let value = value?;
    if value.fract() != 0.0 || value < i64::MIN as f64 || value > i64::MAX as f64 {
        return None;
    }
    T::try_from(value as i64).ok()
}

/// One sales transaction. Identity is its row position in the Dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub order_date: Option<NaiveDateTime>,
    pub month: Month,
    pub year: Option<i32>,
    pub country: Option<String>,
    pub product_line: Option<String>,
    pub deal_size: Option<String>,
    pub price_each: Option<f64>,
    pub sales: Option<f64>,
    pub quantity_ordered: Option<u32>,
}

impl From<RawRecord> for SalesRecord {
    fn from(raw: RawRecord) -> Self {
        let order_date = raw.order_date.as_deref().and_then(parse_order_date);

        SalesRecord {
            order_date,
            month: Month::from_date(order_date),
            year: whole_number(raw.year),
            country: raw.country,
            product_line: raw.product_line,
            deal_size: raw.deal_size,
            price_each: raw.price_each,
            sales: raw.sales,
            quantity_ordered: whole_number(raw.quantity_ordered),
        }
    }
}

impl SalesRecord {
    /// True when the record has every field the price-vs-sales chart plots
    pub fn is_plottable(&self) -> bool {
        self.price_each.is_some()
            && self.sales.is_some()
            && self.product_line.is_some()
            && self.quantity_ordered.is_some()
    }
}

// ============================================================================
// DATASET
// ============================================================================

/// Immutable, ordered collection of sales records.
///
/// There is deliberately no mutation API: once loaded, the dataset is shared
/// read-only (behind an `Arc`) by every chart computation.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SalesRecord>,
}

impl Dataset {
    /// Load the dataset from a CSV file on disk
    pub fn load(path: &Path, encoding: Encoding) -> LoadResult<Self> {
        let file = fs::File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let dataset = Self::from_reader(file, encoding).map_err(|err| match err {
            LoadError::Io { source, .. } => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        info!(
            path = %path.display(),
            records = dataset.len(),
            undefined_months = dataset.undefined_month_count(),
            "Loaded sales dataset"
        );

        Ok(dataset)
    }

    /// Decode and parse CSV bytes from any reader
    pub fn from_reader<R: Read>(mut reader: R, encoding: Encoding) -> LoadResult<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| LoadError::Io {
                path: Default::default(),
                source,
            })?;

        let text = encoding.decode(bytes)?;
        Self::from_csv_str(&text)
    }

    /// Parse already-decoded CSV text
    pub fn from_csv_str(text: &str) -> LoadResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(text.as_bytes());

        let headers = rdr.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(LoadError::MissingColumn(column.to_string()));
            }
        }

        let mut records = Vec::new();

        for result in rdr.deserialize::<RawRecord>() {
            let raw = result.map_err(|err| LoadError::Malformed {
                line: err.position().map(|p| p.line()).unwrap_or_default(),
                message: err.to_string(),
            })?;

            let quantity = raw.quantity_ordered;
            let record = SalesRecord::from(raw);
            if quantity.is_some() && record.quantity_ordered.is_none() {
                debug!(row = records.len(), ?quantity, "Quantity is not a whole count, left missing");
            }
            if record.month.is_undefined() {
                debug!(row = records.len(), "Order date unparseable, month left undefined");
            }
            records.push(record);
        }

        if records.is_empty() {
            warn!("Sales dataset has a header but no records");
        }

        Ok(Dataset { records })
    }

    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        Dataset { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &SalesRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct years, ascending (year dropdown options)
    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .filter_map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct countries, ascending (country dropdown options)
    pub fn countries(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.country.as_deref())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn undefined_month_count(&self) -> usize {
        self.records.iter().filter(|r| r.month.is_undefined()).count()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str =
        "ORDERNUMBER,QUANTITYORDERED,PRICEEACH,SALES,ORDERDATE,YEAR_ID,PRODUCTLINE,COUNTRY,DEALSIZE";

    #[test]
    fn test_load_bundled_sample() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sales_data_sample.csv");
        let dataset = Dataset::load(&path, Encoding::Latin1).unwrap();

        assert!(!dataset.is_empty());
        assert_eq!(dataset.years(), vec![2003, 2004, 2005]);
        assert!(dataset.countries().contains(&"USA".to_string()));
    }

    #[test]
    fn test_derived_month() {
        let csv = format!(
            "{}\n10107,30,95.7,2871,2/24/2003 0:00,2003,Motorcycles,USA,Small\n",
            HEADER
        );
        let dataset = Dataset::from_csv_str(&csv).unwrap();
        let record = &dataset.records()[0];

        assert_eq!(record.month, Month::Known { year: 2003, month: 2 });
        assert_eq!(record.month.to_string(), "2003-02");
        assert_eq!(record.quantity_ordered, Some(30));
        assert_eq!(record.sales, Some(2871.0));
    }

    #[test]
    fn test_unparseable_date_is_not_fatal() {
        let csv = format!(
            "{}\n1,30,95.7,2871,not a date,2003,Motorcycles,USA,Small\n2,10,50,500,,2003,Ships,USA,Small\n",
            HEADER
        );
        let dataset = Dataset::from_csv_str(&csv).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.undefined_month_count(), 2);
        assert_eq!(dataset.records()[0].month.to_string(), "NaT");
        assert!(dataset.records()[0].order_date.is_none());
    }

    #[test]
    fn test_parse_order_date_formats() {
        assert!(parse_order_date("2/24/2003 0:00").is_some());
        assert!(parse_order_date("12/1/2004 13:45:10").is_some());
        assert!(parse_order_date("05/07/2005").is_some());
        assert!(parse_order_date("2005-05-07").is_some());
        assert!(parse_order_date("2005-05-07 10:00:00").is_some());
        assert!(parse_order_date("13/45/2005").is_none());
        assert!(parse_order_date("").is_none());
    }

    #[test]
    fn test_empty_cells_become_none() {
        let csv = format!("{}\n1,,,,1/5/2003 0:00,2003,,France,\n", HEADER);
        let dataset = Dataset::from_csv_str(&csv).unwrap();
        let record = &dataset.records()[0];

        assert_eq!(record.quantity_ordered, None);
        assert_eq!(record.price_each, None);
        assert_eq!(record.sales, None);
        assert_eq!(record.product_line, None);
        assert_eq!(record.deal_size, None);
        assert!(!record.is_plottable());
    }

    #[test]
    fn test_missing_markers_become_none() {
        let csv = format!(
            "{}\n1,NA,NaN,null,N/A,2003,NA,nan,<NA>\n2,10,50,500,1/5/2003 0:00,2003,Ships,USA,Small\n",
            HEADER
        );
        let dataset = Dataset::from_csv_str(&csv).unwrap();
        let record = &dataset.records()[0];

        assert_eq!(dataset.len(), 2);
        assert_eq!(record.quantity_ordered, None);
        assert_eq!(record.price_each, None);
        assert_eq!(record.sales, None);
        assert_eq!(record.month, Month::Undefined);
        assert_eq!(record.product_line, None);
        assert_eq!(record.country, None);
        assert_eq!(record.deal_size, None);
        assert_eq!(record.year, Some(2003));
    }

    #[test]
    fn test_non_finite_numbers_become_none() {
        let csv = format!(
            "{}\n1,30,inf,-inf,1/5/2003 0:00,2003,Ships,USA,Small\n",
            HEADER
        );
        let dataset = Dataset::from_csv_str(&csv).unwrap();
        let record = &dataset.records()[0];

        assert_eq!(record.price_each, None);
        assert_eq!(record.sales, None);
    }

    #[test]
    fn test_odd_quantities_load_but_are_not_plottable() {
        let csv = format!(
            "{}\n1,30.0,95.7,2871,2/24/2003 0:00,2003,Motorcycles,USA,Small\n\
             2,-5,95.7,-478.5,2/24/2003 0:00,2003,Motorcycles,USA,Small\n\
             3,2.5,95.7,239.25,2/24/2003 0:00,2003,Motorcycles,USA,Small\n",
            HEADER
        );
        let dataset = Dataset::from_csv_str(&csv).unwrap();
        let records = dataset.records();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].quantity_ordered, Some(30));
        assert!(records[0].is_plottable());
        assert_eq!(records[1].quantity_ordered, None);
        assert_eq!(records[1].sales, Some(-478.5));
        assert!(!records[1].is_plottable());
        assert_eq!(records[2].quantity_ordered, None);
    }

    #[test]
    fn test_missing_column_fails() {
        let csv = "ORDERDATE,YEAR_ID,COUNTRY,PRODUCTLINE,DEALSIZE,SALES,PRICEEACH\n\
                   1/5/2003 0:00,2003,France,Ships,Small,100,10\n";

        match Dataset::from_csv_str(csv) {
            Err(LoadError::MissingColumn(column)) => assert_eq!(column, "QUANTITYORDERED"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_number_fails() {
        let csv = format!(
            "{}\n1,30,95.7,2871,2/24/2003 0:00,2003,Motorcycles,USA,Small\n2,30,abc,2871,2/24/2003 0:00,2003,Motorcycles,USA,Small\n",
            HEADER
        );

        match Dataset::from_csv_str(&csv) {
            Err(LoadError::Malformed { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_field_count_fails() {
        let csv = format!("{}\n1,30,95.7\n", HEADER);

        assert!(matches!(
            Dataset::from_csv_str(&csv),
            Err(LoadError::Malformed { .. })
        ));
    }

    #[test]
    fn test_latin1_decoding() {
        let mut bytes = format!("{}\n", HEADER).into_bytes();
        bytes.extend_from_slice(b"1,30,95.7,2871,2/24/2003 0:00,2003,Motorcycles,Espa\xf1a,Small\n");

        let dataset = Dataset::from_reader(bytes.as_slice(), Encoding::Latin1).unwrap();
        assert_eq!(dataset.records()[0].country.as_deref(), Some("España"));

        // The same bytes are not valid UTF-8
        assert!(matches!(
            Dataset::from_reader(bytes.as_slice(), Encoding::Utf8),
            Err(LoadError::Encoding(_))
        ));
    }

    #[test]
    fn test_missing_file_fails() {
        let err = Dataset::load(Path::new("/nonexistent/sales.csv"), Encoding::Latin1).unwrap_err();

        match err {
            LoadError::Io { path, .. } => assert_eq!(path, Path::new("/nonexistent/sales.csv")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "1,30,95.7,2871,2/24/2003 0:00,2003,Motorcycles,USA,Small").unwrap();
        writeln!(file, "2,20,80,1600,3/1/2004 0:00,2004,Ships,Norway,Medium").unwrap();

        let dataset = Dataset::load(file.path(), Encoding::Latin1).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.years(), vec![2003, 2004]);
        assert_eq!(dataset.countries(), vec!["Norway".to_string(), "USA".to_string()]);
    }

    #[test]
    fn test_month_ordering_puts_undefined_last() {
        let mut months = vec![
            Month::Undefined,
            Month::Known { year: 2004, month: 1 },
            Month::Known { year: 2003, month: 12 },
        ];
        months.sort();

        assert_eq!(months[0], Month::Known { year: 2003, month: 12 });
        assert_eq!(months[2], Month::Undefined);
    }
}
