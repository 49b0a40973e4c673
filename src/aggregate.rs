// 📊 Filter/Aggregate Functions
// Pure functions of (Dataset, control value) -> Summary table or Empty sentinel

use crate::dataset::{Dataset, Month};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CONTROL STATE
// ============================================================================

/// Bar chart arrangement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    #[default]
    Group,
    Stack,
}

impl BarMode {
    pub const ALL: [BarMode; 2] = [BarMode::Group, BarMode::Stack];

    pub fn as_str(&self) -> &'static str {
        match self {
            BarMode::Group => "group",
            BarMode::Stack => "stack",
        }
    }

    /// Human-readable label for the radio control
    pub fn label(&self) -> &'static str {
        match self {
            BarMode::Group => "Grouped",
            BarMode::Stack => "Stacked",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            BarMode::Group => BarMode::Stack,
            BarMode::Stack => BarMode::Group,
        }
    }
}

impl fmt::Display for BarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BarMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "group" | "grouped" => Ok(BarMode::Group),
            "stack" | "stacked" => Ok(BarMode::Stack),
            other => Err(format!("unknown bar mode '{}' (expected group or stack)", other)),
        }
    }
}

/// Current values of the three dashboard controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub year: i32,
    pub country: String,
    pub bar_mode: BarMode,
}

// ============================================================================
// SUMMARY TABLES
// ============================================================================

/// Result of a filter/aggregate pass.
///
/// `Empty` is the sentinel for "no rows matched"; it is never an error and
/// renders as a placeholder chart.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary<T> {
    Rows(Vec<T>),
    Empty,
}

impl<T> Summary<T> {
    fn from_rows(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            Summary::Empty
        } else {
            Summary::Rows(rows)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Summary::Empty)
    }

    pub fn rows(&self) -> &[T] {
        match self {
            Summary::Rows(rows) => rows,
            Summary::Empty => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub month: Month,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductLineSales {
    pub product_line: String,
    pub deal_size: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealSizeShare {
    pub deal_size: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub price_each: f64,
    pub sales: f64,
    pub product_line: String,
    pub quantity: u32,
}

// ============================================================================
// AGGREGATIONS
// ============================================================================

/// Sales for `year` summed per month, months ascending (undefined month last)
pub fn monthly_sales(dataset: &Dataset, year: i32) -> Summary<MonthlySales> {
    let mut by_month: BTreeMap<Month, f64> = BTreeMap::new();

    for record in dataset.iter().filter(|r| r.year == Some(year)) {
        *by_month.entry(record.month).or_insert(0.0) += record.sales.unwrap_or(0.0);
    }

    Summary::from_rows(
        by_month
            .into_iter()
            .map(|(month, sales)| MonthlySales { month, sales })
            .collect(),
    )
}

/// Sales for `year` summed per (product line, deal size).
/// Records lacking either grouping key are left out.
pub fn sales_by_product_line(dataset: &Dataset, year: i32) -> Summary<ProductLineSales> {
    let mut groups: BTreeMap<(&str, &str), f64> = BTreeMap::new();

    for record in dataset.iter().filter(|r| r.year == Some(year)) {
        if let (Some(line), Some(size)) = (record.product_line.as_deref(), record.deal_size.as_deref()) {
            *groups.entry((line, size)).or_insert(0.0) += record.sales.unwrap_or(0.0);
        }
    }

    Summary::from_rows(
        groups
            .into_iter()
            .map(|((line, size), sales)| ProductLineSales {
                product_line: line.to_string(),
                deal_size: size.to_string(),
                sales,
            })
            .collect(),
    )
}

/// Sales for `country` summed per deal size
pub fn deal_size_share(dataset: &Dataset, country: &str) -> Summary<DealSizeShare> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();

    for record in dataset.iter().filter(|r| r.country.as_deref() == Some(country)) {
        if let Some(size) = record.deal_size.as_deref() {
            *groups.entry(size).or_insert(0.0) += record.sales.unwrap_or(0.0);
        }
    }

    Summary::from_rows(
        groups
            .into_iter()
            .map(|(size, sales)| DealSizeShare {
                deal_size: size.to_string(),
                sales,
            })
            .collect(),
    )
}

/// Complete records for `year`, row order preserved, no aggregation
pub fn price_vs_sales(dataset: &Dataset, year: i32) -> Summary<ScatterPoint> {
    let points = dataset
        .iter()
        .filter(|r| r.year == Some(year))
        .filter_map(|r| {
            Some(ScatterPoint {
                price_each: r.price_each?,
                sales: r.sales?,
                product_line: r.product_line.clone()?,
                quantity: r.quantity_ordered?,
            })
        })
        .collect();

    Summary::from_rows(points)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, sample_dataset};

    #[test]
    fn test_monthly_sales_example() {
        let dataset = Dataset::from_records(vec![
            record("1/5/2003 0:00", 2003, "USA", "Ships", "Small", 10.0, 700.0, 70),
            record("1/20/2003 0:00", 2003, "USA", "Ships", "Small", 10.0, 500.0, 50),
            record("2/11/2003 0:00", 2003, "France", "Planes", "Large", 10.0, 800.0, 80),
            record("2/11/2004 0:00", 2004, "France", "Planes", "Large", 10.0, 999.0, 99),
        ]);

        let summary = monthly_sales(&dataset, 2003);

        assert_eq!(
            summary.rows(),
            &[
                MonthlySales { month: Month::Known { year: 2003, month: 1 }, sales: 1200.0 },
                MonthlySales { month: Month::Known { year: 2003, month: 2 }, sales: 800.0 },
            ]
        );
    }

    #[test]
    fn test_monthly_sales_matches_exact_sums() {
        let dataset = sample_dataset();

        for year in dataset.years() {
            let summary = monthly_sales(&dataset, year);
            let rows = summary.rows();

            let mut distinct: Vec<Month> = dataset
                .iter()
                .filter(|r| r.year == Some(year))
                .map(|r| r.month)
                .collect();
            distinct.sort();
            distinct.dedup();

            assert_eq!(rows.len(), distinct.len(), "one row per month in {}", year);
            assert!(rows.windows(2).all(|w| w[0].month < w[1].month), "months ascending");

            for row in rows {
                let expected: f64 = dataset
                    .iter()
                    .filter(|r| r.year == Some(year) && r.month == row.month)
                    .filter_map(|r| r.sales)
                    .sum();
                assert_eq!(row.sales, expected);
            }
        }
    }

    #[test]
    fn test_monthly_sales_unknown_year_is_empty() {
        let dataset = sample_dataset();
        assert!(monthly_sales(&dataset, 1999).is_empty());
    }

    #[test]
    fn test_monthly_sales_keeps_undefined_month_last() {
        let dataset = Dataset::from_records(vec![
            record("garbage", 2003, "USA", "Ships", "Small", 10.0, 50.0, 5),
            record("3/1/2003 0:00", 2003, "USA", "Ships", "Small", 10.0, 100.0, 10),
        ]);

        let summary = monthly_sales(&dataset, 2003);
        let rows = summary.rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month.to_string(), "2003-03");
        assert_eq!(rows[1].month, Month::Undefined);
        assert_eq!(rows[1].sales, 50.0);
    }

    #[test]
    fn test_sales_by_product_line_groups_pairs() {
        let dataset = Dataset::from_records(vec![
            record("1/5/2003 0:00", 2003, "USA", "Ships", "Small", 10.0, 100.0, 10),
            record("1/6/2003 0:00", 2003, "USA", "Ships", "Small", 10.0, 50.0, 5),
            record("1/7/2003 0:00", 2003, "USA", "Ships", "Large", 10.0, 300.0, 30),
            record("1/8/2003 0:00", 2003, "USA", "Classic Cars", "Medium", 10.0, 200.0, 20),
        ]);

        let summary = sales_by_product_line(&dataset, 2003);
        let rows = summary.rows();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].product_line, "Classic Cars");
        assert_eq!(rows[1].deal_size, "Large");
        assert_eq!(rows[2].sales, 150.0);
        assert!(sales_by_product_line(&dataset, 2004).is_empty());
    }

    #[test]
    fn test_sales_by_product_line_skips_missing_keys() {
        let mut incomplete = record("1/5/2003 0:00", 2003, "USA", "Ships", "Small", 10.0, 100.0, 10);
        incomplete.deal_size = None;
        let dataset = Dataset::from_records(vec![incomplete]);

        assert!(sales_by_product_line(&dataset, 2003).is_empty());
    }

    #[test]
    fn test_deal_size_share_sums_to_country_total() {
        let dataset = sample_dataset();

        for country in dataset.countries() {
            let summary = deal_size_share(&dataset, &country);
            let share_total: f64 = summary.rows().iter().map(|r| r.sales).sum();
            let country_total: f64 = dataset
                .iter()
                .filter(|r| r.country.as_deref() == Some(country.as_str()))
                .filter_map(|r| r.sales)
                .sum();

            assert!(
                (share_total - country_total).abs() < 1e-6,
                "{}: {} != {}",
                country,
                share_total,
                country_total
            );
        }
    }

    #[test]
    fn test_deal_size_share_unknown_country_is_empty() {
        let dataset = sample_dataset();
        assert!(deal_size_share(&dataset, "Atlantis").is_empty());
    }

    #[test]
    fn test_price_vs_sales_drops_incomplete_records() {
        let complete = record("1/5/2003 0:00", 2003, "USA", "Ships", "Small", 10.0, 100.0, 10);

        let mut no_price = complete.clone();
        no_price.price_each = None;
        let mut no_sales = complete.clone();
        no_sales.sales = None;
        let mut no_line = complete.clone();
        no_line.product_line = None;
        let mut no_quantity = complete.clone();
        no_quantity.quantity_ordered = None;

        let dataset = Dataset::from_records(vec![no_price, complete, no_sales, no_line, no_quantity]);
        let summary = price_vs_sales(&dataset, 2003);

        assert_eq!(
            summary.rows(),
            &[ScatterPoint {
                price_each: 10.0,
                sales: 100.0,
                product_line: "Ships".to_string(),
                quantity: 10,
            }]
        );
    }

    #[test]
    fn test_price_vs_sales_all_incomplete_is_empty() {
        let mut only = record("1/5/2003 0:00", 2003, "USA", "Ships", "Small", 10.0, 100.0, 10);
        only.quantity_ordered = None;
        let dataset = Dataset::from_records(vec![only]);

        assert!(price_vs_sales(&dataset, 2003).is_empty());
    }

    #[test]
    fn test_price_vs_sales_never_includes_incomplete_rows() {
        let dataset = sample_dataset();

        for year in dataset.years() {
            let plottable = dataset
                .iter()
                .filter(|r| r.year == Some(year) && r.is_plottable())
                .count();
            assert_eq!(price_vs_sales(&dataset, year).rows().len(), plottable);
        }
    }

    #[test]
    fn test_nan_sales_cell_is_treated_as_missing() {
        let csv = "QUANTITYORDERED,PRICEEACH,SALES,ORDERDATE,YEAR_ID,PRODUCTLINE,COUNTRY,DEALSIZE\n\
                   10,10,NaN,1/5/2003 0:00,2003,Ships,USA,Small\n\
                   10,10,100,1/9/2003 0:00,2003,Ships,USA,Small\n\
                   10,10,NA,1/12/2003 0:00,2003,Ships,USA,Small\n";
        let dataset = Dataset::from_csv_str(csv).unwrap();

        let points = price_vs_sales(&dataset, 2003);
        assert_eq!(points.rows().len(), 1);
        assert_eq!(points.rows()[0].sales, 100.0);

        let monthly = monthly_sales(&dataset, 2003);
        assert_eq!(monthly.rows()[0].sales, 100.0);
        assert_eq!(deal_size_share(&dataset, "USA").rows()[0].sales, 100.0);
    }

    #[test]
    fn test_bar_mode_parsing() {
        assert_eq!("group".parse::<BarMode>().unwrap(), BarMode::Group);
        assert_eq!("Stacked".parse::<BarMode>().unwrap(), BarMode::Stack);
        assert!("pile".parse::<BarMode>().is_err());
        assert_eq!(BarMode::Group.toggle(), BarMode::Stack);
    }
}
