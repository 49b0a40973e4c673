// Shared fixtures for unit tests

use crate::dataset::{parse_order_date, Dataset, Month, SalesRecord};

/// Build a complete sales record
#[allow(clippy::too_many_arguments)]
pub fn record(
    date: &str,
    year: i32,
    country: &str,
    product_line: &str,
    deal_size: &str,
    price_each: f64,
    sales: f64,
    quantity: u32,
) -> SalesRecord {
    let order_date = parse_order_date(date);

    SalesRecord {
        order_date,
        month: Month::from_date(order_date),
        year: Some(year),
        country: Some(country.to_string()),
        product_line: Some(product_line.to_string()),
        deal_size: Some(deal_size.to_string()),
        price_each: Some(price_each),
        sales: Some(sales),
        quantity_ordered: Some(quantity),
    }
}

/// The bundled sample export under data/
pub fn sample_dataset() -> Dataset {
    Dataset::from_csv_str(include_str!("../data/sales_data_sample.csv"))
        .expect("bundled sample should parse")
}
