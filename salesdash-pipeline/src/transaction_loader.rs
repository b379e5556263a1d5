//! CSV transaction loader.
//!
//! Parses transaction exports into `Transaction` rows. Headers follow the
//! sales spreadsheet export:
//!   Order ID, Order Date, Category, Product Name, Sales Amount, Profit (INR),
//!   Quantity, Discount, Order Status, State, City[, Payment Method]
//!
//! `Final Sales Amount (INR)` and `Sales` are accepted for the sales column,
//! `Profit` for the profit column. Header whitespace is trimmed.

use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::LoadError;
use crate::types::{OrderStatus, Transaction, TransactionTable};

/// A raw CSV row before invariant checks.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "Order ID")]
    pub order_id: String,
    #[serde(rename = "Order Date", deserialize_with = "deserialize_date")]
    pub order_date: NaiveDate,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Product Name")]
    pub product_name: String,
    #[serde(
        rename = "Sales Amount",
        alias = "Final Sales Amount (INR)",
        alias = "Sales"
    )]
    pub sales_amount: f64,
    #[serde(rename = "Profit (INR)", alias = "Profit")]
    pub profit: f64,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    #[serde(rename = "Discount")]
    pub discount_pct: f64,
    #[serde(rename = "Order Status")]
    pub status: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Payment Method", default)]
    pub payment_method: String,
}

impl TransactionRecord {
    /// Check the row invariants and convert to a `Transaction`.
    pub fn to_transaction(&self) -> Result<Transaction, String> {
        if !self.sales_amount.is_finite() || self.sales_amount < 0.0 {
            return Err(format!(
                "order {}: sales amount {} must be non-negative",
                self.order_id, self.sales_amount
            ));
        }
        if !self.profit.is_finite() {
            return Err(format!("order {}: profit is not a number", self.order_id));
        }
        if self.quantity < 1 || self.quantity > u32::MAX as i64 {
            return Err(format!(
                "order {}: quantity {} must be a positive integer",
                self.order_id, self.quantity
            ));
        }
        if !(0.0..=100.0).contains(&self.discount_pct) {
            return Err(format!(
                "order {}: discount {} outside 0-100%",
                self.order_id, self.discount_pct
            ));
        }
        let status = OrderStatus::parse(&self.status).ok_or_else(|| {
            format!(
                "order {}: unknown order status '{}'",
                self.order_id, self.status
            )
        })?;

        Ok(Transaction {
            order_id: self.order_id.clone(),
            order_date: self.order_date,
            category: self.category.clone(),
            product_name: self.product_name.clone(),
            sales_amount: self.sales_amount,
            profit: self.profit,
            quantity: self.quantity as u32,
            discount_pct: self.discount_pct,
            status,
            state: self.state.clone(),
            city: self.city.clone(),
            payment_method: self.payment_method.clone(),
        })
    }
}

/// Load and validate transactions from a CSV reader.
pub fn load_transactions<R: Read>(reader: R) -> Result<TransactionTable, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.deserialize().enumerate() {
        // header is line 1
        let line = idx as u64 + 2;
        let record: TransactionRecord = result.map_err(|source| LoadError::Csv { line, source })?;
        let row = record
            .to_transaction()
            .map_err(|reason| LoadError::InvalidRecord { line, reason })?;
        rows.push(row);
    }

    log::info!("loaded {} transactions", rows.len());
    Ok(TransactionTable::new(rows))
}

/// Load and validate transactions from a CSV file path.
pub fn load_transactions_file(path: &str) -> Result<TransactionTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_string(),
        source,
    })?;
    load_transactions(file)
}

/// Flexible date deserializer: "2024-03-15", "2024-03-15 10:30:00",
/// "2024-03-15T10:30:00".
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ts.date());
        }
    }
    Err(serde::de::Error::custom(format!(
        "expected date as YYYY-MM-DD, got '{}'",
        s
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Order ID,Order Date,Category,Product Name,Sales Amount,Profit (INR),Quantity,Discount,Order Status,State,City,Payment Method
FK-1001,2024-01-05,Electronics,Wireless Mouse,799.00,120.50,1,10,Delivered,Karnataka,Bengaluru,UPI
FK-1002,2024-01-06 14:22:10,Fashion,Denim Jacket,2499.00,-150.00,2,35,Returned,Maharashtra,Pune,Card
FK-1003,2024-01-06,Home,Steel Bottle,349.00,60.00,3,0,cancelled,Delhi,New Delhi,COD
";

    #[test]
    fn load_sample_csv() {
        let table = load_transactions(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        let first = &table.rows()[0];
        assert_eq!(first.order_id, "FK-1001");
        assert_eq!(first.order_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert!((first.sales_amount - 799.0).abs() < 0.01);
        assert_eq!(first.payment_method, "UPI");
        assert!((table.rows()[1].profit - (-150.0)).abs() < 0.01);
        assert_eq!(table.rows()[1].order_date, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
        assert_eq!(table.rows()[2].status, OrderStatus::Cancelled);
    }

    #[test]
    fn accepts_spreadsheet_column_aliases() {
        let csv_data = "\
 Order ID ,Order Date,Category,Product Name,Final Sales Amount (INR),Profit,Quantity,Discount,Order Status,State,City
A1,2024-02-01,Books,Atlas,100,10,1,0,Pending,Goa,Panaji
";
        let table = load_transactions(csv_data.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].payment_method, "");
        assert_eq!(table.rows()[0].status, OrderStatus::Pending);
    }

    #[test]
    fn rejects_negative_sales_with_line_number() {
        let csv_data = "\
Order ID,Order Date,Category,Product Name,Sales Amount,Profit (INR),Quantity,Discount,Order Status,State,City
A1,2024-02-01,Books,Atlas,100,10,1,0,Delivered,Goa,Panaji
A2,2024-02-01,Books,Atlas,-5,10,1,0,Delivered,Goa,Panaji
";
        match load_transactions(csv_data.as_bytes()) {
            Err(LoadError::InvalidRecord { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected InvalidRecord, got {:?}", other),
        }
    }

    #[test]
    fn rejects_zero_quantity_and_unknown_status() {
        let zero_qty = "\
Order ID,Order Date,Category,Product Name,Sales Amount,Profit (INR),Quantity,Discount,Order Status,State,City
A1,2024-02-01,Books,Atlas,100,10,0,0,Delivered,Goa,Panaji
";
        assert!(load_transactions(zero_qty.as_bytes()).is_err());

        let bad_status = "\
Order ID,Order Date,Category,Product Name,Sales Amount,Profit (INR),Quantity,Discount,Order Status,State,City
A1,2024-02-01,Books,Atlas,100,10,1,0,Shipped,Goa,Panaji
";
        assert!(matches!(
            load_transactions(bad_status.as_bytes()),
            Err(LoadError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn rejects_malformed_date() {
        let csv_data = "\
Order ID,Order Date,Category,Product Name,Sales Amount,Profit (INR),Quantity,Discount,Order Status,State,City
A1,05/02/2024,Books,Atlas,100,10,1,0,Delivered,Goa,Panaji
";
        assert!(matches!(
            load_transactions(csv_data.as_bytes()),
            Err(LoadError::Csv { line: 2, .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_transactions_file("/nonexistent/transactions.csv"),
            Err(LoadError::Io { .. })
        ));
    }
}
