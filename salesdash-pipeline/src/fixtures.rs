//! Row builders shared by the unit tests.

use chrono::NaiveDate;

use crate::types::{OrderStatus, Transaction, TransactionTable};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A delivered single-unit order with 20% margin.
pub fn tx(order_id: &str, order_date: NaiveDate, product: &str, sales: f64) -> Transaction {
    Transaction {
        order_id: order_id.into(),
        order_date,
        category: "Electronics".into(),
        product_name: product.into(),
        sales_amount: sales,
        profit: sales * 0.2,
        quantity: 1,
        discount_pct: 0.0,
        status: OrderStatus::Delivered,
        state: "Karnataka".into(),
        city: "Bengaluru".into(),
        payment_method: "UPI".into(),
    }
}

pub fn table(rows: Vec<Transaction>) -> TransactionTable {
    TransactionTable::new(rows)
}
