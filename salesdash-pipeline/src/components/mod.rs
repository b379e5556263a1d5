pub mod date_range_filter;
pub mod membership_filter;
pub mod top_k_selector;
pub mod value_range_filter;
