pub mod call_counter;
pub mod fetch_result;
pub mod query;
pub mod tier;
pub mod time_series;
