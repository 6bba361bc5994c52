//! Dashboard and statistics
//!
//! Read-only summaries of a user's income, expenses and accounts, for the
//! current month or a month of the user's choosing.

mod aggregation;
mod handlers;

pub use handlers::{
    get_account_statistics_endpoint, get_calendar_endpoint, get_category_statistics_endpoint,
    get_dashboard_endpoint, get_overview_endpoint, get_trend_endpoint,
};
