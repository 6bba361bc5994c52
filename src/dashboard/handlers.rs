//! Dashboard and statistics route handlers.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountSummary, get_account_summary},
    api_response::success,
    auth::AuthContext,
    category::CategoryType,
    dashboard::aggregation::{
        CategoryTotal, MonthSummary, TrendPoint, get_account_statistics, get_category_totals,
        get_daily_totals, get_month_summary, get_monthly_trend, month_start, parse_month,
    },
    timezone::get_local_today,
    transaction::{TransactionDetails, TransactionFilter, list_transactions},
    user::UserID,
};

/// How many of the latest transactions the dashboard shows.
const RECENT_TRANSACTION_COUNT: u32 = 10;
/// How many months the dashboard trend covers.
const DASHBOARD_TREND_MONTHS: u32 = 6;
/// How many months the statistics trend covers when not asked for.
const DEFAULT_TREND_MONTHS: u32 = 12;
const MAX_TREND_MONTHS: u32 = 120;

/// The state needed for the dashboard and statistics.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Everything shown on the dashboard.
#[derive(Debug, Serialize)]
struct Dashboard {
    month: MonthSummary,
    accounts: AccountSummary,
    recent_transactions: Vec<TransactionDetails>,
    expense_by_category: Vec<CategoryTotal>,
    trend: Vec<TrendPoint>,
}

/// The month to report on, and for category statistics the category type.
#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    /// A month in the format `YYYY-MM`. Defaults to the current month.
    month: Option<String>,
    /// Defaults to expenses.
    #[serde(rename = "type")]
    category_type: Option<CategoryType>,
}

/// How many months a trend should cover.
#[derive(Debug, Default, Deserialize)]
pub struct TrendQuery {
    months: Option<u32>,
}

fn get_dashboard(user_id: UserID, today: Date, connection: &Connection) -> Result<Dashboard, Error> {
    let current_month = month_start(today)?;
    let recent = TransactionFilter {
        limit: Some(RECENT_TRANSACTION_COUNT),
        ..Default::default()
    };

    Ok(Dashboard {
        month: get_month_summary(user_id, current_month, connection)?,
        accounts: get_account_summary(user_id, connection)?,
        recent_transactions: list_transactions(user_id, &recent, connection)?,
        expense_by_category: get_category_totals(
            user_id,
            CategoryType::Expense,
            current_month,
            connection,
        )?,
        trend: get_monthly_trend(user_id, current_month, DASHBOARD_TREND_MONTHS, connection)?,
    })
}

/// The month named in `query`, or the current month in `local_timezone`.
fn requested_month(query: &StatisticsQuery, local_timezone: &str) -> Result<Date, Error> {
    match &query.month {
        Some(month) => parse_month(month),
        None => month_start(get_local_today(local_timezone)?),
    }
}

/// A route handler for the dashboard summary of the current month.
pub async fn get_dashboard_endpoint(
    State(state): State<DashboardState>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    let today = match get_local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_dashboard(auth.user_id, today, &connection) {
        Ok(dashboard) => success("Dashboard retrieved", dashboard),
        Err(error) => error.into_response(),
    }
}

/// A route handler for the income and expenses of a month.
pub async fn get_overview_endpoint(
    State(state): State<DashboardState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<StatisticsQuery>,
) -> Response {
    let month = match requested_month(&query, &state.local_timezone) {
        Ok(month) => month,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_month_summary(auth.user_id, month, &connection) {
        Ok(summary) => success("Overview retrieved", summary),
        Err(error) => error.into_response(),
    }
}

/// A route handler for the per category totals of a month.
pub async fn get_category_statistics_endpoint(
    State(state): State<DashboardState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<StatisticsQuery>,
) -> Response {
    let month = match requested_month(&query, &state.local_timezone) {
        Ok(month) => month,
        Err(error) => return error.into_response(),
    };
    let category_type = query.category_type.unwrap_or(CategoryType::Expense);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_category_totals(auth.user_id, category_type, month, &connection) {
        Ok(totals) => success("Category statistics retrieved", totals),
        Err(error) => error.into_response(),
    }
}

/// A route handler for the per account statistics.
pub async fn get_account_statistics_endpoint(
    State(state): State<DashboardState>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_account_statistics(auth.user_id, &connection) {
        Ok(statistics) => success("Account statistics retrieved", statistics),
        Err(error) => error.into_response(),
    }
}

/// A route handler for the monthly income and expenses up to the current month.
pub async fn get_trend_endpoint(
    State(state): State<DashboardState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TrendQuery>,
) -> Response {
    let months = query.months.unwrap_or(DEFAULT_TREND_MONTHS);
    if !(1..=MAX_TREND_MONTHS).contains(&months) {
        return Error::Validation(format!("months must be between 1 and {MAX_TREND_MONTHS}"))
            .into_response();
    }

    let current_month = match get_local_today(&state.local_timezone).and_then(month_start) {
        Ok(month) => month,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_monthly_trend(auth.user_id, current_month, months, &connection) {
        Ok(trend) => success("Trend retrieved", trend),
        Err(error) => error.into_response(),
    }
}

/// A route handler for the daily income and expenses of a month.
pub async fn get_calendar_endpoint(
    State(state): State<DashboardState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<StatisticsQuery>,
) -> Response {
    let month = match requested_month(&query, &state.local_timezone) {
        Ok(month) => month,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_daily_totals(auth.user_id, month, &connection) {
        Ok(days) => success("Calendar retrieved", days),
        Err(error) => error.into_response(),
    }
}
