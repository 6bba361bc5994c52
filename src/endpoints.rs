//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/accounts/{account_id}', use [format_endpoint].

/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route for the profile of the logged in user.
pub const CURRENT_USER: &str = "/api/users/me";
/// The route to change the password of the logged in user.
pub const CURRENT_USER_PASSWORD: &str = "/api/users/me/password";
/// The route to give the logged in user the default categories and accounts.
pub const CURRENT_USER_DEFAULTS: &str = "/api/users/me/defaults";
/// The route to delete every account, category, transaction and budget of the logged in user.
pub const CURRENT_USER_DATA: &str = "/api/users/me/data";

/// The route to access accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route for the totals across all accounts.
pub const ACCOUNT_SUMMARY: &str = "/api/accounts/summary";
/// The route to access a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";

/// The route to access categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to access a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";

/// The route to access transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// The route to access budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route for the progress of every budget.
pub const BUDGET_PROGRESS: &str = "/api/budgets/progress";
/// The route to access a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";

/// The route for the dashboard summary.
pub const DASHBOARD: &str = "/api/dashboard";
/// The route for the income and expenses of a month.
pub const STATISTICS_OVERVIEW: &str = "/api/statistics/overview";
/// The route for the per category totals of a month.
pub const STATISTICS_CATEGORIES: &str = "/api/statistics/categories";
/// The route for the per account statistics.
pub const STATISTICS_ACCOUNTS: &str = "/api/statistics/accounts";
/// The route for the monthly income and expenses.
pub const STATISTICS_TREND: &str = "/api/statistics/trend";
/// The route for the daily totals of a month.
pub const STATISTICS_CALENDAR: &str = "/api/statistics/calendar";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/accounts/{account_id}', '{account_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let param_start = match endpoint_path.find('{') {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
