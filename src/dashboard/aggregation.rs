//! Read-only aggregations of a user's transactions for the dashboard and statistics.
//!
//! Months are identified by their first day. Every query takes a half-open
//! date range `[month_start, next_month_start)` so that month ends never need
//! to be worked out.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Month};

use crate::{
    Error, Money,
    account::{AccountId, AccountType},
    category::{CategoryId, CategoryType},
    user::UserID,
};

/// Income and expenses within one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    /// The month formatted as `YYYY-MM`.
    pub month: String,
    pub income: Money,
    pub expense: Money,
    /// Income minus expenses.
    pub net: Money,
    pub income_count: usize,
    pub expense_count: usize,
    /// The number of transactions of any type, transfers included.
    pub transaction_count: usize,
}

/// The number and total of transactions filed under one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category_id: CategoryId,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub transaction_count: usize,
    pub total: Money,
}

/// How money moved through one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStatistics {
    pub account_id: AccountId,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub icon: String,
    pub color: String,
    pub initial_balance: Money,
    pub current_balance: Money,
    /// The sum of income recorded against the account.
    pub income_in: Money,
    /// The sum of expenses paid from the account.
    pub expense_out: Money,
    /// The number of transactions that use the account as source or destination.
    pub transaction_count: usize,
}

/// Income and expenses for one month of a trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// The month formatted as `YYYY-MM`.
    pub month: String,
    /// The month formatted for display, e.g. "Mar 2024".
    pub label: String,
    pub income: Money,
    pub expense: Money,
    pub net: Money,
}

/// Income and expenses on one day of a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: Date,
    pub income: Money,
    pub expense: Money,
    /// The number of transactions on the day, transfers included.
    pub transaction_count: usize,
}

/// Get the first day of the month `months` months after the month starting
/// on `month_start`. Negative values go back in time.
pub fn add_months(month_start: Date, months: i32) -> Result<Date, Error> {
    let index = month_start.year() * 12 + i32::from(u8::from(month_start.month())) - 1 + months;
    let year = index.div_euclid(12);
    let month = Month::try_from((index.rem_euclid(12) + 1) as u8)?;

    Ok(Date::from_calendar_date(year, month, 1)?)
}

/// The first day of the month `date` falls in.
pub fn month_start(date: Date) -> Result<Date, Error> {
    Ok(date.replace_day(1)?)
}

/// Parse a month written as `YYYY-MM` into the first day of that month.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is not a valid month.
pub fn parse_month(text: &str) -> Result<Date, Error> {
    let invalid = || Error::InvalidDate(format!("{text} is not a month in the format YYYY-MM"));

    let (year, month) = text.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;

    Ok(Date::from_calendar_date(year, month, 1)?)
}

fn format_month(month_start: Date) -> String {
    format!(
        "{:04}-{:02}",
        month_start.year(),
        u8::from(month_start.month())
    )
}

fn format_month_label(month_start: Date) -> String {
    let month = match month_start.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{month} {}", month_start.year())
}

/// Sum up income and expenses of `user_id` in the month starting on `month_start`.
pub fn get_month_summary(
    user_id: UserID,
    month_start: Date,
    connection: &Connection,
) -> Result<MonthSummary, Error> {
    let next_month = add_months(month_start, 1)?;

    let (income, expense, income_count, expense_count, transaction_count): (
        Money,
        Money,
        usize,
        usize,
        usize,
    ) = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0),
            COUNT(CASE WHEN type = 'income' THEN 1 END),
            COUNT(CASE WHEN type = 'expense' THEN 1 END),
            COUNT(id)
         FROM \"transaction\"
         WHERE user_id = ?1 AND transaction_date >= ?2 AND transaction_date < ?3",
        (user_id.as_i64(), month_start, next_month),
        |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        },
    )?;

    Ok(MonthSummary {
        month: format_month(month_start),
        income,
        expense,
        net: income - expense,
        income_count,
        expense_count,
        transaction_count,
    })
}

/// Get the categories of `category_type` that have transactions in the month
/// starting on `month_start`, largest total first.
pub fn get_category_totals(
    user_id: UserID,
    category_type: CategoryType,
    month_start: Date,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    let next_month = add_months(month_start, 1)?;

    connection
        .prepare(
            "SELECT c.id, c.name, c.icon, c.color, COUNT(t.id), SUM(t.amount) AS total
             FROM category c
             INNER JOIN \"transaction\" t ON t.category_id = c.id
                AND t.transaction_date >= ?3 AND t.transaction_date < ?4
             WHERE c.user_id = ?1 AND c.type = ?2
             GROUP BY c.id, c.name, c.icon, c.color
             ORDER BY total DESC, c.name",
        )?
        .query_map(
            (user_id.as_i64(), category_type, month_start, next_month),
            |row| {
                Ok(CategoryTotal {
                    category_id: row.get(0)?,
                    name: row.get(1)?,
                    icon: row.get(2)?,
                    color: row.get(3)?,
                    transaction_count: row.get(4)?,
                    total: row.get(5)?,
                })
            },
        )?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

/// Get the statistics of every account of `user_id`, largest balance first.
pub fn get_account_statistics(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<AccountStatistics>, Error> {
    connection
        .prepare(
            "SELECT a.id, a.name, a.type, a.icon, a.color, a.initial_balance, a.current_balance,
                COALESCE(SUM(CASE WHEN t.type = 'income' THEN t.amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN t.type = 'expense' THEN t.amount ELSE 0 END), 0),
                COUNT(t.id)
             FROM account a
             LEFT JOIN \"transaction\" t ON t.account_id = a.id OR t.to_account_id = a.id
             WHERE a.user_id = ?1
             GROUP BY a.id
             ORDER BY a.current_balance DESC, a.name",
        )?
        .query_map((user_id.as_i64(),), |row| {
            Ok(AccountStatistics {
                account_id: row.get(0)?,
                name: row.get(1)?,
                account_type: row.get(2)?,
                icon: row.get(3)?,
                color: row.get(4)?,
                initial_balance: row.get(5)?,
                current_balance: row.get(6)?,
                income_in: row.get(7)?,
                expense_out: row.get(8)?,
                transaction_count: row.get(9)?,
            })
        })?
        .map(|maybe_statistics| maybe_statistics.map_err(Error::from))
        .collect()
}

/// Get income and expenses for each of the `months` months up to and
/// including the month starting on `last_month_start`, oldest first.
///
/// Months without transactions are included with zero totals.
pub fn get_monthly_trend(
    user_id: UserID,
    last_month_start: Date,
    months: u32,
    connection: &Connection,
) -> Result<Vec<TrendPoint>, Error> {
    let months = i32::try_from(months)
        .map_err(|_| Error::Validation(format!("{months} months is too many")))?;
    let first_month = add_months(last_month_start, 1 - months)?;
    let end = add_months(last_month_start, 1)?;

    let totals: HashMap<String, (Money, Money)> = connection
        .prepare(
            "SELECT substr(transaction_date, 1, 7) AS month,
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0)
             FROM \"transaction\"
             WHERE user_id = ?1 AND transaction_date >= ?2 AND transaction_date < ?3
             GROUP BY month",
        )?
        .query_map((user_id.as_i64(), first_month, end), |row| {
            Ok((row.get(0)?, (row.get(1)?, row.get(2)?)))
        })?
        .collect::<Result<_, _>>()?;

    (0..months)
        .map(|offset| {
            let month_start = add_months(first_month, offset)?;
            let month = format_month(month_start);
            let (income, expense) = totals
                .get(&month)
                .copied()
                .unwrap_or((Money::ZERO, Money::ZERO));

            Ok(TrendPoint {
                label: format_month_label(month_start),
                month,
                income,
                expense,
                net: income - expense,
            })
        })
        .collect()
}

/// Get the income and expenses of each day with transactions in the month
/// starting on `month_start`, earliest day first.
///
/// Days without transactions are left out.
pub fn get_daily_totals(
    user_id: UserID,
    month_start: Date,
    connection: &Connection,
) -> Result<Vec<DailyTotal>, Error> {
    let next_month = add_months(month_start, 1)?;

    connection
        .prepare(
            "SELECT transaction_date,
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0),
                COUNT(id)
             FROM \"transaction\"
             WHERE user_id = ?1 AND transaction_date >= ?2 AND transaction_date < ?3
             GROUP BY transaction_date
             ORDER BY transaction_date",
        )?
        .query_map((user_id.as_i64(), month_start, next_month), |row| {
            Ok(DailyTotal {
                date: row.get(0)?,
                income: row.get(1)?,
                expense: row.get(2)?,
                transaction_count: row.get(3)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}
