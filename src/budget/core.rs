//! Spending limits on expense categories and how they are stored.
//!
//! Budgets are never touched by the ledger, progress is worked out from the
//! transactions in the budget's category whenever it is read.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, Money,
    category::{CategoryId, CategoryType, get_category},
    user::UserID,
};

pub type BudgetId = i64;

/// The alert threshold used when a budget is created without one.
pub const DEFAULT_ALERT_PERCENTAGE: u8 = 80;

/// How often a budget's amount is meant to be spent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }
}

impl Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            other => Err(Error::Validation(format!(
                "budget period must be one of weekly, monthly or yearly, got {other}"
            ))),
        }
    }
}

impl ToSql for BudgetPeriod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BudgetPeriod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.into()))
    }
}

/// A spending limit on one expense category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    pub id: BudgetId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub icon: String,
    pub color: String,
    pub name: Option<String>,
    pub amount: Money,
    pub period: BudgetPeriod,
    pub start_date: Date,
    /// The last day counted against the budget, open-ended if `None`.
    pub end_date: Option<Date>,
    /// The share of the amount, in percent, at which spending is flagged.
    pub alert_percentage: u8,
}

/// The data for creating a budget.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewBudget {
    pub category_id: CategoryId,
    pub name: Option<String>,
    pub amount: Money,
    #[serde(default)]
    pub period: BudgetPeriod,
    /// Defaults to today.
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    /// Defaults to [DEFAULT_ALERT_PERCENTAGE].
    pub alert_percentage: Option<i64>,
}

impl NewBudget {
    /// An open-ended monthly budget starting today.
    pub fn monthly(category_id: CategoryId, amount: Money) -> Self {
        Self {
            category_id,
            name: None,
            amount,
            period: BudgetPeriod::Monthly,
            start_date: None,
            end_date: None,
            alert_percentage: None,
        }
    }
}

/// Changes to a budget. Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BudgetEdit {
    pub name: Option<String>,
    pub amount: Option<Money>,
    pub period: Option<BudgetPeriod>,
    pub end_date: Option<Date>,
    pub alert_percentage: Option<i64>,
}

/// Whether spending is within a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// More than the budgeted amount was spent.
    Over,
    /// Spending reached the alert percentage.
    Warning,
    Safe,
}

/// A budget with how much of it has been spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    #[serde(flatten)]
    pub budget: Budget,
    pub spent: Money,
    /// `spent` as a percentage of the budgeted amount, rounded to two decimal places.
    pub percentage: Decimal,
    pub status: BudgetStatus,
}

impl BudgetProgress {
    /// Work out the progress of `budget` given the amount `spent` in its date range.
    pub fn new(budget: Budget, spent: Money) -> Self {
        let percentage = if budget.amount.is_positive() {
            (spent.as_decimal() / budget.amount.as_decimal() * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };

        let status = if spent > budget.amount {
            BudgetStatus::Over
        } else if percentage >= Decimal::from(budget.alert_percentage) {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Safe
        };

        Self {
            budget,
            spent,
            percentage,
            status,
        }
    }
}

/// The totals across all of a user's budgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub total_budget: Money,
    pub total_spent: Money,
    pub remaining: Money,
}

/// Add up the budgeted and spent amounts of `progress`.
pub fn summarize_budgets(progress: &[BudgetProgress]) -> BudgetSummary {
    let total_budget: Money = progress.iter().map(|item| item.budget.amount).sum();
    let total_spent: Money = progress.iter().map(|item| item.spent).sum();

    BudgetSummary {
        total_budget,
        total_spent,
        remaining: total_budget - total_spent,
    }
}

fn validate_amount(amount: Money) -> Result<Money, Error> {
    if !amount.is_positive() {
        return Err(Error::Validation(
            "budget amount must be greater than zero".to_owned(),
        ));
    }

    amount.check_precision()?;

    Ok(amount)
}

fn validate_alert_percentage(alert_percentage: i64) -> Result<u8, Error> {
    match u8::try_from(alert_percentage) {
        Ok(percentage) if (1..=100).contains(&percentage) => Ok(percentage),
        _ => Err(Error::Validation(
            "alert_percentage must be between 1 and 100".to_owned(),
        )),
    }
}

fn validate_date_range(start_date: Date, end_date: Option<Date>) -> Result<(), Error> {
    match end_date {
        Some(end_date) if end_date < start_date => Err(Error::Validation(
            "end_date cannot be before start_date".to_owned(),
        )),
        _ => Ok(()),
    }
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            name TEXT,
            amount INTEGER NOT NULL CHECK (amount > 0),
            period TEXT NOT NULL DEFAULT 'monthly'
                CHECK (period IN ('weekly', 'monthly', 'yearly')),
            start_date TEXT NOT NULL,
            end_date TEXT,
            alert_percentage INTEGER NOT NULL DEFAULT 80
                CHECK (alert_percentage BETWEEN 1 AND 100),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_user ON budget(user_id)",
        (),
    )?;

    Ok(())
}

const BUDGET_COLUMNS: &str = "b.id, b.category_id, c.name, c.icon, c.color, b.name, b.amount, \
    b.period, b.start_date, b.end_date, b.alert_percentage";

const BUDGET_TABLES: &str = "FROM budget b INNER JOIN category c ON c.id = b.category_id";

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        category_id: row.get(1)?,
        category_name: row.get(2)?,
        icon: row.get(3)?,
        color: row.get(4)?,
        name: row.get(5)?,
        amount: row.get(6)?,
        period: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
        alert_percentage: row.get(10)?,
    })
}

/// Create a budget for one of the expense categories of `user_id`.
///
/// A budget without a start date starts `today`.
///
/// # Errors
/// Returns:
/// - [Error::MissingCategory] if the category does not belong to the user,
/// - [Error::Validation] if the category is not an expense category, the
///   amount is not positive, the end date precedes the start date or the
///   alert percentage is outside 1 to 100,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_budget(
    user_id: UserID,
    new_budget: NewBudget,
    today: Date,
    connection: &Connection,
) -> Result<Budget, Error> {
    let amount = validate_amount(new_budget.amount)?;
    let alert_percentage = new_budget
        .alert_percentage
        .map(validate_alert_percentage)
        .transpose()?
        .unwrap_or(DEFAULT_ALERT_PERCENTAGE);
    let start_date = new_budget.start_date.unwrap_or(today);
    validate_date_range(start_date, new_budget.end_date)?;

    let category = get_category(user_id, new_budget.category_id, connection)?;
    if category.category_type != CategoryType::Expense {
        return Err(Error::Validation(
            "budgets can only be set for expense categories".to_owned(),
        ));
    }

    let name = new_budget
        .name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty());

    connection.execute(
        "INSERT INTO budget (user_id, category_id, name, amount, period, start_date, end_date,
            alert_percentage)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            user_id.as_i64(),
            category.id,
            name.as_deref(),
            amount,
            new_budget.period,
            start_date,
            new_budget.end_date,
            alert_percentage,
        ),
    )?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        category_id: category.id,
        category_name: category.name,
        icon: category.icon,
        color: category.color,
        name,
        amount,
        period: new_budget.period,
        start_date,
        end_date: new_budget.end_date,
        alert_percentage,
    })
}

/// Get the budget `budget_id` if it belongs to `user_id`.
///
/// # Errors
/// Returns [Error::MissingBudget] if there is no such budget for the user.
pub fn get_budget(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} {BUDGET_TABLES} WHERE b.id = ?1 AND b.user_id = ?2"
        ))?
        .query_row((budget_id, user_id.as_i64()), map_budget_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingBudget(budget_id),
            error => error.into(),
        })
}

/// List the budgets of `user_id` ordered by category name.
pub fn list_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} {BUDGET_TABLES} WHERE b.user_id = ?1 ORDER BY c.name, b.id"
        ))?
        .query_map((user_id.as_i64(),), map_budget_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Apply `edit` to a budget and return the updated budget.
///
/// # Errors
/// Returns [Error::MissingBudget] if there is no such budget for the user,
/// or [Error::Validation] if the edited budget breaks one of the rules of
/// [create_budget].
pub fn update_budget(
    user_id: UserID,
    budget_id: BudgetId,
    edit: BudgetEdit,
    connection: &Connection,
) -> Result<Budget, Error> {
    let stored = get_budget(user_id, budget_id, connection)?;

    let amount = edit.amount.map(validate_amount).transpose()?;
    let alert_percentage = edit
        .alert_percentage
        .map(validate_alert_percentage)
        .transpose()?;
    validate_date_range(stored.start_date, edit.end_date.or(stored.end_date))?;
    let name = edit.name.map(|name| name.trim().to_owned());

    connection.execute(
        "UPDATE budget SET
            name = COALESCE(NULLIF(?1, ''), name),
            amount = COALESCE(?2, amount),
            period = COALESCE(?3, period),
            end_date = COALESCE(?4, end_date),
            alert_percentage = COALESCE(?5, alert_percentage)
         WHERE id = ?6 AND user_id = ?7",
        (
            name.as_deref(),
            amount,
            edit.period,
            edit.end_date,
            alert_percentage,
            budget_id,
            user_id.as_i64(),
        ),
    )?;

    get_budget(user_id, budget_id, connection)
}

/// Delete a budget.
///
/// # Errors
/// Returns [Error::MissingBudget] if there is no such budget for the user.
pub fn delete_budget(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (budget_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::MissingBudget(budget_id));
    }

    Ok(())
}

/// Count the budgets of `user_id`.
pub fn count_budgets(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM budget WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get the progress of every budget of `user_id`, the most spent first.
///
/// The amount spent is the sum of the expenses in the budget's category from
/// its start date up to and including its end date.
pub fn get_budget_progress(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<BudgetProgress>, Error> {
    let mut progress = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS},
                (SELECT COALESCE(SUM(t.amount), 0) FROM \"transaction\" t
                 WHERE t.user_id = b.user_id
                    AND t.type = 'expense'
                    AND t.category_id = b.category_id
                    AND t.transaction_date >= b.start_date
                    AND (b.end_date IS NULL OR t.transaction_date <= b.end_date))
             {BUDGET_TABLES}
             WHERE b.user_id = ?1"
        ))?
        .query_map((user_id.as_i64(),), |row| {
            Ok(BudgetProgress::new(map_budget_row(row)?, row.get(11)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    progress.sort_by(|a, b| b.percentage.cmp(&a.percentage));

    Ok(progress)
}

#[cfg(test)]
mod budget_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error, Money,
        account::{AccountType, NewAccount, create_account},
        auth::AuthContext,
        category::{CategoryId, CategoryType, NewCategory, create_category},
        test_utils::{get_test_connection, insert_test_user},
        transaction::{TransactionDraft, create_transaction},
        user::UserID,
    };

    use super::{
        BudgetEdit, BudgetPeriod, BudgetStatus, DEFAULT_ALERT_PERCENTAGE, NewBudget,
        count_budgets, create_budget, delete_budget, get_budget, get_budget_progress,
        list_budgets, summarize_budgets, update_budget,
    };

    fn money(value: rust_decimal::Decimal) -> Money {
        Money::new(value).unwrap()
    }

    fn setup() -> (Connection, UserID, CategoryId) {
        let connection = get_test_connection();
        let user_id = insert_test_user(&connection, "budi@example.com");
        let category = create_category(
            user_id,
            NewCategory::new("Food", CategoryType::Expense),
            &connection,
        )
        .unwrap();

        (connection, user_id, category.id)
    }

    #[test]
    fn create_applies_defaults() {
        let (connection, user_id, category_id) = setup();

        let budget = create_budget(
            user_id,
            NewBudget::monthly(category_id, money(dec!(500))),
            date!(2024 - 03 - 01),
            &connection,
        )
        .unwrap();

        assert_eq!(budget.category_name, "Food");
        assert_eq!(budget.period, BudgetPeriod::Monthly);
        assert_eq!(budget.start_date, date!(2024 - 03 - 01));
        assert_eq!(budget.end_date, None);
        assert_eq!(budget.alert_percentage, DEFAULT_ALERT_PERCENTAGE);
        assert_eq!(get_budget(user_id, budget.id, &connection), Ok(budget));
    }

    #[test]
    fn create_rejects_income_category() {
        let (connection, user_id, _) = setup();
        let salary = create_category(
            user_id,
            NewCategory::new("Salary", CategoryType::Income),
            &connection,
        )
        .unwrap();

        let result = create_budget(
            user_id,
            NewBudget::monthly(salary.id, money(dec!(500))),
            date!(2024 - 03 - 01),
            &connection,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(count_budgets(user_id, &connection), Ok(0));
    }

    #[test]
    fn create_rejects_another_users_category() {
        let (connection, _, category_id) = setup();
        let other_user = insert_test_user(&connection, "siti@example.com");

        let result = create_budget(
            other_user,
            NewBudget::monthly(category_id, money(dec!(500))),
            date!(2024 - 03 - 01),
            &connection,
        );

        assert_eq!(result, Err(Error::MissingCategory(category_id)));
    }

    #[test]
    fn create_rejects_invalid_fields() {
        let (connection, user_id, category_id) = setup();
        let invalid_budgets = [
            NewBudget::monthly(category_id, Money::ZERO),
            NewBudget {
                alert_percentage: Some(0),
                ..NewBudget::monthly(category_id, money(dec!(1)))
            },
            NewBudget {
                alert_percentage: Some(101),
                ..NewBudget::monthly(category_id, money(dec!(1)))
            },
            NewBudget {
                start_date: Some(date!(2024 - 03 - 10)),
                end_date: Some(date!(2024 - 03 - 09)),
                ..NewBudget::monthly(category_id, money(dec!(1)))
            },
        ];

        for new_budget in invalid_budgets {
            let result = create_budget(user_id, new_budget, date!(2024 - 03 - 01), &connection);

            assert!(
                matches!(result, Err(Error::Validation(_))),
                "expected a validation error, got {result:?}"
            );
        }
        assert_eq!(count_budgets(user_id, &connection), Ok(0));
    }

    #[test]
    fn update_changes_only_given_fields() {
        let (connection, user_id, category_id) = setup();
        let budget = create_budget(
            user_id,
            NewBudget::monthly(category_id, money(dec!(500))),
            date!(2024 - 03 - 01),
            &connection,
        )
        .unwrap();

        let updated = update_budget(
            user_id,
            budget.id,
            BudgetEdit {
                amount: Some(money(dec!(750))),
                period: Some(BudgetPeriod::Weekly),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.amount, money(dec!(750)));
        assert_eq!(updated.period, BudgetPeriod::Weekly);
        assert_eq!(updated.alert_percentage, budget.alert_percentage);
        assert_eq!(updated.start_date, budget.start_date);
    }

    #[test]
    fn update_rejects_end_before_start() {
        let (connection, user_id, category_id) = setup();
        let budget = create_budget(
            user_id,
            NewBudget::monthly(category_id, money(dec!(500))),
            date!(2024 - 03 - 01),
            &connection,
        )
        .unwrap();

        let result = update_budget(
            user_id,
            budget.id,
            BudgetEdit {
                end_date: Some(date!(2024 - 02 - 01)),
                ..Default::default()
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn update_missing_budget_is_not_found() {
        let (connection, user_id, _) = setup();

        let result = update_budget(user_id, 3, BudgetEdit::default(), &connection);

        assert_eq!(result, Err(Error::MissingBudget(3)));
    }

    #[test]
    fn delete_removes_budget() {
        let (connection, user_id, category_id) = setup();
        let budget = create_budget(
            user_id,
            NewBudget::monthly(category_id, money(dec!(500))),
            date!(2024 - 03 - 01),
            &connection,
        )
        .unwrap();

        delete_budget(user_id, budget.id, &connection).unwrap();

        assert_eq!(list_budgets(user_id, &connection), Ok(vec![]));
        assert_eq!(
            delete_budget(user_id, budget.id, &connection),
            Err(Error::MissingBudget(budget.id))
        );
    }

    #[test]
    fn progress_counts_expenses_in_date_range() {
        let (mut connection, user_id, food) = setup();
        let auth = AuthContext { user_id };
        let transport = create_category(
            user_id,
            NewCategory::new("Transport", CategoryType::Expense),
            &connection,
        )
        .unwrap()
        .id;
        let account = create_account(
            user_id,
            NewAccount::new("Wallet", AccountType::Cash, money(dec!(1000))),
            &connection,
        )
        .unwrap()
        .id;
        let food_budget = create_budget(
            user_id,
            NewBudget {
                start_date: Some(date!(2024 - 03 - 01)),
                end_date: Some(date!(2024 - 03 - 31)),
                ..NewBudget::monthly(food, money(dec!(200)))
            },
            date!(2024 - 03 - 01),
            &connection,
        )
        .unwrap();
        let transport_budget = create_budget(
            user_id,
            NewBudget {
                start_date: Some(date!(2024 - 03 - 01)),
                alert_percentage: Some(50),
                ..NewBudget::monthly(transport, money(dec!(100)))
            },
            date!(2024 - 03 - 01),
            &connection,
        )
        .unwrap();
        let drafts = [
            // Before the food budget starts.
            TransactionDraft::expense(account, food, money(dec!(70))).on(date!(2024 - 02 - 28)),
            TransactionDraft::expense(account, food, money(dec!(150))).on(date!(2024 - 03 - 02)),
            TransactionDraft::expense(account, food, money(dec!(60))).on(date!(2024 - 03 - 31)),
            // After the food budget ends.
            TransactionDraft::expense(account, food, money(dec!(10))).on(date!(2024 - 04 - 01)),
            TransactionDraft::expense(account, transport, money(dec!(50)))
                .on(date!(2024 - 03 - 10)),
        ];
        for draft in drafts {
            create_transaction(&auth, draft, date!(2024 - 04 - 01), &mut connection).unwrap();
        }

        let progress = get_budget_progress(user_id, &connection).unwrap();

        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].budget.id, food_budget.id);
        assert_eq!(progress[0].spent, money(dec!(210)));
        assert_eq!(progress[0].percentage, dec!(105));
        assert_eq!(progress[0].status, BudgetStatus::Over);
        assert_eq!(progress[1].budget.id, transport_budget.id);
        assert_eq!(progress[1].spent, money(dec!(50)));
        assert_eq!(progress[1].percentage, dec!(50));
        assert_eq!(progress[1].status, BudgetStatus::Warning);

        let summary = summarize_budgets(&progress);
        assert_eq!(summary.total_budget, money(dec!(300)));
        assert_eq!(summary.total_spent, money(dec!(260)));
        assert_eq!(summary.remaining, money(dec!(40)));
    }

    #[test]
    fn progress_without_spending_is_safe() {
        let (connection, user_id, category_id) = setup();
        create_budget(
            user_id,
            NewBudget::monthly(category_id, money(dec!(300))),
            date!(2024 - 03 - 01),
            &connection,
        )
        .unwrap();

        let progress = get_budget_progress(user_id, &connection).unwrap();

        assert_eq!(progress[0].spent, Money::ZERO);
        assert_eq!(progress[0].percentage, dec!(0));
        assert_eq!(progress[0].status, BudgetStatus::Safe);
    }
}
