//! The categories and accounts every new user starts with.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error, Money,
    account::{AccountType, NewAccount, count_accounts, create_account},
    category::{CategoryType, NewCategory, count_categories, create_category},
    user::UserID,
};

/// (name, type, icon, color)
const DEFAULT_CATEGORIES: [(&str, CategoryType, &str, &str); 12] = [
    ("Salary", CategoryType::Income, "briefcase", "#27ae60"),
    ("Bonus", CategoryType::Income, "gift", "#2ecc71"),
    ("Investment", CategoryType::Income, "trending-up", "#16a085"),
    ("Other Income", CategoryType::Income, "plus-circle", "#1abc9c"),
    ("Food & Drinks", CategoryType::Expense, "utensils", "#e74c3c"),
    ("Transportation", CategoryType::Expense, "car", "#e67e22"),
    ("Shopping", CategoryType::Expense, "shopping-cart", "#f39c12"),
    ("Bills", CategoryType::Expense, "file-text", "#d35400"),
    ("Entertainment", CategoryType::Expense, "film", "#9b59b6"),
    ("Health", CategoryType::Expense, "heart", "#c0392b"),
    ("Education", CategoryType::Expense, "book", "#8e44ad"),
    ("Other Expenses", CategoryType::Expense, "more-horizontal", "#7f8c8d"),
];

/// (name, type, icon, color)
const DEFAULT_ACCOUNTS: [(&str, AccountType, &str, &str); 2] = [
    ("Cash", AccountType::Cash, "wallet", "#3498db"),
    ("Bank", AccountType::Bank, "university", "#2980b9"),
];

/// How many rows [seed_default_data] inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub categories_created: usize,
    pub accounts_created: usize,
}

/// Give `user_id` the default categories if they have none, and the default
/// accounts if they have none.
///
/// Each half is skipped on its own when the user already has rows of that
/// kind, so running this again never creates duplicates. Each half is
/// inserted all at once or not at all.
///
/// # Errors
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn seed_default_data(user_id: UserID, connection: &Connection) -> Result<SeedOutcome, Error> {
    let mut outcome = SeedOutcome {
        categories_created: 0,
        accounts_created: 0,
    };

    if count_categories(user_id, connection)? == 0 {
        let transaction = connection.unchecked_transaction()?;

        for (name, category_type, icon, color) in DEFAULT_CATEGORIES {
            create_category(
                user_id,
                NewCategory {
                    icon: Some(icon.to_owned()),
                    color: Some(color.to_owned()),
                    ..NewCategory::new(name, category_type)
                },
                &transaction,
            )?;
        }

        transaction.commit()?;
        outcome.categories_created = DEFAULT_CATEGORIES.len();
    }

    if count_accounts(user_id, connection)? == 0 {
        let transaction = connection.unchecked_transaction()?;

        for (name, account_type, icon, color) in DEFAULT_ACCOUNTS {
            create_account(
                user_id,
                NewAccount {
                    icon: Some(icon.to_owned()),
                    color: Some(color.to_owned()),
                    ..NewAccount::new(name, account_type, Money::ZERO)
                },
                &transaction,
            )?;
        }

        transaction.commit()?;
        outcome.accounts_created = DEFAULT_ACCOUNTS.len();
    }

    tracing::debug!("Seeded default data for user {user_id}: {outcome:?}");

    Ok(outcome)
}
