//! Defines the `Category` type and how categories are stored.
//! A category groups income or expense transactions, a transaction may only have one category.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, db::run_in_unit_of_work, transaction::category_has_transactions, user::UserID,
};

pub type CategoryId = i64;

/// The icon given to categories created without one.
pub const DEFAULT_CATEGORY_ICON: &str = "tag";
/// The color given to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#95a5a6";

/// Whether a category is for money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            other => Err(Error::Validation(format!(
                "category type must be either income or expense, got {other}"
            ))),
        }
    }
}

impl ToSql for CategoryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.into()))
    }
}

/// A category owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub icon: String,
    pub color: String,
}

/// The data for creating a category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl NewCategory {
    /// A category with the default icon and color.
    pub fn new(name: &str, category_type: CategoryType) -> Self {
        Self {
            name: name.to_owned(),
            category_type,
            icon: None,
            color: None,
        }
    }
}

/// Changes to a category. Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoryEdit {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

fn validate_name(name: &str) -> Result<&str, Error> {
    let name = name.trim();

    if name.is_empty() {
        Err(Error::Validation("category name cannot be empty".to_owned()))
    } else {
        Ok(name)
    }
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            icon TEXT NOT NULL DEFAULT 'tag',
            color TEXT NOT NULL DEFAULT '#95a5a6',
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id)",
        (),
    )?;

    Ok(())
}

const CATEGORY_COLUMNS: &str = "id, name, type, icon, color";

pub fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type: row.get(2)?,
        icon: row.get(3)?,
        color: row.get(4)?,
    })
}

/// Create a category for `user_id`.
///
/// # Errors
/// Returns [Error::Validation] if the name is empty, or [Error::SqlError]
/// if an SQL related error occurred.
pub fn create_category(
    user_id: UserID,
    new_category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = validate_name(&new_category.name)?;
    let icon = new_category
        .icon
        .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_owned());
    let color = new_category
        .color
        .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_owned());

    connection.execute(
        "INSERT INTO category (user_id, name, type, icon, color) VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            user_id.as_i64(),
            name,
            new_category.category_type,
            &icon,
            &color,
        ),
    )?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        name: name.to_owned(),
        category_type: new_category.category_type,
        icon,
        color,
    })
}

/// Get the category `category_id` if it belongs to `user_id`.
///
/// # Errors
/// Returns [Error::MissingCategory] if there is no such category for the user.
pub fn get_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((category_id, user_id.as_i64()), map_row_to_category)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingCategory(category_id),
            error => error.into(),
        })
}

/// List the categories of `user_id`, optionally only those of `category_type`,
/// ordered by type and then name.
pub fn list_categories(
    user_id: UserID,
    category_type: Option<CategoryType>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
             WHERE user_id = ?1 AND (?2 IS NULL OR type = ?2)
             ORDER BY type, name"
        ))?
        .query_map((user_id.as_i64(), category_type), map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Apply `edit` to a category and return the updated category.
///
/// # Errors
/// Returns:
/// - [Error::Validation] for an empty name,
/// - [Error::MissingCategory] if there is no such category for the user,
/// - [Error::CategoryTypeLocked] if the type would change while transactions use the category.
pub fn update_category(
    user_id: UserID,
    category_id: CategoryId,
    edit: CategoryEdit,
    connection: &mut Connection,
) -> Result<Category, Error> {
    let name = edit.name.as_deref().map(validate_name).transpose()?;

    run_in_unit_of_work(connection, |transaction| {
        let stored = get_category(user_id, category_id, transaction)?;

        if let Some(new_type) = edit.category_type {
            if new_type != stored.category_type
                && category_has_transactions(user_id, category_id, transaction)?
            {
                return Err(Error::CategoryTypeLocked(category_id));
            }
        }

        transaction.execute(
            "UPDATE category SET
                name = COALESCE(?1, name),
                type = COALESCE(?2, type),
                icon = COALESCE(?3, icon),
                color = COALESCE(?4, color)
             WHERE id = ?5 AND user_id = ?6",
            (
                name,
                edit.category_type,
                edit.icon.as_deref(),
                edit.color.as_deref(),
                category_id,
                user_id.as_i64(),
            ),
        )?;

        get_category(user_id, category_id, transaction)
    })
}

/// Delete a category that no transaction refers to, along with its budgets.
///
/// # Errors
/// Returns:
/// - [Error::MissingCategory] if there is no such category for the user,
/// - [Error::CategoryInUse] if a transaction uses the category.
pub fn delete_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &mut Connection,
) -> Result<(), Error> {
    run_in_unit_of_work(connection, |transaction| {
        get_category(user_id, category_id, transaction)?;

        if category_has_transactions(user_id, category_id, transaction)? {
            return Err(Error::CategoryInUse(category_id));
        }

        transaction.execute(
            "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, user_id.as_i64()),
        )?;

        Ok(())
    })
}

/// Count the categories of `user_id`.
pub fn count_categories(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM category WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}
