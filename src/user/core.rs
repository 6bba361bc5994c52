//! Code for creating the user table and reading and writing users.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    user::{Email, PasswordHash},
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The currency given to new users.
pub const DEFAULT_CURRENCY: &str = "IDR";
/// The language given to new users.
pub const DEFAULT_LANGUAGE: &str = "id";
/// The date format given to new users.
pub const DEFAULT_DATE_FORMAT: &str = "d/m/Y";
/// The UI theme given to new users.
pub const DEFAULT_THEME: &str = "light";

/// A registered user and their preferences.
///
/// The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The email address the user logs in with.
    pub email: Email,
    #[serde(skip)]
    pub password_hash: PasswordHash,
    /// ISO 4217 code of the currency amounts are shown in.
    pub currency: String,
    pub language: String,
    pub date_format: String,
    pub theme: String,
    /// A reference to the user's profile photo, if they uploaded one.
    pub profile_photo: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The data needed to register a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: PasswordHash,
}

/// A partial update of a user's profile and preferences.
///
/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub currency: Option<String>,
    pub language: Option<String>,
    pub date_format: Option<String>,
    pub theme: Option<String>,
    pub profile_photo: Option<String>,
}

impl ProfileUpdate {
    fn validate(&self) -> Result<(), Error> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(Error::Validation("name cannot be empty".to_owned()));
        }

        if let Some(currency) = &self.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(Error::Validation(format!(
                    "{currency} is not a three letter currency code"
                )));
            }
        }

        if let Some(theme) = &self.theme {
            if theme != "light" && theme != "dark" {
                return Err(Error::Validation(format!(
                    "theme must be either light or dark, got {theme}"
                )));
            }
        }

        for (field, value) in [
            ("language", &self.language),
            ("date_format", &self.date_format),
        ] {
            if value.as_deref().is_some_and(|value| value.trim().is_empty()) {
                return Err(Error::Validation(format!("{field} cannot be empty")));
            }
        }

        Ok(())
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                currency TEXT NOT NULL DEFAULT 'IDR',
                language TEXT NOT NULL DEFAULT 'id',
                date_format TEXT NOT NULL DEFAULT 'd/m/Y',
                theme TEXT NOT NULL DEFAULT 'light',
                profile_photo TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

const USER_COLUMNS: &str = "id, name, email, password, currency, language, date_format, theme, \
                            profile_photo, created_at";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserID::new(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        currency: row.get(4)?,
        language: row.get(5)?,
        date_format: row.get(6)?,
        theme: row.get(7)?,
        profile_photo: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Create and insert a new user into the database with the default preferences.
///
/// # Errors
///
/// Returns:
/// - [Error::Validation] if the name is empty,
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let name = new_user.name.trim();

    if name.is_empty() {
        return Err(Error::Validation("name cannot be empty".to_owned()));
    }

    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO user (name, email, password, currency, language, date_format, theme, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            name,
            &new_user.email,
            &new_user.password_hash,
            DEFAULT_CURRENCY,
            DEFAULT_LANGUAGE,
            DEFAULT_DATE_FORMAT,
            DEFAULT_THEME,
            created_at,
        ),
    )?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        name: name.to_owned(),
        email: new_user.email,
        password_hash: new_user.password_hash,
        currency: DEFAULT_CURRENCY.to_owned(),
        language: DEFAULT_LANGUAGE.to_owned(),
        date_format: DEFAULT_DATE_FORMAT.to_owned(),
        theme: DEFAULT_THEME.to_owned(),
        profile_photo: None,
        created_at,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`, ignoring case.
///
/// Returns `Ok(None)` if nobody registered with the address.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_user_by_email(email: &Email, connection: &Connection) -> Result<Option<User>, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
        ))?
        .query_row(&[(":email", email.as_str())], map_user_row)
        .optional()
        .map_err(|error| error.into())
}

/// Apply `update` to the profile of `user_id` and return the updated user.
///
/// An empty `profile_photo` string clears the stored photo.
///
/// # Errors
///
/// Returns:
/// - [Error::Validation] if a field breaks its rule,
/// - [Error::DuplicateEmail] if the new email belongs to another user,
/// - [Error::NotFound] if the user does not exist,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn update_profile(
    user_id: UserID,
    update: ProfileUpdate,
    connection: &Connection,
) -> Result<User, Error> {
    update.validate()?;

    let clear_photo = update.profile_photo.as_deref() == Some("");

    let rows_affected = connection.execute(
        "UPDATE user SET
            name = COALESCE(?1, name),
            email = COALESCE(?2, email),
            currency = COALESCE(?3, currency),
            language = COALESCE(?4, language),
            date_format = COALESCE(?5, date_format),
            theme = COALESCE(?6, theme),
            profile_photo = CASE WHEN ?7 THEN NULL ELSE COALESCE(?8, profile_photo) END
         WHERE id = ?9",
        (
            update.name.as_deref().map(str::trim),
            update.email.as_ref(),
            update.currency.as_deref(),
            update.language.as_deref(),
            update.date_format.as_deref(),
            update.theme.as_deref(),
            clear_photo,
            update.profile_photo.as_deref(),
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_user_by_id(user_id, connection)
}

/// Replace the password hash of `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or a
/// [Error::SqlError] if an SQL related error occurred.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete `user_id` and everything they own in one unit of work.
///
/// Transactions are removed before the accounts and categories they
/// reference.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or a
/// [Error::SqlError] if an SQL related error occurred.
pub fn delete_user(user_id: UserID, connection: &mut Connection) -> Result<(), Error> {
    crate::db::run_in_unit_of_work(connection, |transaction| {
        delete_user_data(user_id, transaction)?;

        match transaction.execute("DELETE FROM user WHERE id = ?1", (user_id.as_i64(),))? {
            0 => Err(Error::NotFound),
            _ => Ok(()),
        }
    })
}

/// Delete every transaction, budget, category and account of `user_id`
/// while keeping the user.
///
/// Either everything is deleted or nothing is.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or a
/// [Error::SqlError] if an SQL related error occurred.
pub fn clear_user_data(user_id: UserID, connection: &mut Connection) -> Result<(), Error> {
    crate::db::run_in_unit_of_work(connection, |transaction| {
        get_user_by_id(user_id, transaction)?;
        delete_user_data(user_id, transaction)
    })
}

/// Transactions go first since they restrict deleting their accounts and categories.
fn delete_user_data(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let id = user_id.as_i64();

    connection.execute("DELETE FROM \"transaction\" WHERE user_id = ?1", (id,))?;
    connection.execute("DELETE FROM budget WHERE user_id = ?1", (id,))?;
    connection.execute("DELETE FROM category WHERE user_id = ?1", (id,))?;
    connection.execute("DELETE FROM account WHERE user_id = ?1", (id,))?;

    Ok(())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error, Money,
        account::{count_accounts, list_accounts},
        auth::AuthContext,
        budget::{NewBudget, count_budgets, create_budget},
        category::{CategoryType, count_categories, list_categories},
        db::initialize,
        seed::seed_default_data,
        transaction::{TransactionDraft, count_transactions, create_transaction},
        user::{Email, PasswordHash},
    };

    use super::{
        NewUser, ProfileUpdate, UserID, clear_user_data, count_users, create_user, delete_user,
        get_user_by_email, get_user_by_id, update_password, update_profile,
    };

    fn get_db_connection() -> Connection {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        connection
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Budi".to_owned(),
            email: Email::new(email).unwrap(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        }
    }

    #[test]
    fn insert_user_succeeds_with_defaults() {
        let connection = get_db_connection();

        let user = create_user(new_user("budi@example.com"), &connection).unwrap();

        assert!(user.id.as_i64() > 0);
        assert_eq!(user.currency, "IDR");
        assert_eq!(user.language, "id");
        assert_eq!(user.date_format, "d/m/Y");
        assert_eq!(user.theme, "light");
        assert_eq!(user.profile_photo, None);
    }

    #[test]
    fn insert_user_fails_on_empty_name() {
        let connection = get_db_connection();
        let mut user = new_user("budi@example.com");
        user.name = "  ".to_owned();

        let result = create_user(user, &connection);

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(count_users(&connection), Ok(0));
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let connection = get_db_connection();
        create_user(new_user("budi@example.com"), &connection).unwrap();

        let result = create_user(new_user("BUDI@example.com"), &connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_by_id_round_trips() {
        let connection = get_db_connection();
        let inserted_user = create_user(new_user("budi@example.com"), &connection).unwrap();

        let selected_user = get_user_by_id(inserted_user.id, &connection).unwrap();

        assert_eq!(selected_user.id, inserted_user.id);
        assert_eq!(selected_user.email, inserted_user.email);
        assert_eq!(selected_user.password_hash, inserted_user.password_hash);
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let connection = get_db_connection();

        assert_eq!(
            get_user_by_id(UserID::new(42), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_user_by_email_ignores_case() {
        let connection = get_db_connection();
        let inserted_user = create_user(new_user("budi@example.com"), &connection).unwrap();

        let selected_user =
            get_user_by_email(&Email::new("Budi@Example.com").unwrap(), &connection).unwrap();

        assert_eq!(selected_user.map(|user| user.id), Some(inserted_user.id));
    }

    #[test]
    fn get_user_by_unknown_email_returns_none() {
        let connection = get_db_connection();

        let selected_user =
            get_user_by_email(&Email::new("nobody@example.com").unwrap(), &connection).unwrap();

        assert_eq!(selected_user, None);
    }

    #[test]
    fn update_profile_only_changes_given_fields() {
        let connection = get_db_connection();
        let user = create_user(new_user("budi@example.com"), &connection).unwrap();

        let updated = update_profile(
            user.id,
            ProfileUpdate {
                currency: Some("USD".to_owned()),
                theme: Some("dark".to_owned()),
                profile_photo: Some("photos/budi.png".to_owned()),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.name, "Budi");
        assert_eq!(updated.currency, "USD");
        assert_eq!(updated.theme, "dark");
        assert_eq!(updated.language, "id");
        assert_eq!(updated.profile_photo.as_deref(), Some("photos/budi.png"));
    }

    #[test]
    fn update_profile_clears_photo_with_empty_string() {
        let connection = get_db_connection();
        let user = create_user(new_user("budi@example.com"), &connection).unwrap();
        update_profile(
            user.id,
            ProfileUpdate {
                profile_photo: Some("photos/budi.png".to_owned()),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        let updated = update_profile(
            user.id,
            ProfileUpdate {
                profile_photo: Some(String::new()),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.profile_photo, None);
    }

    #[test]
    fn update_profile_rejects_invalid_theme() {
        let connection = get_db_connection();
        let user = create_user(new_user("budi@example.com"), &connection).unwrap();

        let result = update_profile(
            user.id,
            ProfileUpdate {
                theme: Some("neon".to_owned()),
                ..Default::default()
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn update_profile_rejects_taken_email() {
        let connection = get_db_connection();
        create_user(new_user("ani@example.com"), &connection).unwrap();
        let user = create_user(new_user("budi@example.com"), &connection).unwrap();

        let result = update_profile(
            user.id,
            ProfileUpdate {
                email: Some(Email::new("ani@example.com").unwrap()),
                ..Default::default()
            },
            &connection,
        );

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn update_password_replaces_hash() {
        let connection = get_db_connection();
        let user = create_user(new_user("budi@example.com"), &connection).unwrap();
        let new_hash = PasswordHash::new_unchecked("hunter3");

        update_password(user.id, &new_hash, &connection).unwrap();

        let stored = get_user_by_id(user.id, &connection).unwrap();
        assert_eq!(stored.password_hash, new_hash);
    }

    #[test]
    fn update_password_fails_for_missing_user() {
        let connection = get_db_connection();

        let result = update_password(
            UserID::new(7),
            &PasswordHash::new_unchecked("hunter3"),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_user_removes_user() {
        let mut connection = get_db_connection();
        let user = create_user(new_user("budi@example.com"), &connection).unwrap();

        delete_user(user.id, &mut connection).unwrap();

        assert_eq!(count_users(&connection), Ok(0));
        assert_eq!(
            delete_user(user.id, &mut connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn clear_user_data_keeps_user_and_other_users() {
        let mut connection = get_db_connection();
        let user = create_user(new_user("budi@example.com"), &connection).unwrap();
        let other = create_user(new_user("siti@example.com"), &connection).unwrap();
        for user_id in [user.id, other.id] {
            seed_default_data(user_id, &connection).unwrap();
        }
        let cash = list_accounts(user.id, &connection).unwrap()[0].id;
        let food = list_categories(user.id, Some(CategoryType::Expense), &connection).unwrap()[0].id;
        create_transaction(
            &AuthContext { user_id: user.id },
            TransactionDraft::expense(cash, food, Money::new(dec!(15)).unwrap()),
            date!(2024 - 03 - 01),
            &mut connection,
        )
        .unwrap();
        create_budget(
            user.id,
            NewBudget::monthly(food, Money::new(dec!(100)).unwrap()),
            date!(2024 - 03 - 01),
            &connection,
        )
        .unwrap();

        clear_user_data(user.id, &mut connection).unwrap();

        assert_eq!(count_transactions(user.id, &connection), Ok(0));
        assert_eq!(count_budgets(user.id, &connection), Ok(0));
        assert_eq!(count_categories(user.id, &connection), Ok(0));
        assert_eq!(count_accounts(user.id, &connection), Ok(0));
        assert!(get_user_by_id(user.id, &connection).is_ok());
        assert_eq!(count_categories(other.id, &connection), Ok(12));
        assert_eq!(count_accounts(other.id, &connection), Ok(2));
    }

    #[test]
    fn clear_data_of_missing_user_is_not_found() {
        let mut connection = get_db_connection();

        assert_eq!(
            clear_user_data(UserID::new(42), &mut connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn serialized_user_has_no_password_hash() {
        let connection = get_db_connection();
        let user = create_user(new_user("budi@example.com"), &connection).unwrap();

        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "budi@example.com");
    }
}
