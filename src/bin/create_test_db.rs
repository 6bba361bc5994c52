use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use dompet_rs::{
    AuthContext, CategoryType, Email, Money, NewUser, PasswordHash, TransactionDraft,
    ValidatedPassword, create_transaction, create_user, initialize_db, list_accounts,
    list_categories, seed_default_data,
};

/// A utility for creating a test database for the REST API server of dompet_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// (category name, amount, days ago)
const SAMPLE_EXPENSES: [(&str, i64, i64); 8] = [
    ("Food & Drinks", 45_000, 1),
    ("Transportation", 20_000, 2),
    ("Bills", 350_000, 5),
    ("Shopping", 275_000, 12),
    ("Food & Drinks", 60_000, 20),
    ("Entertainment", 100_000, 33),
    ("Health", 150_000, 47),
    ("Food & Drinks", 38_000, 64),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user test@example.com with the password 'test'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        NewUser {
            name: "Test User".to_owned(),
            email: Email::new("test@example.com")?,
            password_hash,
        },
        &conn,
    )?;
    seed_default_data(user.id, &conn)?;

    println!("Creating sample transactions...");

    let auth = AuthContext { user_id: user.id };
    let today = OffsetDateTime::now_utc().date();
    let accounts = list_accounts(user.id, &conn)?;
    let categories = list_categories(user.id, None, &conn)?;

    let find_account = |name: &str| {
        accounts
            .iter()
            .find(|account| account.name == name)
            .map(|account| account.id)
            .ok_or_else(|| format!("missing default account {name}"))
    };
    let find_category = |name: &str, category_type: CategoryType| {
        categories
            .iter()
            .find(|category| category.name == name && category.category_type == category_type)
            .map(|category| category.id)
            .ok_or_else(|| format!("missing default category {name}"))
    };

    let bank = find_account("Bank")?;
    let cash = find_account("Cash")?;
    let salary = find_category("Salary", CategoryType::Income)?;

    for months_ago in 0..3 {
        let draft = TransactionDraft::income(bank, salary, Money::new(Decimal::from(8_500_000))?)
            .on(today - Duration::days(30 * months_ago))
            .description("Monthly salary");
        create_transaction(&auth, draft, today, &mut conn)?;
    }

    let draft = TransactionDraft::transfer(bank, cash, Money::new(Decimal::from(1_000_000))?)
        .on(today - Duration::days(25))
        .description("ATM withdrawal");
    create_transaction(&auth, draft, today, &mut conn)?;

    for (category_name, amount, days_ago) in SAMPLE_EXPENSES {
        let category = find_category(category_name, CategoryType::Expense)?;
        let draft = TransactionDraft::expense(cash, category, Money::new(Decimal::from(amount))?)
            .on(today - Duration::days(days_ago))
            .description(category_name);
        create_transaction(&auth, draft, today, &mut conn)?;
    }

    println!("Success!");

    Ok(())
}
