//! SQLite persistence for expense records.
//!
//! [`ExpenseStore`] owns the connection pool and exposes the CRUD surface plus
//! the month-scoped query the graph workflow builds its dataset from. The
//! schema is created on connect; the file is created if missing.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::FromRow;

use crate::error::SpendchartError;

/// Expense categories. Stored as lowercase text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Housing,
    Leisure,
    Health,
    Education,
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Housing => "housing",
            Category::Leisure => "leisure",
            Category::Health => "health",
            Category::Education => "education",
            Category::Other => "other",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "food" => Ok(Category::Food),
            "transport" => Ok(Category::Transport),
            "housing" => Ok(Category::Housing),
            "leisure" => Ok(Category::Leisure),
            "health" => Ok(Category::Health),
            "education" => Ok(Category::Education),
            "other" => Ok(Category::Other),
            _ => Err(format!("unknown category: {s}")),
        }
    }
}

/// An expense record as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub category: Category,
    pub amount: f64,
    pub date: NaiveDate,
}

/// A new expense to be inserted (id assigned by the database).
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub category: Category,
    pub amount: f64,
    pub date: NaiveDate,
}

// Raw row shape; category comes back as text and is parsed on the way out.
#[derive(Debug, FromRow)]
struct ExpenseRow {
    id: i64,
    description: String,
    category: String,
    amount: f64,
    date: NaiveDate,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = SpendchartError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        // Fully-qualified: the ValueEnum derive also supplies a from_str.
        let category = <Category as FromStr>::from_str(&row.category)
            .map_err(SpendchartError::InvalidExpense)?;
        Ok(Expense {
            id: row.id,
            description: row.description,
            category,
            amount: row.amount,
            date: row.date,
        })
    }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    amount REAL NOT NULL,
    date TEXT NOT NULL
)
"#;

/// Handle to the expense database.
#[derive(Debug, Clone)]
pub struct ExpenseStore {
    pool: SqlitePool,
}

impl ExpenseStore {
    /// Opens (creating if missing) the database at `path` and ensures the schema.
    pub async fn connect(path: &Path) -> Result<Self, SpendchartError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Inserts a validated expense and returns it with its assigned id.
    pub async fn add(&self, new: NewExpense) -> Result<Expense, SpendchartError> {
        validate(&new.description, new.amount)?;

        let result = sqlx::query(
            "INSERT INTO expenses (description, category, amount, date) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.description)
        .bind(new.category.to_string())
        .bind(new.amount)
        .bind(new.date)
        .execute(&self.pool)
        .await?;

        Ok(Expense {
            id: result.last_insert_rowid(),
            description: new.description,
            category: new.category,
            amount: new.amount,
            date: new.date,
        })
    }

    /// All expenses in insertion order.
    pub async fn list(&self) -> Result<Vec<Expense>, SpendchartError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            "SELECT id, description, category, amount, date FROM expenses ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Expense::try_from).collect()
    }

    pub async fn get(&self, id: i64) -> Result<Expense, SpendchartError> {
        let row = sqlx::query_as::<_, ExpenseRow>(
            "SELECT id, description, category, amount, date FROM expenses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Expense::try_from(row),
            None => Err(SpendchartError::ExpenseNotFound(id)),
        }
    }

    /// Replaces the expense with `expense.id`. Fails if it does not exist.
    pub async fn update(&self, expense: &Expense) -> Result<(), SpendchartError> {
        validate(&expense.description, expense.amount)?;

        let result = sqlx::query(
            "UPDATE expenses SET description = ?, category = ?, amount = ?, date = ? WHERE id = ?",
        )
        .bind(&expense.description)
        .bind(expense.category.to_string())
        .bind(expense.amount)
        .bind(expense.date)
        .bind(expense.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SpendchartError::ExpenseNotFound(expense.id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), SpendchartError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SpendchartError::ExpenseNotFound(id));
        }
        Ok(())
    }

    /// Expenses in `category` whose date falls in calendar month `month` (1-12),
    /// regardless of year, in insertion order.
    pub async fn by_category_and_month(
        &self,
        category: Category,
        month: u32,
    ) -> Result<Vec<Expense>, SpendchartError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT id, description, category, amount, date
            FROM expenses
            WHERE category = ? AND CAST(strftime('%m', date) AS INTEGER) = ?
            ORDER BY id ASC
            "#,
        )
        .bind(category.to_string())
        .bind(month as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Expense::try_from).collect()
    }
}

// Shared by add and update: the original service rejects non-positive amounts
// and blank descriptions before they reach the table.
fn validate(description: &str, amount: f64) -> Result<(), SpendchartError> {
    if amount <= 0.0 {
        return Err(SpendchartError::InvalidExpense(
            "the expense amount must be positive".into(),
        ));
    }
    if description.trim().is_empty() {
        return Err(SpendchartError::InvalidExpense(
            "the expense description cannot be empty".into(),
        ));
    }
    Ok(())
}
