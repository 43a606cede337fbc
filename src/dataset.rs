//! Builds the export payload the chart run receives as input.
//!
//! A (category, month name) selection is resolved against the expense store
//! and normalized into an [`ExportPayload`], the only shape the external
//! runner ever sees. The payload is built fresh per request and never
//! persisted.

use serde::Serialize;

use crate::error::SpendchartError;
use crate::store::{Category, ExpenseStore};

// Fixed, locale-invariant month-name table. Index + 1 is the calendar month.
const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Resolves a full English month name (case-insensitive) to 1-12.
pub fn month_number(name: &str) -> Result<u32, SpendchartError> {
    let lower = name.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| *m == lower)
        .map(|i| (i + 1) as u32)
        .ok_or_else(|| SpendchartError::InvalidMonthName(name.to_string()))
}

/// One (description, amount) pair in the export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub description: String,
    pub amount: f64,
}

/// The normalized dataset uploaded to the job runner.
///
/// Field order is part of the canonical encoding: description first, then the
/// line items in store order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPayload {
    pub description: String,
    pub expenses: Vec<LineItem>,
}

impl ExportPayload {
    /// Canonical JSON encoding for transmission.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Queries the store and assembles the payload.
///
/// Fails with [`InvalidMonthName`](SpendchartError::InvalidMonthName) for an
/// unrecognized month and with [`NoDataFound`](SpendchartError::NoDataFound)
/// when the selection matches nothing: an empty payload is wasted cost
/// downstream, so it is a first-class error rather than an empty success.
pub async fn build(
    store: &ExpenseStore,
    category: Category,
    month: &str,
) -> Result<ExportPayload, SpendchartError> {
    let month_index = month_number(month)?;
    let expenses = store.by_category_and_month(category, month_index).await?;

    if expenses.is_empty() {
        return Err(SpendchartError::NoDataFound {
            category,
            month: month.to_string(),
        });
    }

    Ok(ExportPayload {
        description: format!("Expenses for {category} in {month}"),
        expenses: expenses
            .into_iter()
            .map(|e| LineItem {
                description: e.description,
                amount: e.amount,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewExpense;

    #[test]
    fn all_month_names_resolve_to_calendar_values() {
        let expected = [
            ("January", 1),
            ("February", 2),
            ("March", 3),
            ("April", 4),
            ("May", 5),
            ("June", 6),
            ("July", 7),
            ("August", 8),
            ("September", 9),
            ("October", 10),
            ("November", 11),
            ("December", 12),
        ];
        for (name, number) in expected {
            assert_eq!(month_number(name).unwrap(), number, "{name}");
        }
    }

    #[test]
    fn month_names_are_case_insensitive() {
        assert_eq!(month_number("january").unwrap(), 1);
        assert_eq!(month_number("JANUARY").unwrap(), 1);
        assert_eq!(month_number("dEcEmBeR").unwrap(), 12);
    }

    #[test]
    fn unknown_month_name_is_rejected() {
        for bad in ["Smarch", "Jan", "", "13", "januaryy"] {
            let err = month_number(bad).unwrap_err();
            assert!(
                matches!(err, SpendchartError::InvalidMonthName(ref s) if s == bad),
                "{bad}"
            );
        }
    }

    #[test]
    fn payload_json_has_canonical_field_order() {
        let payload = ExportPayload {
            description: "Expenses for food in January".into(),
            expenses: vec![
                LineItem {
                    description: "Groceries".into(),
                    amount: 42.5,
                },
                LineItem {
                    description: "Takeaway".into(),
                    amount: 18.0,
                },
            ],
        };
        let json = payload.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"description":"Expenses for food in January","expenses":[{"description":"Groceries","amount":42.5},{"description":"Takeaway","amount":18.0}]}"#
        );
    }

    async fn seeded_store() -> (tempfile::TempDir, ExpenseStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ExpenseStore::connect(&dir.path().join("test.db"))
            .await
            .unwrap();
        store
            .add(NewExpense {
                description: "Groceries".into(),
                category: Category::Food,
                amount: 42.5,
                date: "2025-01-15".parse().unwrap(),
            })
            .await
            .unwrap();
        store
            .add(NewExpense {
                description: "Takeaway".into(),
                category: Category::Food,
                amount: 18.0,
                date: "2025-01-20".parse().unwrap(),
            })
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn build_interpolates_category_and_month() {
        let (_dir, store) = seeded_store().await;
        let payload = build(&store, Category::Food, "January").await.unwrap();
        assert_eq!(payload.description, "Expenses for food in January");
        assert_eq!(payload.expenses.len(), 2);
        assert_eq!(payload.expenses[0].description, "Groceries");
        assert_eq!(payload.expenses[1].description, "Takeaway");
    }

    #[tokio::test]
    async fn build_fails_with_no_data_found() {
        let (_dir, store) = seeded_store().await;
        let err = build(&store, Category::Food, "March").await.unwrap_err();
        assert!(matches!(
            err,
            SpendchartError::NoDataFound {
                category: Category::Food,
                ref month
            } if month == "March"
        ));
    }

    #[tokio::test]
    async fn build_rejects_bad_month_before_querying() {
        let (_dir, store) = seeded_store().await;
        let err = build(&store, Category::Food, "Frimaire").await.unwrap_err();
        assert!(matches!(err, SpendchartError::InvalidMonthName(_)));
    }
}
