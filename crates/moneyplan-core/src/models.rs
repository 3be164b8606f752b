//! Domain models for MoneyPlan

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Whether an entry is money coming in or going out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Table holding entries of this kind
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::Income => "incomes",
            Self::Expense => "expenses",
        }
    }

    /// Join table linking analyses to entries of this kind
    pub(crate) fn link_table(&self) -> &'static str {
        match self {
            Self::Income => "month_analysis_incomes",
            Self::Expense => "month_analysis_expenses",
        }
    }

    /// Column in the join table referencing the entry
    pub(crate) fn link_column(&self) -> &'static str {
        match self {
            Self::Income => "income_id",
            Self::Expense => "expense_id",
        }
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" | "incomes" => Ok(Self::Income),
            "expense" | "expenses" => Ok(Self::Expense),
            _ => Err(format!("Unknown entry kind: {}", s)),
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded income or expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub user_id: i64,
    pub kind: EntryKind,
    pub title: String,
    pub amount: f64,
    pub date: NaiveDate,
    /// Repeats every month (informational only)
    pub recurring: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating or editing an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub title: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub recurring: bool,
}

impl NewEntry {
    pub fn new(title: impl Into<String>, amount: f64, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            amount,
            date,
            recurring: false,
        }
    }

    pub fn recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }
}

/// Snapshot of one user's incomes and expenses for a calendar month
///
/// At most one exists per (user_id, year, month). Recomputing the month
/// deletes the previous snapshot and stores a new one under a fresh id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthAnalysis {
    pub id: i64,
    pub user_id: i64,
    pub year: i32,
    pub month: u32,
    pub incomes: Vec<Entry>,
    pub expenses: Vec<Entry>,
    /// Sum of incomes minus sum of expenses
    pub summary_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// A computed analysis that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewMonthAnalysis {
    pub user_id: i64,
    pub year: i32,
    pub month: u32,
    pub incomes: Vec<Entry>,
    pub expenses: Vec<Entry>,
    pub summary_amount: f64,
}

/// A user's budget plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlan {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<BudgetPlanItem>,
    /// Caller-supplied total, stored as given
    pub summary_amount: f64,
    pub created_at: DateTime<Utc>,
}

impl BudgetPlan {
    /// Net of the plan's items (incomes minus expenses)
    pub fn net_of_items(&self) -> f64 {
        self.items.iter().map(BudgetPlanItem::signed_amount).sum()
    }
}

/// A line in a budget plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlanItem {
    pub id: i64,
    pub budget_plan_id: i64,
    pub title: String,
    pub amount: f64,
    pub is_income: bool,
}

impl BudgetPlanItem {
    pub fn signed_amount(&self) -> f64 {
        signed(self.amount, self.is_income)
    }
}

/// Plan-level fields supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewBudgetPlan {
    pub summary_amount: f64,
}

/// A budget line supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudgetPlanItem {
    pub title: String,
    pub amount: f64,
    #[serde(default)]
    pub is_income: bool,
}

impl NewBudgetPlanItem {
    pub fn income(title: impl Into<String>, amount: f64) -> Self {
        Self {
            title: title.into(),
            amount,
            is_income: true,
        }
    }

    pub fn expense(title: impl Into<String>, amount: f64) -> Self {
        Self {
            title: title.into(),
            amount,
            is_income: false,
        }
    }

    pub fn signed_amount(&self) -> f64 {
        signed(self.amount, self.is_income)
    }
}

/// Net of a set of budget lines (incomes minus expenses)
pub fn net_of_items(items: &[NewBudgetPlanItem]) -> f64 {
    items.iter().map(NewBudgetPlanItem::signed_amount).sum()
}

fn signed(amount: f64, is_income: bool) -> f64 {
    if is_income {
        amount
    } else {
        -amount
    }
}

/// Business outcome of a core operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    NotFound,
    InvalidAmountOfCharacters,
    InvalidAmount,
    NoDataToMakeAnalysis,
    UsernameAlreadyExists,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::InvalidAmountOfCharacters => "invalid_amount_of_characters",
            Self::InvalidAmount => "invalid_amount",
            Self::NoDataToMakeAnalysis => "no_data_to_make_analysis",
            Self::UsernameAlreadyExists => "username_already_exists",
        }
    }

    /// Human-readable explanation
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not found",
            Self::InvalidAmountOfCharacters => "title must be between 2 and 50 characters",
            Self::InvalidAmount => "amount must be between 1 and 10000000",
            Self::NoDataToMakeAnalysis => "no incomes or expenses recorded for that month",
            Self::UsernameAlreadyExists => "username is already taken",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Result of an operation that can be rejected by a business rule
///
/// `Rejected` never carries `Status::Success`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ok(T),
    Rejected(Status),
}

impl<T> Outcome<T> {
    pub fn status(&self) -> Status {
        match self {
            Self::Ok(_) => Status::Success,
            Self::Rejected(status) => *status,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }
}

impl<T> From<Status> for Outcome<T> {
    fn from(status: Status) -> Self {
        Self::Rejected(status)
    }
}

/// Row counts shown by `moneyplan status`
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub users: i64,
    pub incomes: i64,
    pub expenses: i64,
    pub month_analyses: i64,
    pub budget_plans: i64,
}
