//! Integration tests for moneyplan-core
//!
//! These tests drive the analysis and budget engines end to end against a
//! real SQLite file: record entries → analyse a month → replace a plan.

use chrono::NaiveDate;
use moneyplan_core::{
    db::Database,
    models::{
        BudgetPlan, BudgetPlanItem, Entry, EntryKind, MonthAnalysis, NewBudgetPlan,
        NewBudgetPlanItem, NewEntry, NewMonthAnalysis, Status, User,
    },
    AnalysisEngine, BudgetPlanEngine, Error, RecordStore, Result, TransactionalStore,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup_user(db: &Database, name: &str) -> User {
    db.create_user(name).unwrap().into_value().unwrap()
}

fn add_income(db: &Database, user_id: i64, title: &str, amount: f64, on: NaiveDate) -> Entry {
    db.add_entry(EntryKind::Income, user_id, &NewEntry::new(title, amount, on))
        .unwrap()
        .into_value()
        .unwrap()
}

fn add_expense(db: &Database, user_id: i64, title: &str, amount: f64, on: NaiveDate) -> Entry {
    db.add_entry(EntryKind::Expense, user_id, &NewEntry::new(title, amount, on))
        .unwrap()
        .into_value()
        .unwrap()
}

// ============================================================================
// Monthly analysis
// ============================================================================

#[test]
fn test_month_analysis_workflow() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    add_income(&db, user.id, "Salary", 100.0, date(2023, 1, 10));
    add_expense(&db, user.id, "Groceries", 40.0, date(2023, 1, 12));
    // Other months are ignored
    add_expense(&db, user.id, "Groceries", 75.0, date(2023, 2, 1));
    add_income(&db, user.id, "Salary", 500.0, date(2022, 1, 10));

    let engine = AnalysisEngine::new(&db);
    let outcome = engine.create_month_analysis(1, 2023, user.id).unwrap();
    assert_eq!(outcome.status(), Status::Success);

    let analysis = outcome.into_value().unwrap();
    assert_eq!(analysis.summary_amount, 60.0);
    assert_eq!(analysis.incomes.len(), 1);
    assert_eq!(analysis.expenses.len(), 1);
    assert_eq!((analysis.year, analysis.month), (2023, 1));

    let by_month = engine
        .get_month_analysis_by_month(1, 2023, user.id)
        .unwrap()
        .unwrap();
    assert_eq!(by_month.id, analysis.id);
    assert_eq!(by_month.summary_amount, 60.0);

    let by_id = engine.get_month_analysis(analysis.id).unwrap().unwrap();
    assert_eq!(by_id.incomes[0].title, "Salary");
    assert_eq!(by_id.expenses[0].amount, 40.0);
}

#[test]
fn test_month_analysis_unknown_user() {
    let db = Database::in_memory().unwrap();
    let engine = AnalysisEngine::new(&db);

    let outcome = engine.create_month_analysis(1, 2023, 999).unwrap();
    assert_eq!(outcome.status(), Status::NotFound);
    assert_eq!(db.get_stats().unwrap().month_analyses, 0);
}

#[test]
fn test_month_analysis_no_data() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    add_income(&db, user.id, "Salary", 100.0, date(2023, 3, 1));

    let engine = AnalysisEngine::new(&db);
    let outcome = engine.create_month_analysis(1, 2023, user.id).unwrap();
    assert_eq!(outcome.status(), Status::NoDataToMakeAnalysis);
    assert!(engine
        .get_month_analysis_by_month(1, 2023, user.id)
        .unwrap()
        .is_none());
}

#[test]
fn test_month_analysis_no_data_removes_stale_snapshot() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    let income = add_income(&db, user.id, "Salary", 100.0, date(2023, 1, 1));

    let engine = AnalysisEngine::new(&db);
    let first = engine
        .create_month_analysis(1, 2023, user.id)
        .unwrap()
        .into_value()
        .unwrap();

    db.delete_entry(EntryKind::Income, income.id).unwrap();

    let outcome = engine.create_month_analysis(1, 2023, user.id).unwrap();
    assert_eq!(outcome.status(), Status::NoDataToMakeAnalysis);
    assert!(engine.get_month_analysis(first.id).unwrap().is_none());
    assert!(engine
        .get_month_analysis_by_month(1, 2023, user.id)
        .unwrap()
        .is_none());
}

#[test]
fn test_month_analysis_replacement() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    add_income(&db, user.id, "Salary", 100.0, date(2023, 1, 10));

    let engine = AnalysisEngine::new(&db);
    let first = engine
        .create_month_analysis(1, 2023, user.id)
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(first.summary_amount, 100.0);

    add_expense(&db, user.id, "Rent", 30.0, date(2023, 1, 20));
    let second = engine
        .create_month_analysis(1, 2023, user.id)
        .unwrap()
        .into_value()
        .unwrap();

    assert_ne!(second.id, first.id);
    assert_eq!(second.summary_amount, 70.0);
    assert!(engine.get_month_analysis(first.id).unwrap().is_none());

    let all = engine.list_month_analyses(user.id).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, second.id);

    // Running again with unchanged data still yields a single row
    let third = engine
        .create_month_analysis(1, 2023, user.id)
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(third.summary_amount, 70.0);
    assert_eq!(engine.list_month_analyses(user.id).unwrap().len(), 1);
}

#[test]
fn test_month_analyses_are_scoped_per_user_and_month() {
    let db = Database::in_memory().unwrap();
    let alice = setup_user(&db, "alice");
    let bob = setup_user(&db, "bob");
    add_income(&db, alice.id, "Salary", 100.0, date(2023, 1, 10));
    add_income(&db, alice.id, "Salary", 200.0, date(2023, 2, 10));
    add_income(&db, bob.id, "Salary", 300.0, date(2023, 1, 10));

    let engine = AnalysisEngine::new(&db);
    engine.create_month_analysis(1, 2023, alice.id).unwrap();
    engine.create_month_analysis(2, 2023, alice.id).unwrap();
    let bobs = engine
        .create_month_analysis(1, 2023, bob.id)
        .unwrap()
        .into_value()
        .unwrap();

    assert_eq!(bobs.summary_amount, 300.0);
    assert_eq!(engine.list_month_analyses(alice.id).unwrap().len(), 2);
    assert_eq!(engine.list_month_analyses(bob.id).unwrap().len(), 1);

    // Re-running Alice's January leaves Bob's January alone
    engine.create_month_analysis(1, 2023, alice.id).unwrap();
    assert!(engine.get_month_analysis(bobs.id).unwrap().is_some());
}

#[test]
fn test_month_analysis_lookups_for_missing_rows() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    add_income(&db, user.id, "Salary", 100.0, date(2023, 1, 10));

    let engine = AnalysisEngine::new(&db);
    engine.create_month_analysis(1, 2023, user.id).unwrap();

    assert!(engine.get_month_analysis(9999).unwrap().is_none());
    assert!(engine
        .get_month_analysis_by_month(1, 2023, 9999)
        .unwrap()
        .is_none());
    assert!(engine
        .get_month_analysis_by_month(2, 2023, user.id)
        .unwrap()
        .is_none());
}

#[test]
fn test_out_of_range_month_finds_no_data() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    add_income(&db, user.id, "Salary", 100.0, date(2023, 1, 10));

    let engine = AnalysisEngine::new(&db);
    let outcome = engine.create_month_analysis(13, 2023, user.id).unwrap();
    assert_eq!(outcome.status(), Status::NoDataToMakeAnalysis);
}

#[test]
fn test_month_analysis_beyond_year_9999() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    add_income(&db, user.id, "Salary", 100.0, date(10000, 1, 15));
    add_expense(&db, user.id, "Rent", 30.0, date(10000, 1, 20));
    add_income(&db, user.id, "Salary", 500.0, date(9999, 1, 15));

    let engine = AnalysisEngine::new(&db);
    let outcome = engine.create_month_analysis(1, 10000, user.id).unwrap();
    assert_eq!(outcome.status(), Status::Success);

    let analysis = outcome.into_value().unwrap();
    assert_eq!(analysis.summary_amount, 70.0);
    assert_eq!(analysis.incomes.len(), 1);
    assert_eq!(analysis.incomes[0].date, date(10000, 1, 15));

    let stored = engine
        .get_month_analysis_by_month(1, 10000, user.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, analysis.id);
    assert_eq!(stored.expenses.len(), 1);
}

#[test]
fn test_concurrent_month_analysis_keeps_one_row() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    add_income(&db, user.id, "Salary", 100.0, date(2023, 1, 10));
    add_expense(&db, user.id, "Food", 25.0, date(2023, 1, 11));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = db.clone();
            let user_id = user.id;
            std::thread::spawn(move || {
                let engine = AnalysisEngine::new(&db);
                engine.create_month_analysis(1, 2023, user_id).unwrap().status()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Status::Success);
    }

    let engine = AnalysisEngine::new(&db);
    let all = engine.list_month_analyses(user.id).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].summary_amount, 75.0);
}

// ============================================================================
// Fault injection
// ============================================================================

/// Delegates to the wrapped store but fails every analysis insert
struct FailingInserts<'a> {
    inner: &'a dyn RecordStore,
}

impl RecordStore for FailingInserts<'_> {
    fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        self.inner.find_user(user_id)
    }

    fn list_entries(
        &self,
        kind: EntryKind,
        user_id: i64,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<Entry>> {
        self.inner.list_entries(kind, user_id, year, month)
    }

    fn find_month_analysis(&self, id: i64) -> Result<Option<MonthAnalysis>> {
        self.inner.find_month_analysis(id)
    }

    fn find_month_analyses_by_key(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<MonthAnalysis>> {
        self.inner.find_month_analyses_by_key(user_id, year, month)
    }

    fn list_month_analyses(&self, user_id: i64) -> Result<Vec<MonthAnalysis>> {
        self.inner.list_month_analyses(user_id)
    }

    fn delete_month_analyses(&self, analyses: &[MonthAnalysis]) -> Result<()> {
        self.inner.delete_month_analyses(analyses)
    }

    fn insert_month_analysis(&self, _analysis: NewMonthAnalysis) -> Result<MonthAnalysis> {
        Err(Error::InvalidData("injected insert failure".to_string()))
    }

    fn find_budget_plan(&self, id: i64) -> Result<Option<BudgetPlan>> {
        self.inner.find_budget_plan(id)
    }

    fn find_budget_plan_by_user(&self, user_id: i64) -> Result<Option<BudgetPlan>> {
        self.inner.find_budget_plan_by_user(user_id)
    }

    fn delete_budget_plan_items(&self, items: &[BudgetPlanItem]) -> Result<()> {
        self.inner.delete_budget_plan_items(items)
    }

    fn delete_budget_plan(&self, plan: &BudgetPlan) -> Result<()> {
        self.inner.delete_budget_plan(plan)
    }

    fn insert_budget_plan(&self, user_id: i64, plan: &NewBudgetPlan) -> Result<BudgetPlan> {
        self.inner.insert_budget_plan(user_id, plan)
    }

    fn insert_budget_plan_item(
        &self,
        budget_plan_id: i64,
        item: &NewBudgetPlanItem,
    ) -> Result<BudgetPlanItem> {
        if item.title == "Explode" {
            return Err(Error::InvalidData("injected item failure".to_string()));
        }
        self.inner.insert_budget_plan_item(budget_plan_id, item)
    }

    fn record_audit(
        &self,
        action: &str,
        entity_type: &str,
        entity_id: Option<i64>,
        details: Option<&str>,
    ) -> Result<i64> {
        self.inner.record_audit(action, entity_type, entity_id, details)
    }
}

struct FaultyDatabase {
    db: Database,
}

impl TransactionalStore for FaultyDatabase {
    fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn RecordStore) -> Result<T>,
    {
        self.db
            .with_transaction(|store| f(&FailingInserts { inner: store }))
    }

    fn with_snapshot<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn RecordStore) -> Result<T>,
    {
        self.db.with_snapshot(f)
    }
}

#[test]
fn test_failed_replacement_keeps_previous_analysis() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    add_income(&db, user.id, "Salary", 100.0, date(2023, 1, 10));

    let previous = AnalysisEngine::new(&db)
        .create_month_analysis(1, 2023, user.id)
        .unwrap()
        .into_value()
        .unwrap();

    add_expense(&db, user.id, "Rent", 30.0, date(2023, 1, 20));
    let faulty = FaultyDatabase { db: db.clone() };
    let result = AnalysisEngine::new(&faulty).create_month_analysis(1, 2023, user.id);
    assert!(result.is_err());

    // The delete of the old snapshot was rolled back with the failed insert
    let engine = AnalysisEngine::new(&db);
    let current = engine
        .get_month_analysis_by_month(1, 2023, user.id)
        .unwrap()
        .unwrap();
    assert_eq!(current.id, previous.id);
    assert_eq!(current.summary_amount, 100.0);
    assert_eq!(current.incomes.len(), 1);
}

#[test]
fn test_failed_plan_replacement_keeps_previous_plan() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");

    let previous = BudgetPlanEngine::new(&db)
        .create_budget_plan(
            NewBudgetPlan { summary_amount: -1000.0 },
            vec![NewBudgetPlanItem::expense("Rent", 1000.0)],
            user.id,
        )
        .unwrap()
        .into_value()
        .unwrap();

    let faulty = FaultyDatabase { db: db.clone() };
    let result = BudgetPlanEngine::new(&faulty).create_budget_plan(
        NewBudgetPlan::default(),
        vec![
            NewBudgetPlanItem::income("Salary", 3000.0),
            NewBudgetPlanItem::expense("Explode", 10.0),
        ],
        user.id,
    );
    assert!(result.is_err());

    let current = BudgetPlanEngine::new(&db)
        .get_user_budget_plan(user.id)
        .unwrap()
        .unwrap();
    assert_eq!(current.id, previous.id);
    assert_eq!(current.items.len(), 1);
    assert_eq!(current.items[0].title, "Rent");
}

// ============================================================================
// Budget plans
// ============================================================================

#[test]
fn test_budget_plan_create_and_fetch() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    let engine = BudgetPlanEngine::new(&db);

    let items = vec![
        NewBudgetPlanItem::income("Salary", 3000.0),
        NewBudgetPlanItem::expense("Rent", 1200.0),
        NewBudgetPlanItem::expense("Groceries", 50.5),
    ];
    let plan = engine
        .create_budget_plan(NewBudgetPlan { summary_amount: 1749.5 }, items, user.id)
        .unwrap()
        .into_value()
        .unwrap();

    assert_eq!(plan.user_id, user.id);
    assert_eq!(plan.items.len(), 3);
    assert_eq!(plan.summary_amount, 1749.5);
    assert_eq!(plan.net_of_items(), 1749.5);
    assert!(plan.items.iter().all(|item| item.budget_plan_id == plan.id));

    let fetched = engine.get_budget_plan(plan.id).unwrap().unwrap();
    assert_eq!(fetched.items.len(), 3);
    assert!(fetched.items[0].is_income);
    assert_eq!(fetched.items[2].title, "Groceries");

    let by_user = engine.get_user_budget_plan(user.id).unwrap().unwrap();
    assert_eq!(by_user.id, plan.id);
}

#[test]
fn test_budget_plan_replacement() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    let engine = BudgetPlanEngine::new(&db);

    let first = engine
        .create_budget_plan(
            NewBudgetPlan::default(),
            vec![NewBudgetPlanItem::expense("Rent", 1000.0)],
            user.id,
        )
        .unwrap()
        .into_value()
        .unwrap();

    let second = engine
        .create_budget_plan(
            NewBudgetPlan::default(),
            vec![NewBudgetPlanItem::income("Salary", 3000.0)],
            user.id,
        )
        .unwrap()
        .into_value()
        .unwrap();

    assert_ne!(second.id, first.id);
    assert!(engine.get_budget_plan(first.id).unwrap().is_none());

    let current = engine.get_user_budget_plan(user.id).unwrap().unwrap();
    assert_eq!(current.id, second.id);
    assert_eq!(current.items.len(), 1);
    assert_eq!(current.items[0].title, "Salary");
    assert!(current.items[0].is_income);

    let stats = db.get_stats().unwrap();
    assert_eq!(stats.budget_plans, 1);

    let conn = db.conn().unwrap();
    let orphaned: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM budget_plan_items WHERE budget_plan_id = ?",
            [first.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphaned, 0);
}

#[test]
fn test_budget_plan_with_no_items() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    let engine = BudgetPlanEngine::new(&db);

    let plan = engine
        .create_budget_plan(NewBudgetPlan::default(), Vec::new(), user.id)
        .unwrap()
        .into_value()
        .unwrap();
    assert!(plan.items.is_empty());
    assert_eq!(plan.summary_amount, 0.0);
}

#[test]
fn test_budget_plan_rejections_leave_existing_plan() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    let engine = BudgetPlanEngine::new(&db);

    let existing = engine
        .create_budget_plan(
            NewBudgetPlan::default(),
            vec![NewBudgetPlanItem::expense("Rent", 1000.0)],
            user.id,
        )
        .unwrap()
        .into_value()
        .unwrap();

    let short_title = engine
        .create_budget_plan(
            NewBudgetPlan::default(),
            vec![
                NewBudgetPlanItem::income("Salary", 3000.0),
                NewBudgetPlanItem::expense("X", 10.0),
            ],
            user.id,
        )
        .unwrap();
    assert_eq!(short_title.status(), Status::InvalidAmountOfCharacters);

    let long_title = engine
        .create_budget_plan(
            NewBudgetPlan::default(),
            vec![NewBudgetPlanItem::expense("x".repeat(51), 10.0)],
            user.id,
        )
        .unwrap();
    assert_eq!(long_title.status(), Status::InvalidAmountOfCharacters);

    let tiny_amount = engine
        .create_budget_plan(
            NewBudgetPlan::default(),
            vec![NewBudgetPlanItem::expense("Coffee", 0.99)],
            user.id,
        )
        .unwrap();
    assert_eq!(tiny_amount.status(), Status::InvalidAmount);

    let huge_amount = engine
        .create_budget_plan(
            NewBudgetPlan::default(),
            vec![NewBudgetPlanItem::income("Lottery", 10_000_000.01)],
            user.id,
        )
        .unwrap();
    assert_eq!(huge_amount.status(), Status::InvalidAmount);

    let current = engine.get_user_budget_plan(user.id).unwrap().unwrap();
    assert_eq!(current.id, existing.id);
    assert_eq!(current.items.len(), 1);
    assert_eq!(current.items[0].title, "Rent");
}

#[test]
fn test_budget_plan_boundaries_accepted() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    let engine = BudgetPlanEngine::new(&db);

    let outcome = engine
        .create_budget_plan(
            NewBudgetPlan::default(),
            vec![
                NewBudgetPlanItem::expense("Ok", 1.0),
                NewBudgetPlanItem::income("x".repeat(50), 10_000_000.0),
            ],
            user.id,
        )
        .unwrap();
    assert_eq!(outcome.status(), Status::Success);
}

#[test]
fn test_budget_plan_unknown_user() {
    let db = Database::in_memory().unwrap();
    let engine = BudgetPlanEngine::new(&db);

    let outcome = engine
        .create_budget_plan(
            NewBudgetPlan::default(),
            vec![NewBudgetPlanItem::expense("Rent", 1000.0)],
            404,
        )
        .unwrap();
    assert_eq!(outcome.status(), Status::NotFound);
    assert!(engine.get_user_budget_plan(404).unwrap().is_none());
    assert!(engine.get_budget_plan(1).unwrap().is_none());
}

#[test]
fn test_replacements_are_audited() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    add_income(&db, user.id, "Salary", 100.0, date(2023, 1, 10));

    let analyses = AnalysisEngine::new(&db);
    analyses.create_month_analysis(1, 2023, user.id).unwrap();
    analyses.create_month_analysis(1, 2023, user.id).unwrap();

    let actions: Vec<String> = db
        .list_audit_log(10)
        .unwrap()
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(
        actions.iter().filter(|a| *a == "month_analysis.created").count(),
        2
    );
    assert_eq!(
        actions.iter().filter(|a| *a == "month_analysis.replaced").count(),
        1
    );
}

#[test]
fn test_stale_analysis_dropped_without_data_is_audited_as_deleted() {
    let db = Database::in_memory().unwrap();
    let user = setup_user(&db, "alice");
    let income = add_income(&db, user.id, "Salary", 100.0, date(2023, 1, 10));

    let analyses = AnalysisEngine::new(&db);
    let first = analyses
        .create_month_analysis(1, 2023, user.id)
        .unwrap()
        .into_value()
        .unwrap();
    db.delete_entry(EntryKind::Income, income.id).unwrap();

    let outcome = analyses.create_month_analysis(1, 2023, user.id).unwrap();
    assert_eq!(outcome.status(), Status::NoDataToMakeAnalysis);

    let log = db.list_audit_log(10).unwrap();
    assert_eq!(log[0].action, "month_analysis.deleted");
    assert_eq!(log[0].entity_id, Some(first.id));
    assert!(!log.iter().any(|entry| entry.action == "month_analysis.replaced"));
}
