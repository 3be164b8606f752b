//! Monthly analysis command implementations

use anyhow::{Context, Result};
use moneyplan_core::db::Database;
use moneyplan_core::models::MonthAnalysis;
use moneyplan_core::AnalysisEngine;

use super::{accept, truncate, Output};

fn print_analysis(analysis: &MonthAnalysis) {
    println!();
    println!(
        "📅 {}-{:02} for user {} (analysis #{})",
        analysis.year, analysis.month, analysis.user_id, analysis.id
    );
    println!("   ─────────────────────────────────────────────────────────────");

    println!("   Incomes:");
    for income in &analysis.incomes {
        println!(
            "     {:<10}  {:<30}  {:>12.2}",
            income.date.format("%Y-%m-%d"),
            truncate(&income.title, 30),
            income.amount
        );
    }
    println!("   Expenses:");
    for expense in &analysis.expenses {
        println!(
            "     {:<10}  {:<30}  {:>12.2}",
            expense.date.format("%Y-%m-%d"),
            truncate(&expense.title, 30),
            -expense.amount
        );
    }

    println!("   ─────────────────────────────────────────────────────────────");
    let marker = if analysis.summary_amount < 0.0 { "🔴" } else { "🟢" };
    println!(
        "   {} Balance: {:.2}",
        marker, analysis.summary_amount
    );
    println!();
}

pub fn cmd_analysis_create(
    db: &Database,
    user_id: i64,
    year: i32,
    month: u32,
    out: Output,
) -> Result<()> {
    let engine = AnalysisEngine::new(db);
    let analysis = accept(
        engine.create_month_analysis(month, year, user_id)?,
        "Month analysis",
    )?;

    out.emit(&analysis, || print_analysis(&analysis))
}

pub fn cmd_analysis_show(
    db: &Database,
    user_id: i64,
    year: i32,
    month: u32,
    out: Output,
) -> Result<()> {
    let engine = AnalysisEngine::new(db);
    let analysis = engine
        .get_month_analysis_by_month(month, year, user_id)?
        .with_context(|| {
            format!(
                "No analysis for user {} in {}-{:02}. Run 'moneyplan analysis create' first.",
                user_id, year, month
            )
        })?;

    out.emit(&analysis, || print_analysis(&analysis))
}

pub fn cmd_analysis_list(db: &Database, user_id: i64, out: Output) -> Result<()> {
    let engine = AnalysisEngine::new(db);
    let analyses = engine.list_month_analyses(user_id)?;

    out.emit(&analyses, || {
        if analyses.is_empty() {
            println!("No analyses stored for user {}.", user_id);
            return;
        }

        println!();
        println!("📅 Month analyses for user {}", user_id);
        println!("   ─────────────────────────────────────────────────────────────");
        println!(
            "   {:>5}  {:<7}  {:>7}  {:>8}  {:>12}",
            "ID", "Month", "Incomes", "Expenses", "Balance"
        );
        for analysis in &analyses {
            println!(
                "   {:>5}  {}-{:02}  {:>7}  {:>8}  {:>12.2}",
                analysis.id,
                analysis.year,
                analysis.month,
                analysis.incomes.len(),
                analysis.expenses.len(),
                analysis.summary_amount
            );
        }
        println!();
    })
}
