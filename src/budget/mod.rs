//! Budgets limit spending in an expense category.

mod core;
mod endpoints;

pub use core::{
    Budget, BudgetEdit, BudgetId, BudgetProgress, BudgetSummary, NewBudget, create_budget,
    create_budget_table, delete_budget, get_budget, get_budget_progress, list_budgets,
    summarize_budgets, update_budget,
};
#[cfg(test)]
pub use core::count_budgets;
pub use endpoints::{
    create_budget_endpoint, delete_budget_endpoint, edit_budget_endpoint, get_budget_endpoint,
    get_budget_progress_endpoint, list_budgets_endpoint,
};
