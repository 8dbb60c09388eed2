use crate::{Chart, ExpenseFilter, ResultEngine, reports};

use super::Engine;

impl Engine {
    /// Charts over every active expense. No expenses, no charts.
    pub async fn charts(&self) -> ResultEngine<Vec<Chart>> {
        let expenses = self.list_expenses(&ExpenseFilter::default()).await?;
        Ok(reports::build_charts(&expenses))
    }
}
