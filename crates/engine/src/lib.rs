pub use commands::{ExpenseCmd, ExpenseFilter, ExpenseUpdateCmd};
pub use counters::{ExpenseRefs, counter_deltas};
pub use error::EngineError;
pub use expenses::{Expense, ExpenseDetail};
pub use installments::{Installment, add_months, calc_amount};
pub use labels::{EXPENSE_REFERENCES, Label, LabelKind, ReferenceField};
pub use object_id::ObjectId;
pub use ops::{Engine, EngineBuilder};
pub use reports::{BY_CATEGORY, BY_PAY_METHOD, Chart, ChartKind, MONTHLY, table_message};
pub use users::User;

mod commands;
mod counters;
mod error;
mod expenses;
pub mod installments;
mod labels;
mod object_id;
mod ops;
mod reports;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
