//! `instances` bookkeeping for pay methods and categories.
//!
//! An expense contributes one to the counter of each label it references
//! while it is active. Every expense write is described by the references it
//! counted for before and after the write; the difference is what gets
//! applied to the labels.

use std::collections::BTreeMap;

use crate::{LabelKind, ObjectId};

/// The labels an active expense is counted against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpenseRefs {
    pub pay_method: ObjectId,
    pub category: ObjectId,
}

impl ExpenseRefs {
    pub fn get(&self, kind: LabelKind) -> ObjectId {
        match kind {
            LabelKind::PayMethod => self.pay_method,
            LabelKind::Category => self.category,
        }
    }
}

/// Counter changes for a write that moves an expense from `before` to
/// `after`. `None` means the expense did not count (missing or inactive).
///
/// The result is ordered by label id and never contains zero deltas.
pub fn counter_deltas(
    before: Option<&ExpenseRefs>,
    after: Option<&ExpenseRefs>,
) -> Vec<(ObjectId, i64)> {
    let mut deltas: BTreeMap<ObjectId, i64> = BTreeMap::new();

    if let Some(refs) = before {
        *deltas.entry(refs.pay_method).or_default() -= 1;
        *deltas.entry(refs.category).or_default() -= 1;
    }
    if let Some(refs) = after {
        *deltas.entry(refs.pay_method).or_default() += 1;
        *deltas.entry(refs.category).or_default() += 1;
    }

    deltas.into_iter().filter(|(_, delta)| *delta != 0).collect()
}
