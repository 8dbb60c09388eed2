use std::collections::HashMap;

use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    EXPENSE_REFERENCES, EngineError, Expense, ExpenseCmd, ExpenseDetail, ExpenseFilter,
    ExpenseRefs, ExpenseUpdateCmd, Label, LabelKind, ObjectId, ResultEngine, counter_deltas,
    expenses::{self, normalize_description, validate_amount},
    installments, labels,
};

use super::{Engine, with_tx};

impl Engine {
    /// Active expenses matching `filter`, newest first.
    pub async fn list_expenses(&self, filter: &ExpenseFilter) -> ResultEngine<Vec<ExpenseDetail>> {
        let mut query = expenses::Entity::find().filter(expenses::Column::Active.eq(true));
        if let Some(amount) = filter.amount {
            query = query.filter(expenses::Column::Amount.eq(amount));
        }
        if let Some(pay_method) = filter.pay_method {
            query = query.filter(expenses::Column::PayMethodId.eq(pay_method.to_string()));
        }
        if let Some(category) = filter.category {
            query = query.filter(expenses::Column::CategoryId.eq(category.to_string()));
        }
        query = query
            .order_by_desc(expenses::Column::Timestamp)
            .order_by_asc(expenses::Column::Id);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let expenses = query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        self.attach_labels(&self.database, expenses).await
    }

    pub async fn expense(&self, id: ObjectId) -> ResultEngine<ExpenseDetail> {
        let expense = self.require_active_expense(&self.database, id).await?;
        self.detail(&self.database, expense).await
    }

    /// Writes one expense per installment, oldest first.
    ///
    /// Every installment is committed on its own together with its counter
    /// updates. If a later installment fails the ones already written stay.
    pub async fn create_expense(&self, cmd: ExpenseCmd) -> ResultEngine<Vec<ExpenseDetail>> {
        let amount = validate_amount(cmd.amount)?;
        let description = normalize_description(cmd.description.as_deref())?;
        let plan = installments::split(amount, cmd.payments, cmd.timestamp)?;
        let refs = ExpenseRefs {
            pay_method: cmd.pay_method,
            category: cmd.category,
        };

        let mut created = Vec::with_capacity(plan.len());
        for installment in plan {
            let expense = Expense {
                id: ObjectId::new(),
                amount: installment.amount,
                description: description.clone(),
                pay_method: refs.pay_method,
                category: refs.category,
                timestamp: installment.timestamp,
                active: cmd.active,
                one_time: cmd.one_time,
            };

            let detail = with_tx!(self, |db_tx| {
                self.require_references(&db_tx, &refs, None).await?;
                expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
                let deltas = counter_deltas(None, expense.counted_refs().as_ref());
                self.apply_counter_deltas(&db_tx, &deltas).await?;
                self.detail(&db_tx, expense).await
            })?;
            created.push(detail);
        }

        tracing::debug!(count = created.len(), "expenses created");
        Ok(created)
    }

    /// Applies a partial update. Counters follow reference changes and
    /// the `active` flag.
    pub async fn update_expense(
        &self,
        id: ObjectId,
        cmd: ExpenseUpdateCmd,
    ) -> ResultEngine<ExpenseDetail> {
        let amount = cmd.amount.map(validate_amount).transpose()?;
        let description = cmd
            .description
            .as_deref()
            .map(|value| normalize_description(Some(value)))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let before = self.require_active_expense(&db_tx, id).await?;
            if cmd.is_empty() {
                return self.detail(&db_tx, before).await;
            }

            let mut after = before.clone();
            if let Some(amount) = amount {
                after.amount = amount;
            }
            if let Some(description) = description {
                after.description = description;
            }
            if let Some(pay_method) = cmd.pay_method {
                after.pay_method = pay_method;
            }
            if let Some(category) = cmd.category {
                after.category = category;
            }
            if let Some(timestamp) = cmd.timestamp {
                after.timestamp = timestamp;
            }
            if let Some(active) = cmd.active {
                after.active = active;
            }
            if let Some(one_time) = cmd.one_time {
                after.one_time = one_time;
            }

            self.require_references(&db_tx, &after.refs(), Some(&before.refs()))
                .await?;
            expenses::ActiveModel::from(&after).update(&db_tx).await?;
            let deltas = counter_deltas(
                before.counted_refs().as_ref(),
                after.counted_refs().as_ref(),
            );
            self.apply_counter_deltas(&db_tx, &deltas).await?;
            self.detail(&db_tx, after).await
        })
    }

    /// Soft delete, releasing the expense's counters.
    pub async fn delete_expense(&self, id: ObjectId) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let before = self.require_active_expense(&db_tx, id).await?;
            let model = expenses::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                active: ActiveValue::Set(false),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            let deltas = counter_deltas(before.counted_refs().as_ref(), None);
            self.apply_counter_deltas(&db_tx, &deltas).await?;
            tracing::debug!(%id, "expense deleted");
            Ok(())
        })
    }

    async fn require_active_expense<C: ConnectionTrait>(
        &self,
        db: &C,
        id: ObjectId,
    ) -> ResultEngine<Expense> {
        let model = expenses::Entity::find_by_id(id.to_string())
            .filter(expenses::Column::Active.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        Expense::try_from(model)
    }

    /// Every reference must point at an active label of the right kind.
    /// References equal to the ones in `current` were already accepted and
    /// are not checked again, so an expense may keep a label that was
    /// deactivated after the fact.
    async fn require_references<C: ConnectionTrait>(
        &self,
        db: &C,
        refs: &ExpenseRefs,
        current: Option<&ExpenseRefs>,
    ) -> ResultEngine<()> {
        for reference in EXPENSE_REFERENCES {
            let id = refs.get(reference.kind);
            if current.is_some_and(|current| current.get(reference.kind) == id) {
                continue;
            }

            match self.require_active_label(db, reference.kind, id).await {
                Ok(_) => {}
                Err(EngineError::KeyNotFound(_)) => {
                    return Err(EngineError::InvalidReference(format!(
                        "{} {id} not exists in {}",
                        reference.field,
                        reference.kind.collection()
                    )));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Applies `instances = instances + delta` for each label.
    ///
    /// A counter ending below zero fails the whole write.
    async fn apply_counter_deltas<C: ConnectionTrait>(
        &self,
        db: &C,
        deltas: &[(ObjectId, i64)],
    ) -> ResultEngine<()> {
        for (label_id, delta) in deltas {
            let result = labels::Entity::update_many()
                .col_expr(
                    labels::Column::Instances,
                    Expr::col(labels::Column::Instances).add(*delta),
                )
                .filter(labels::Column::Id.eq(label_id.to_string()))
                .exec(db)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(format!("label {label_id} not exists")));
            }
            if *delta >= 0 {
                continue;
            }

            let model = labels::Entity::find_by_id(label_id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("label {label_id} not exists")))?;
            if model.instances < 0 {
                tracing::error!(label = %label_id, instances = model.instances, "instances counter below zero");
                return Err(EngineError::CounterUnderflow(format!(
                    "{} {} would have {} instances",
                    model.kind, model.name, model.instances
                )));
            }
        }
        Ok(())
    }

    async fn detail<C: ConnectionTrait>(
        &self,
        db: &C,
        expense: Expense,
    ) -> ResultEngine<ExpenseDetail> {
        let id = expense.id;
        self.attach_labels(db, vec![expense])
            .await?
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound(format!("expense {id} not exists")))
    }

    /// Resolves the referenced labels of many expenses with one query.
    /// Inactive labels are resolved too.
    async fn attach_labels<C: ConnectionTrait>(
        &self,
        db: &C,
        expenses: Vec<Expense>,
    ) -> ResultEngine<Vec<ExpenseDetail>> {
        if expenses.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<String> = expenses
            .iter()
            .flat_map(|expense| [expense.pay_method.to_string(), expense.category.to_string()])
            .collect();
        ids.sort();
        ids.dedup();

        let labels: HashMap<ObjectId, Label> = labels::Entity::find()
            .filter(labels::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|model| Label::try_from(model).map(|label| (label.id, label)))
            .collect::<ResultEngine<_>>()?;

        let lookup = |id: ObjectId, kind: LabelKind| {
            labels
                .get(&id)
                .filter(|label| label.kind == kind)
                .cloned()
                .ok_or_else(|| EngineError::KeyNotFound(format!("{} {id} not exists", kind.as_str())))
        };

        expenses
            .into_iter()
            .map(|expense| -> ResultEngine<ExpenseDetail> {
                Ok(ExpenseDetail {
                    pay_method: lookup(expense.pay_method, LabelKind::PayMethod)?,
                    category: lookup(expense.category, LabelKind::Category)?,
                    expense,
                })
            })
            .collect()
    }
}
