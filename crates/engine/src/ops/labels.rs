use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, Label, LabelKind, ObjectId, ResultEngine,
    labels::{self, normalize_name},
};

use super::{Engine, unique_violation, with_tx};

impl Engine {
    /// Lists active labels of `kind`, most referenced first.
    pub async fn list_labels(&self, kind: LabelKind, limit: Option<u64>) -> ResultEngine<Vec<Label>> {
        let mut query = labels::Entity::find()
            .filter(labels::Column::Kind.eq(kind.as_str()))
            .filter(labels::Column::Active.eq(true))
            .order_by_desc(labels::Column::Instances)
            .order_by_asc(labels::Column::Name);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Label::try_from)
            .collect()
    }

    /// Return an active label. Soft-deleted labels are not found.
    pub async fn label(&self, kind: LabelKind, id: ObjectId) -> ResultEngine<Label> {
        let model = self.require_active_label(&self.database, kind, id).await?;
        Label::try_from(model)
    }

    /// Add a new label. The name must not be used by any label of the same
    /// kind, active or not.
    pub async fn create_label(
        &self,
        kind: LabelKind,
        name: &str,
        active: bool,
    ) -> ResultEngine<Label> {
        let name = normalize_name(name, kind)?;
        with_tx!(self, |db_tx| {
            self.ensure_unique_name(&db_tx, kind, &name, None).await?;

            let label = Label::new(kind, name, active);
            labels::ActiveModel::from(&label)
                .insert(&db_tx)
                .await
                .map_err(|err| unique_violation(err, &label.name))?;
            tracing::debug!(kind = kind.as_str(), id = %label.id, "label created");
            Ok(label)
        })
    }

    /// Renames and/or (de)activates an active label.
    pub async fn update_label(
        &self,
        kind: LabelKind,
        id: ObjectId,
        name: Option<&str>,
        active: Option<bool>,
    ) -> ResultEngine<Label> {
        let name = name.map(|name| normalize_name(name, kind)).transpose()?;
        with_tx!(self, |db_tx| {
            let current = self.require_active_label(&db_tx, kind, id).await?;
            if name.is_none() && active.is_none() {
                return Label::try_from(current);
            }

            let mut model: labels::ActiveModel = current.into();
            if let Some(name) = &name {
                self.ensure_unique_name(&db_tx, kind, name, Some(id)).await?;
                model.name = ActiveValue::Set(name.clone());
            }
            if let Some(active) = active {
                model.active = ActiveValue::Set(active);
            }

            let updated = model.update(&db_tx).await.map_err(|err| {
                unique_violation(err, name.as_deref().unwrap_or_default())
            })?;
            Label::try_from(updated)
        })
    }

    /// Soft delete: the label keeps its name reserved and its counter.
    pub async fn delete_label(&self, kind: LabelKind, id: ObjectId) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_active_label(&db_tx, kind, id).await?;
            let model = labels::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                active: ActiveValue::Set(false),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            tracing::debug!(kind = kind.as_str(), %id, "label deleted");
            Ok(())
        })
    }

    pub(super) async fn require_active_label<C: ConnectionTrait>(
        &self,
        db: &C,
        kind: LabelKind,
        id: ObjectId,
    ) -> ResultEngine<labels::Model> {
        labels::Entity::find_by_id(id.to_string())
            .filter(labels::Column::Kind.eq(kind.as_str()))
            .filter(labels::Column::Active.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("{} not exists", kind.as_str())))
    }

    async fn ensure_unique_name<C: ConnectionTrait>(
        &self,
        db: &C,
        kind: LabelKind,
        name: &str,
        exclude: Option<ObjectId>,
    ) -> ResultEngine<()> {
        let mut query = labels::Entity::find()
            .filter(labels::Column::Kind.eq(kind.as_str()))
            .filter(labels::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(labels::Column::Id.ne(id.to_string()));
        }

        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
