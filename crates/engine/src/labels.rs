//! Pay methods and categories.
//!
//! Both collections have the same shape, so they share the `labels` table and
//! are told apart by `kind`. Names are unique per kind, whether the label is
//! active or not.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{EngineError, ObjectId, ResultEngine};

const MAX_NAME_LEN: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelKind {
    PayMethod,
    Category,
}

impl LabelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PayMethod => "pay_method",
            Self::Category => "category",
        }
    }

    /// Name of the collection as exposed by the API.
    pub fn collection(self) -> &'static str {
        match self {
            Self::PayMethod => "pay_methods",
            Self::Category => "categories",
        }
    }
}

impl TryFrom<&str> for LabelKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pay_method" => Ok(Self::PayMethod),
            "category" => Ok(Self::Category),
            other => Err(EngineError::InvalidReference(format!(
                "invalid label kind: {other}"
            ))),
        }
    }
}

/// A reference field of an expense and the collection it points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferenceField {
    pub field: &'static str,
    pub kind: LabelKind,
}

/// Reference schema of an expense.
pub const EXPENSE_REFERENCES: [ReferenceField; 2] = [
    ReferenceField {
        field: "pay_method",
        kind: LabelKind::PayMethod,
    },
    ReferenceField {
        field: "category",
        kind: LabelKind::Category,
    },
];

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub id: ObjectId,
    pub kind: LabelKind,
    pub name: String,
    pub active: bool,
    /// Number of active expenses referencing this label.
    pub instances: i64,
}

impl Label {
    pub fn new(kind: LabelKind, name: String, active: bool) -> Self {
        Self {
            id: ObjectId::new(),
            kind,
            name,
            active,
            instances: 0,
        }
    }
}

/// Trim and validate a label name.
pub(crate) fn normalize_name(value: &str, kind: LabelKind) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{} name must not be empty",
            kind.as_str()
        )));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(EngineError::InvalidName(format!(
            "{} name must be at most {MAX_NAME_LEN} characters",
            kind.as_str()
        )));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "labels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub name: String,
    pub active: bool,
    pub instances: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Label> for ActiveModel {
    fn from(value: &Label) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            name: ActiveValue::Set(value.name.clone()),
            active: ActiveValue::Set(value.active),
            instances: ActiveValue::Set(value.instances),
        }
    }
}

impl TryFrom<Model> for Label {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ObjectId::parse_labeled(&model.id, "label")?,
            kind: LabelKind::try_from(model.kind.as_str())?,
            name: model.name,
            active: model.active,
            instances: model.instances,
        })
    }
}
