//! Users table.
//!
//! Passwords are stored as a salted SHA-256 digest; the salt is random per
//! user.

use sea_orm::entity::prelude::*;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{EngineError, ObjectId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: ObjectId,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ObjectId::parse_labeled(&model.id, "user")?,
            email: model.email,
        })
    }
}

pub(crate) fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

pub(crate) fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

impl Model {
    pub(crate) fn password_matches(&self, password: &str) -> bool {
        let candidate = hash_password(&self.salt, password);
        candidate
            .as_bytes()
            .ct_eq(self.password_hash.as_bytes())
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(password: &str) -> Model {
        let salt = new_salt();
        Model {
            id: ObjectId::new().to_string(),
            email: "me@example.com".to_string(),
            password_hash: hash_password(&salt, password),
            salt,
        }
    }

    #[test]
    fn hash_is_salted() {
        assert_ne!(hash_password("a", "secret"), hash_password("b", "secret"));
        assert_eq!(hash_password("a", "secret").len(), 64);
    }

    #[test]
    fn password_matches_only_the_right_password() {
        let model = model("secret");
        assert!(model.password_matches("secret"));
        assert!(!model.password_matches("Secret"));
        assert!(!model.password_matches(""));
    }
}
