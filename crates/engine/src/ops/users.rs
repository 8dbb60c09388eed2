use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, ObjectId, ResultEngine, User,
    users::{self, hash_password, new_salt},
};

use super::{Engine, unique_violation, with_tx};

fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(EngineError::InvalidField(format!("invalid email: {value}")));
    }
    Ok(email)
}

impl Engine {
    pub async fn create_user(&self, email: &str, password: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(EngineError::InvalidField(
                "password must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let existing = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(email));
            }

            let id = ObjectId::new();
            let salt = new_salt();
            let model = users::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                email: ActiveValue::Set(email.clone()),
                password_hash: ActiveValue::Set(hash_password(&salt, password)),
                salt: ActiveValue::Set(salt),
            };
            model
                .insert(&db_tx)
                .await
                .map_err(|err| unique_violation(err, &email))?;
            tracing::info!(%id, "user created");
            Ok(User { id, email })
        })
    }

    /// `None` when the email is unknown or the password does not match.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<Option<User>> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?;

        match model {
            Some(model) if model.password_matches(password) => Ok(Some(User::try_from(model)?)),
            _ => Ok(None),
        }
    }

    pub async fn user(&self, id: ObjectId) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
        User::try_from(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_lowercased_and_trimmed() {
        assert_eq!(normalize_email(" Me@Example.com ").unwrap(), "me@example.com");
    }

    #[test]
    #[should_panic(expected = "InvalidField(\"invalid email: nobody\")")]
    fn email_needs_at_sign() {
        normalize_email("nobody").unwrap();
    }
}
