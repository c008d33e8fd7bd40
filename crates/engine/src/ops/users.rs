use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, ResultEngine, User, users,
    util::{normalize_email, normalize_required},
};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a new user. Emails are unique (case-insensitive).
    pub async fn register_user(&self, email: &str, name: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let name = normalize_required(name, "name")?;

        if self.find_user_by_email(&self.database, &email).await?.is_some() {
            return Err(EngineError::ExistingKey(email));
        }

        let now = Utc::now();
        let model = users::ActiveModel {
            id: ActiveValue::NotSet,
            email: ActiveValue::Set(email),
            name: ActiveValue::Set(name),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(user_id = model.id, "user registered");
        Ok(model.into())
    }

    /// Looks a user up by email. There are no credentials: this only proves
    /// the account exists.
    pub async fn login(&self, email: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        self.find_user_by_email(&self.database, &email)
            .await?
            .map(Into::into)
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub async fn user(&self, user_id: i64) -> ResultEngine<User> {
        self.require_user(&self.database, user_id)
            .await
            .map(Into::into)
    }

    pub async fn users(&self) -> ResultEngine<Vec<User>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Updates name and/or email; `None` leaves the field untouched.
    pub async fn update_user(
        &self,
        user_id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> ResultEngine<User> {
        let name = name.map(|n| normalize_required(n, "name")).transpose()?;
        let email = email.map(normalize_email).transpose()?;

        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            if let Some(email) = email.as_deref()
                && let Some(other) = self.find_user_by_email(&db_tx, email).await?
                && other.id != user_id
            {
                return Err(EngineError::ExistingKey(email.to_string()));
            }

            let mut active: users::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(email) = email {
                active.email = ActiveValue::Set(email);
            }
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;
            Ok(User::from(model))
        })
    }

    /// Deletes a user together with the groups they created and every ledger
    /// row that references them.
    pub async fn delete_user(&self, user_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.purge_user_rows(&db_tx, user_id).await?;
            users::Entity::delete_by_id(user_id).exec(&db_tx).await?;
            Ok(())
        })?;
        tracing::info!(user_id, "user deleted");
        Ok(())
    }

    async fn find_user_by_email<C: ConnectionTrait>(
        &self,
        db: &C,
        email: &str,
    ) -> ResultEngine<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await
            .map_err(Into::into)
    }
}
