use sea_orm::DatabaseConnection;

use crate::{EngineError, MemberInclusion, ResultEngine};

mod access;
mod balances;
mod expenses;
mod groups;
mod memberships;
mod settlements;
mod splits;
mod users;

pub use memberships::MemberRef;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    member_inclusion: MemberInclusion,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: Option<DatabaseConnection>,
    member_inclusion: MemberInclusion,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = Some(db);
        self
    }

    /// Choose which users appear in group balances (default: all members).
    pub fn member_inclusion(mut self, inclusion: MemberInclusion) -> EngineBuilder {
        self.member_inclusion = inclusion;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let database = self.database.ok_or_else(|| {
            EngineError::InvalidInput("database connection is required".to_string())
        })?;
        Ok(Engine {
            database,
            member_inclusion: self.member_inclusion,
        })
    }
}
