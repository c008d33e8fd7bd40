use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{
    EngineError, ResultEngine, expense_splits, expenses, group_members, groups, settlements, users,
};

use super::Engine;

/// Generates a `require_*` method that loads a row by id or fails with
/// `KeyNotFound`.
macro_rules! impl_require_by_id {
    ($require_fn:ident, $entity:path, $model:path, $err_msg:literal) => {
        pub(super) async fn $require_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            id: i64,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_by_id!(require_user, users::Entity, users::Model, "user not exists");
    impl_require_by_id!(require_group, groups::Entity, groups::Model, "group not exists");
    impl_require_by_id!(
        require_expense,
        expenses::Entity,
        expenses::Model,
        "expense not exists"
    );
    impl_require_by_id!(
        require_split,
        expense_splits::Entity,
        expense_splits::Model,
        "split not exists"
    );
    impl_require_by_id!(
        require_settlement,
        settlements::Entity,
        settlements::Model,
        "settlement not exists"
    );

    pub(super) async fn find_membership<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: i64,
        user_id: i64,
    ) -> ResultEngine<Option<group_members::Model>> {
        group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id))
            .filter(group_members::Column::UserId.eq(user_id))
            .one(db)
            .await
            .map_err(Into::into)
    }
}
