use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;

use super::store::{InventoryStore, InventoryTxn, Participant, Prize};
use crate::entities::{
    draw_record_entity as records, participant_entity as participants, prize_entity as prizes,
};
use crate::error::AppResult;

/// 基于 sea-orm 连接池的 PostgreSQL 库存存储
#[derive(Clone)]
pub struct SeaOrmStore {
    pool: Arc<DatabaseConnection>,
}

impl SeaOrmStore {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for SeaOrmStore {
    async fn begin(&self) -> AppResult<Box<dyn InventoryTxn>> {
        let txn = self.pool.begin().await?;
        Ok(Box::new(SeaOrmTxn { txn }))
    }
}

/// 未提交就被 drop 时，DatabaseTransaction 会自动回滚并归还连接
pub struct SeaOrmTxn {
    txn: DatabaseTransaction,
}

#[async_trait]
impl InventoryTxn for SeaOrmTxn {
    async fn lock_eligible_prizes(&mut self) -> AppResult<Vec<Prize>> {
        // SELECT ... FOR UPDATE: 并发抽奖在这些行上串行
        let list = prizes::Entity::find()
            .filter(prizes::Column::RemainingQuantity.gt(0))
            .order_by_asc(prizes::Column::Id)
            .lock_exclusive()
            .all(&self.txn)
            .await?;
        Ok(list)
    }

    async fn decrement_if_positive(&mut self, prize_id: i64) -> AppResult<bool> {
        let result = prizes::Entity::update_many()
            .col_expr(
                prizes::Column::RemainingQuantity,
                Expr::col(prizes::Column::RemainingQuantity).sub(1),
            )
            .col_expr(prizes::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(prizes::Column::Id.eq(prize_id))
            .filter(prizes::Column::RemainingQuantity.gt(0))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn append_record(
        &mut self,
        participant_id: Option<i64>,
        prize: &Prize,
    ) -> AppResult<i64> {
        let record = records::ActiveModel {
            participant_id: Set(participant_id),
            prize_id: Set(prize.id),
            prize_name: Set(prize.name.clone()),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.txn)
        .await?;
        Ok(record.id)
    }

    async fn find_or_create_participant(&mut self, name: &str) -> AppResult<Participant> {
        if let Some(existing) = find_participant(&self.txn, name).await? {
            return Ok(existing);
        }

        // 同名并发插入时等待对方事务结束，冲突则忽略，随后重新读取
        participants::Entity::insert(participants::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(participants::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.txn)
        .await?;

        let participant = find_participant(&self.txn, name)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("participant {name}")))?;
        Ok(participant)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.txn.rollback().await?;
        Ok(())
    }
}

async fn find_participant(
    txn: &DatabaseTransaction,
    name: &str,
) -> Result<Option<Participant>, DbErr> {
    participants::Entity::find()
        .filter(participants::Column::Name.eq(name))
        .one(txn)
        .await
}
