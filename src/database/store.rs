//! 抽奖引擎使用的库存存储接口
//!
//! 一次抽奖的所有读写都经过同一个 [`InventoryTxn`]，在 [`InventoryTxn::commit`]
//! 之前对其它抽奖不可见。未提交就 drop 的事务会回滚，请求中途断开不会留下部分写入。

use async_trait::async_trait;

use crate::entities::{
    draw_record_entity as records, participant_entity as participants, prize_entity as prizes,
};
use crate::error::AppResult;

pub type Prize = prizes::Model;
pub type Participant = participants::Model;
pub type DrawRecord = records::Model;

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// 开启事务，事务结束前独占一个连接池连接
    async fn begin(&self) -> AppResult<Box<dyn InventoryTxn>>;
}

#[async_trait]
pub trait InventoryTxn: Send {
    /// 读取 remaining_quantity > 0 的奖品（按 id 排序），行锁持续到事务结束
    async fn lock_eligible_prizes(&mut self) -> AppResult<Vec<Prize>>;

    /// 库存仍大于 0 时扣减 1；条件不满足返回 false（不是错误）
    async fn decrement_if_positive(&mut self, prize_id: i64) -> AppResult<bool>;

    /// 追加抽奖记录，返回记录ID
    async fn append_record(
        &mut self,
        participant_id: Option<i64>,
        prize: &Prize,
    ) -> AppResult<i64>;

    async fn find_or_create_participant(&mut self, name: &str) -> AppResult<Participant>;

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
