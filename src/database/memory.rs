//! 测试用内存库存
//!
//! 所有数据在同一个异步锁之后。事务从 begin 起持有锁直到结束，并发抽奖因此串行，
//! 效果与 PostgreSQL 行锁一致。写入先落在副本上，提交时才替换共享状态。

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::store::{DrawRecord, InventoryStore, InventoryTxn, Participant, Prize};
use crate::error::{AppError, AppResult};
use sea_orm::DbErr;

/// 故障注入点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// 锁定奖品后写记录失败
    AppendRecord,
    /// 条件扣减前库存已被其它写入清空
    ExhaustBeforeDecrement,
    /// 提交失败
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    prizes: BTreeMap<i64, Prize>,
    participants: Vec<Participant>,
    records: Vec<DrawRecord>,
}

#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fault: Arc<StdMutex<Option<FaultPoint>>>,
}

impl MemoryStore {
    pub fn new(prizes: Vec<Prize>) -> Self {
        let state = MemoryState {
            prizes: prizes.into_iter().map(|p| (p.id, p)).collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            fault: Arc::new(StdMutex::new(None)),
        }
    }

    /// 设置（或清除）之后所有事务的故障注入点
    pub fn set_fault(&self, fault: Option<FaultPoint>) {
        if let Ok(mut slot) = self.fault.lock() {
            *slot = fault;
        }
    }

    pub async fn prizes(&self) -> Vec<Prize> {
        self.state.lock().await.prizes.values().cloned().collect()
    }

    pub async fn records(&self) -> Vec<DrawRecord> {
        self.state.lock().await.records.clone()
    }

    pub async fn participants(&self) -> Vec<Participant> {
        self.state.lock().await.participants.clone()
    }

    fn current_fault(&self) -> Option<FaultPoint> {
        self.fault.lock().ok().and_then(|slot| *slot)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn InventoryTxn>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTxn {
            guard,
            working,
            fault: self.current_fault(),
        }))
    }
}

pub struct MemoryTxn {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fault: Option<FaultPoint>,
}

impl MemoryTxn {
    fn injected(&self, point: FaultPoint) -> AppResult<()> {
        if self.fault == Some(point) {
            return Err(AppError::PersistenceFailure(DbErr::Custom(format!(
                "injected fault at {point:?}"
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryTxn for MemoryTxn {
    async fn lock_eligible_prizes(&mut self) -> AppResult<Vec<Prize>> {
        Ok(self
            .working
            .prizes
            .values()
            .filter(|p| p.is_eligible())
            .cloned()
            .collect())
    }

    async fn decrement_if_positive(&mut self, prize_id: i64) -> AppResult<bool> {
        if self.fault == Some(FaultPoint::ExhaustBeforeDecrement)
            && let Some(prize) = self.working.prizes.get_mut(&prize_id)
        {
            prize.remaining_quantity = 0;
        }

        match self.working.prizes.get_mut(&prize_id) {
            Some(prize) if prize.remaining_quantity > 0 => {
                prize.remaining_quantity -= 1;
                prize.updated_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_record(
        &mut self,
        participant_id: Option<i64>,
        prize: &Prize,
    ) -> AppResult<i64> {
        self.injected(FaultPoint::AppendRecord)?;

        let id = self.working.records.last().map_or(1, |r| r.id + 1);
        self.working.records.push(DrawRecord {
            id,
            participant_id,
            prize_id: prize.id,
            prize_name: prize.name.clone(),
            created_at: Some(Utc::now()),
        });
        Ok(id)
    }

    async fn find_or_create_participant(&mut self, name: &str) -> AppResult<Participant> {
        if let Some(existing) = self.working.participants.iter().find(|p| p.name == name) {
            return Ok(existing.clone());
        }

        let participant = Participant {
            id: self.working.participants.last().map_or(1, |p| p.id + 1),
            name: name.to_string(),
            created_at: Some(Utc::now()),
        };
        self.working.participants.push(participant.clone());
        Ok(participant)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.injected(FaultPoint::Commit)?;

        let MemoryTxn {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prize(id: i64, remaining: i64) -> Prize {
        Prize {
            id,
            name: format!("prize-{id}"),
            color: None,
            total_quantity: 5,
            remaining_quantity: remaining,
            weight: 1.0,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_lock_returns_only_eligible_prizes_in_id_order() {
        let store = MemoryStore::new(vec![prize(3, 1), prize(1, 0), prize(2, 4)]);
        let mut txn = store.begin().await.unwrap();
        let ids: Vec<i64> = txn
            .lock_eligible_prizes()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new(vec![prize(1, 2)]);
        {
            let mut txn = store.begin().await.unwrap();
            let p = txn.lock_eligible_prizes().await.unwrap().remove(0);
            txn.find_or_create_participant("alice").await.unwrap();
            txn.append_record(None, &p).await.unwrap();
            assert!(txn.decrement_if_positive(1).await.unwrap());
        }

        assert_eq!(store.prizes().await[0].remaining_quantity, 2);
        assert!(store.records().await.is_empty());
        assert!(store.participants().await.is_empty());
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new(vec![prize(1, 1)]);
        let mut txn = store.begin().await.unwrap();
        let p = txn.lock_eligible_prizes().await.unwrap().remove(0);
        let alice = txn.find_or_create_participant("alice").await.unwrap();
        let again = txn.find_or_create_participant("alice").await.unwrap();
        assert_eq!(alice.id, again.id);

        txn.append_record(Some(alice.id), &p).await.unwrap();
        assert!(txn.decrement_if_positive(1).await.unwrap());
        assert!(!txn.decrement_if_positive(1).await.unwrap());
        txn.commit().await.unwrap();

        assert_eq!(store.prizes().await[0].remaining_quantity, 0);
        assert_eq!(store.records().await.len(), 1);
        assert_eq!(store.participants().await.len(), 1);
    }
}
