use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

use crate::config::{LotteryConfig, ParticipantMode};
use crate::database::{InventoryStore, InventoryTxn, Prize};
use crate::error::{AppError, AppResult};
use crate::models::{DrawResponse, ParticipantResponse, PrizeResponse};

/// 参与者名称最大长度，与 participants.name 列宽一致
pub const MAX_PARTICIPANT_NAME_LEN: usize = 64;

/// 抽奖引擎
///
/// 一次抽奖是一个事务:
/// 1. 锁定所有有库存的奖品 (FOR UPDATE)
/// 2. 按 id 排序后按权重随机选择
/// 3. 查找或创建参与者
/// 4. 写抽奖记录
/// 5. 条件扣减库存 (remaining_quantity > 0)
/// 6. 提交；任一步失败整体回滚
#[derive(Clone)]
pub struct DrawService {
    store: Arc<dyn InventoryStore>,
    config: LotteryConfig,
    rng: Arc<Mutex<StdRng>>,
}

impl DrawService {
    pub fn new(store: Arc<dyn InventoryStore>, config: LotteryConfig) -> Self {
        Self {
            store,
            config,
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
        }
    }

    /// 使用固定种子，抽奖结果可复现
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub async fn draw(&self, participant_name: Option<String>) -> AppResult<DrawResponse> {
        let name = self.resolve_name(participant_name)?;

        let mut txn = self.store.begin().await?;
        let outcome = self.draw_in(txn.as_mut(), name.as_deref()).await;
        match outcome {
            Ok(Some(result)) => {
                txn.commit().await?;
                log::info!(
                    "Draw committed: record={} prize={} remaining={} participant={:?}",
                    result.record_id,
                    result.prize.id,
                    result.prize.remaining_quantity,
                    result.participant.as_ref().map(|p| p.id)
                );
                Ok(result)
            }
            Ok(None) => {
                if self.config.create_participant_on_empty && name.is_some() {
                    txn.commit().await?;
                } else {
                    txn.rollback().await?;
                }
                Err(AppError::NoPrizesAvailable)
            }
            Err(e) => {
                log::warn!("Draw rolled back: {e}");
                if let Err(rollback_err) = txn.rollback().await {
                    log::error!("Rollback failed: {rollback_err}");
                }
                Err(e)
            }
        }
    }

    /// `Ok(None)` 表示没有可抽的奖品
    async fn draw_in(
        &self,
        txn: &mut dyn InventoryTxn,
        name: Option<&str>,
    ) -> AppResult<Option<DrawResponse>> {
        let mut eligible = txn.lock_eligible_prizes().await?;
        eligible.retain(Prize::is_eligible);

        if eligible.is_empty() {
            if self.config.create_participant_on_empty
                && let Some(name) = name
            {
                txn.find_or_create_participant(name).await?;
            }
            return Ok(None);
        }

        // 权重求和与遍历必须使用同一个固定顺序
        eligible.sort_by_key(|p| p.id);

        let selected = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| AppError::DrawFailed("random source poisoned".into()))?;
            select_prize(&eligible, &mut *rng).cloned()
        }
        .ok_or_else(|| AppError::DrawFailed("no prize selected".into()))?;

        let participant = match name {
            Some(name) => Some(txn.find_or_create_participant(name).await?),
            None => None,
        };

        let record_id = txn
            .append_record(participant.as_ref().map(|p| p.id), &selected)
            .await?;

        if !txn.decrement_if_positive(selected.id).await? {
            return Err(AppError::DrawFailed(format!(
                "prize {} was exhausted before decrement",
                selected.id
            )));
        }

        let mut prize = selected;
        prize.remaining_quantity -= 1;

        Ok(Some(DrawResponse {
            participant: participant.map(ParticipantResponse::from),
            prize: PrizeResponse::from(prize),
            record_id,
        }))
    }

    fn resolve_name(&self, participant_name: Option<String>) -> AppResult<Option<String>> {
        let name = participant_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        match (self.config.participant_mode, name) {
            (ParticipantMode::Disabled, _) => Ok(None),
            (ParticipantMode::Required, None) => Err(AppError::InvalidInput(
                "Participant name is required".into(),
            )),
            (_, Some(name)) if name.chars().count() > MAX_PARTICIPANT_NAME_LEN => {
                Err(AppError::InvalidInput(format!(
                    "Participant name must be at most {MAX_PARTICIPANT_NAME_LEN} characters"
                )))
            }
            (_, name) => Ok(name),
        }
    }
}

/// 负数、NaN、无穷大的权重一律按 0 处理
fn effective_weight(prize: &Prize) -> f64 {
    if prize.weight.is_finite() && prize.weight > 0.0 {
        prize.weight
    } else {
        0.0
    }
}

pub fn total_weight(prizes: &[Prize]) -> f64 {
    prizes.iter().map(effective_weight).sum()
}

/// 按顺序从 `r` 中依次减去权重，第一个使 `r <= 0` 的奖品中奖。
/// 浮点误差导致遍历结束仍未命中时，取顺序中最后一个权重大于 0 的奖品。
pub fn pick_weighted(prizes: &[Prize], r: f64) -> Option<&Prize> {
    let mut remaining = r;
    for prize in prizes {
        let weight = effective_weight(prize);
        if weight == 0.0 {
            continue;
        }
        remaining -= weight;
        if remaining <= 0.0 {
            return Some(prize);
        }
    }

    let fallback = prizes
        .iter()
        .rev()
        .find(|p| effective_weight(p) > 0.0)
        .or(prizes.last());
    if let Some(prize) = fallback {
        log::debug!("Weighted walk exhausted (r={r}), falling back to prize {}", prize.id);
    }
    fallback
}

/// 在 `[0, W)` 内均匀取 `r` 后调用 [`pick_weighted`]；权重全为 0 时等概率。
pub fn select_prize<'a, R: Rng + ?Sized>(prizes: &'a [Prize], rng: &mut R) -> Option<&'a Prize> {
    if prizes.is_empty() {
        return None;
    }

    let total = total_weight(prizes);
    if total <= 0.0 {
        return prizes.get(rng.gen_range(0..prizes.len()));
    }

    let r = rng.gen_range(0.0..total);
    pick_weighted(prizes, r)
}
