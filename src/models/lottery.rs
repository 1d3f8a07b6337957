use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{draw_record_entity as record_entity, participant_entity, prize_entity};

use super::PaginatedResponse;

/// 抽奖请求
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct DrawRequest {
    /// 参与者显示名称（可选，取决于配置）
    #[schema(example = "alice")]
    pub name: Option<String>,
}

/// 抽奖记录查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DrawRecordQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
    /// 只看某个参与者
    pub participant_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PrizeResponse {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub total_quantity: i64,
    pub remaining_quantity: i64,
    /// 相对权重，概率 = weight / Σweight
    pub weight: f64,
}

impl From<prize_entity::Model> for PrizeResponse {
    fn from(m: prize_entity::Model) -> Self {
        PrizeResponse {
            id: m.id,
            name: m.name,
            color: m.color,
            total_quantity: m.total_quantity,
            remaining_quantity: m.remaining_quantity,
            weight: m.weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParticipantResponse {
    pub id: i64,
    pub name: String,
}

impl From<participant_entity::Model> for ParticipantResponse {
    fn from(m: participant_entity::Model) -> Self {
        ParticipantResponse {
            id: m.id,
            name: m.name,
        }
    }
}

/// 抽奖结果
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DrawResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<ParticipantResponse>,
    /// 抽中的奖品（remaining_quantity 为扣减后的值）
    pub prize: PrizeResponse,
    pub record_id: i64,
}

/// 抽奖记录响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawRecordResponse {
    pub id: i64,
    pub participant_id: Option<i64>,
    pub prize_id: i64,
    /// 奖品名称 (历史快照)
    pub prize_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<record_entity::Model> for DrawRecordResponse {
    fn from(m: record_entity::Model) -> Self {
        DrawRecordResponse {
            id: m.id,
            participant_id: m.participant_id,
            prize_id: m.prize_id,
            prize_name: m.prize_name,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 抽奖记录分页响应
pub type DrawRecordPageResponse = PaginatedResponse<DrawRecordResponse>;
