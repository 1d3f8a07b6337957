use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 奖品实体
/// - weight: 相对权重 (概率 = weight / Σweight，只统计有库存的奖品)
/// - total_quantity: 初始库存
/// - remaining_quantity: 剩余库存，0 <= remaining_quantity <= total_quantity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prizes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// 前端展示颜色
    pub color: Option<String>,
    pub total_quantity: i64,
    pub remaining_quantity: i64,
    pub weight: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 是否还有库存
    pub fn is_eligible(&self) -> bool {
        self.remaining_quantity > 0
    }

    /// 已抽出的数量
    pub fn drawn_count(&self) -> i64 {
        self.total_quantity - self.remaining_quantity
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::draw_records::Entity")]
    DrawRecords,
}

impl Related<super::draw_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DrawRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
