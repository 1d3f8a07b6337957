use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 抽奖参与者（首次以该名字抽奖时创建）
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "participants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 显示名称 (唯一)
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
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
