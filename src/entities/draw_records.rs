use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 抽奖记录实体
/// - 每次成功抽奖产生一条记录，只追加，不修改、不删除
/// - prize_name 冗余存储，奖品名称后续修改仍可回溯
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "draw_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 参与者ID (匿名抽奖为 NULL)
    pub participant_id: Option<i64>,
    /// 奖品ID (指向 prizes.id)
    pub prize_id: i64,
    /// 奖品名称 (历史快照)
    pub prize_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::prizes::Entity",
        from = "Column::PrizeId",
        to = "super::prizes::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Prize,
    #[sea_orm(
        belongs_to = "super::participants::Entity",
        from = "Column::ParticipantId",
        to = "super::participants::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Participant,
}

impl Related<super::prizes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prize.def()
    }
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
