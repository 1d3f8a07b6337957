use crate::entities::{draw_record_entity as records, prize_entity as prizes};
use crate::error::AppResult;
use crate::models::{
    DrawRecordPageResponse, DrawRecordQuery, DrawRecordResponse, PaginatedResponse,
    PaginationParams, PrizeResponse,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::sync::Arc;

/// 奖品与抽奖记录的只读查询
#[derive(Clone)]
pub struct LotteryService {
    pool: Arc<DatabaseConnection>,
}

impl LotteryService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    /// 获取奖品列表（含已抽完的）
    pub async fn list_prizes(&self) -> AppResult<Vec<PrizeResponse>> {
        let list = prizes::Entity::find()
            .order_by_asc(prizes::Column::Id)
            .all(self.pool.as_ref())
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 获取抽奖记录（分页，倒序）
    pub async fn list_records(&self, query: &DrawRecordQuery) -> AppResult<DrawRecordPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = records::Entity::find();
        if let Some(participant_id) = query.participant_id {
            base_query = base_query.filter(records::Column::ParticipantId.eq(participant_id));
        }

        let total = base_query.clone().count(self.pool.as_ref()).await?;

        let items_models = base_query
            .order_by(records::Column::CreatedAt, Order::Desc)
            .order_by(records::Column::Id, Order::Desc)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(self.pool.as_ref())
            .await?;

        let items: Vec<DrawRecordResponse> = items_models.into_iter().map(Into::into).collect();

        Ok(PaginatedResponse::new(items, params, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_list_records_paginates() {
        let record = records::Model {
            id: 7,
            participant_id: Some(3),
            prize_id: 2,
            prize_name: "Coffee Voucher".into(),
            created_at: None,
        };
        let count_row = BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(21)))]);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row]])
            .append_query_results([vec![record]])
            .into_connection();
        let service = LotteryService::new(Arc::new(db));

        let page = service
            .list_records(&DrawRecordQuery {
                page: Some(2),
                per_page: Some(10),
                participant_id: Some(3),
            })
            .await
            .unwrap();

        assert_eq!(page.total, 21);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].prize_name, "Coffee Voucher");
    }
}
