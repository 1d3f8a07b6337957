use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

/// Prizes (奖品表)
#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    Name,
    Color,
    TotalQuantity,
    RemainingQuantity,
    Weight,
    CreatedAt,
    UpdatedAt,
}

/// Participants (抽奖参与者)
#[derive(DeriveIden)]
enum Participants {
    Table,
    Id,
    Name,
    CreatedAt,
}

/// Draw records (抽奖记录, append-only)
#[derive(DeriveIden)]
enum DrawRecords {
    Table,
    Id,
    ParticipantId,
    PrizeId,
    PrizeName,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// weight 为相对权重，概率 = weight / Σweight（仅统计剩余库存 > 0 的奖品），无需加总为 100。
/// 初始奖品（仅用于本地开发）:
/// - Grand Prize          weight 1   stock 1
/// - Bluetooth Speaker    weight 9   stock 10
/// - Coffee Voucher       weight 30  stock 100
/// - Sticker Pack         weight 60  stock 500
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prizes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prizes::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Prizes::Color).string_len(32).null())
                    .col(
                        ColumnDef::new(Prizes::TotalQuantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Prizes::RemainingQuantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Prizes::Weight)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Prizes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Prizes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prizes_name_unique")
                    .table(Prizes::Table)
                    .col(Prizes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Participants::Name).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Participants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 同名参与者只存在一条
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_name_unique")
                    .table(Participants::Table)
                    .col(Participants::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DrawRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrawRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DrawRecords::ParticipantId).big_integer().null())
                    .col(ColumnDef::new(DrawRecords::PrizeId).big_integer().not_null())
                    .col(
                        ColumnDef::new(DrawRecords::PrizeName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DrawRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draw_records_prize")
                            .from(DrawRecords::Table, DrawRecords::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draw_records_participant")
                            .from(DrawRecords::Table, DrawRecords::ParticipantId)
                            .to(Participants::Table, Participants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_records_participant")
                    .table(DrawRecords::Table)
                    .col(DrawRecords::ParticipantId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_records_prize")
                    .table(DrawRecords::Table)
                    .col(DrawRecords::PrizeId)
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();
        let backend = manager.get_database_backend();

        // 0 <= remaining_quantity <= total_quantity, weight >= 0
        let constraint_sql = r#"
ALTER TABLE prizes
  ADD CONSTRAINT chk_prizes_remaining_bounds
    CHECK (remaining_quantity >= 0 AND remaining_quantity <= total_quantity),
  ADD CONSTRAINT chk_prizes_weight_non_negative
    CHECK (weight >= 0);
"#;
        conn.execute(Statement::from_string(backend, constraint_sql.to_string()))
            .await?;

        let insert_sql = r#"
INSERT INTO prizes (name, color, total_quantity, remaining_quantity, weight)
VALUES
 ('Grand Prize', '#d4af37', 1, 1, 1),
 ('Bluetooth Speaker', '#1e90ff', 10, 10, 9),
 ('Coffee Voucher', '#8b4513', 100, 100, 30),
 ('Sticker Pack', '#32cd32', 500, 500, 60)
ON CONFLICT (name) DO NOTHING;
"#;
        conn.execute(Statement::from_string(backend, insert_sql.to_string()))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：记录 -> 参与者 -> 奖品
        manager
            .drop_table(Table::drop().if_exists().table(DrawRecords::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Participants::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;

        Ok(())
    }
}
