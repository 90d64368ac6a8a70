use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 usage_stats_hourly 表（按 date+hour 聚合的使用统计）
        manager
            .create_table(
                Table::create()
                    .table(UsageStatsHourly::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsageStatsHourly::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UsageStatsHourly::StatDate)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsageStatsHourly::StatHour)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsageStatsHourly::RequestsTotal)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UsageStatsHourly::RedirectsTotal)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UsageStatsHourly::ErrorsTotal)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UsageStatsHourly::RateLimitedTotal)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UsageStatsHourly::AvgResponseMs)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(UsageStatsHourly::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsageStatsHourly::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一索引：stat_date + stat_hour（upsert 目标）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_usage_stats_date_hour")
                    .table(UsageStatsHourly::Table)
                    .col(UsageStatsHourly::StatDate)
                    .col(UsageStatsHourly::StatHour)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_usage_stats_date_hour").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UsageStatsHourly::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UsageStatsHourly {
    #[sea_orm(iden = "usage_stats_hourly")]
    Table,
    Id,
    StatDate,
    StatHour,
    RequestsTotal,
    RedirectsTotal,
    ErrorsTotal,
    RateLimitedTotal,
    AvgResponseMs,
    CreatedAt,
    UpdatedAt,
}
