use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 redirect_links 表
        manager
            .create_table(
                Table::create()
                    .table(RedirectLink::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RedirectLink::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RedirectLink::Url).text().not_null())
                    .col(
                        ColumnDef::new(RedirectLink::Label)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(RedirectLink::Category)
                            .string()
                            .not_null()
                            .default("general"),
                    )
                    .col(
                        ColumnDef::new(RedirectLink::Weight)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(RedirectLink::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RedirectLink::HitCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RedirectLink::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RedirectLink::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // url 全表唯一（包括未激活的链接）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_redirect_links_url")
                    .table(RedirectLink::Table)
                    .col(RedirectLink::Url)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 选择热路径索引：active 过滤 + weight 排序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_redirect_links_active_weight")
                    .table(RedirectLink::Table)
                    .col(RedirectLink::IsActive)
                    .col(RedirectLink::Weight)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除索引
        manager
            .drop_index(
                Index::drop()
                    .name("idx_redirect_links_active_weight")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_redirect_links_url").to_owned())
            .await?;

        // 删除表
        manager
            .drop_table(Table::drop().table(RedirectLink::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RedirectLink {
    #[sea_orm(iden = "redirect_links")]
    Table,
    Id,
    Url,
    Label,
    Category,
    Weight,
    IsActive,
    HitCount,
    CreatedAt,
    UpdatedAt,
}
