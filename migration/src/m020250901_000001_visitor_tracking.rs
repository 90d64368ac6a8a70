use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 visitor_sessions 表
        manager
            .create_table(
                Table::create()
                    .table(VisitorSession::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VisitorSession::SessionId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VisitorSession::FirstSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisitorSession::LastSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VisitorSession::Referrer).text().null())
                    .col(ColumnDef::new(VisitorSession::LandingPage).text().null())
                    .col(ColumnDef::new(VisitorSession::UserAgent).text().null())
                    .col(ColumnDef::new(VisitorSession::Source).string().null())
                    .col(
                        ColumnDef::new(VisitorSession::Converted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(VisitorSession::ConversionLinkId)
                            .string()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // last_seen_at 索引（留存清理 + 会话摘要按时间过滤）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visitor_sessions_last_seen")
                    .table(VisitorSession::Table)
                    .col(VisitorSession::LastSeenAt)
                    .to_owned(),
            )
            .await?;

        // 创建 visitor_events 表
        manager
            .create_table(
                Table::create()
                    .table(VisitorEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VisitorEvent::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VisitorEvent::SessionId).string().not_null())
                    .col(ColumnDef::new(VisitorEvent::EventType).string().not_null())
                    .col(ColumnDef::new(VisitorEvent::EventData).text().null())
                    .col(ColumnDef::new(VisitorEvent::LinkId).string().null())
                    .col(
                        ColumnDef::new(VisitorEvent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visitor_events_session")
                    .table(VisitorEvent::Table)
                    .col(VisitorEvent::SessionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visitor_events_created")
                    .table(VisitorEvent::Table)
                    .col(VisitorEvent::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_visitor_events_created").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_visitor_events_session").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(VisitorEvent::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_visitor_sessions_last_seen")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(VisitorSession::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VisitorSession {
    #[sea_orm(iden = "visitor_sessions")]
    Table,
    SessionId,
    FirstSeenAt,
    LastSeenAt,
    Referrer,
    LandingPage,
    UserAgent,
    Source,
    Converted,
    ConversionLinkId,
}

#[derive(DeriveIden)]
enum VisitorEvent {
    #[sea_orm(iden = "visitor_events")]
    Table,
    Id,
    SessionId,
    EventType,
    EventData,
    LinkId,
    CreatedAt,
}
