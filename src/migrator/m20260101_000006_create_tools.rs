use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tools::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tools::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tools::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Tools::ToolType).string_len(50).null())
                    .col(
                        ColumnDef::new(Tools::Status)
                            .string_len(50)
                            .not_null()
                            .default("disponible"),
                    )
                    .col(
                        ColumnDef::new(Tools::Quantity)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Tools::Quantity).gte(0)),
                    )
                    .col(ColumnDef::new(Tools::CheckoutDate).date().null())
                    .col(ColumnDef::new(Tools::ReturnDate).date().null())
                    .col(
                        ColumnDef::new(Tools::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tools::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Tools {
    Table,
    Id,
    Name,
    ToolType,
    Status,
    Quantity,
    CheckoutDate,
    ReturnDate,
    CreatedAt,
}
