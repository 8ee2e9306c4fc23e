use sea_orm_migration::prelude::*;

use super::m20260101_000001_create_roles_and_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vehicles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vehicles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vehicles::OwnerId).integer().not_null())
                    .col(ColumnDef::new(Vehicles::Make).string().not_null())
                    .col(ColumnDef::new(Vehicles::Model).string().not_null())
                    .col(ColumnDef::new(Vehicles::Year).integer().not_null())
                    .col(
                        ColumnDef::new(Vehicles::Plate)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Vehicles::Vin).string_len(32).null())
                    .col(ColumnDef::new(Vehicles::Color).string_len(32).null())
                    .col(
                        ColumnDef::new(Vehicles::Mileage)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Vehicles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicles_owner_id")
                            .from(Vehicles::Table, Vehicles::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Suppliers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Suppliers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Suppliers::Name).string().not_null())
                    .col(ColumnDef::new(Suppliers::Contact).string().null())
                    .col(ColumnDef::new(Suppliers::Phone).string_len(32).null())
                    .col(ColumnDef::new(Suppliers::Email).string().null())
                    .col(ColumnDef::new(Suppliers::Address).string().null())
                    .col(ColumnDef::new(Suppliers::City).string().null())
                    .col(ColumnDef::new(Suppliers::StateProvince).string().null())
                    .col(ColumnDef::new(Suppliers::PostalCode).string_len(16).null())
                    .col(ColumnDef::new(Suppliers::Notes).text().null())
                    .col(
                        ColumnDef::new(Suppliers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Services::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Services::Name).string().not_null())
                    .col(ColumnDef::new(Services::Description).text().null())
                    .col(ColumnDef::new(Services::Category).string().null())
                    .col(
                        ColumnDef::new(Services::EstimatedPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Services::EstimatedDurationMinutes)
                            .integer()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InventoryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::Code)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(InventoryItems::Name).string().not_null())
                    .col(ColumnDef::new(InventoryItems::Description).text().null())
                    .col(ColumnDef::new(InventoryItems::Category).string().null())
                    .col(ColumnDef::new(InventoryItems::Subcategory).string().null())
                    .col(ColumnDef::new(InventoryItems::Brand).string().null())
                    .col(ColumnDef::new(InventoryItems::Model).string().null())
                    .col(
                        ColumnDef::new(InventoryItems::StockQuantity)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(InventoryItems::StockQuantity).gte(0)),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::StockMinimum)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::StockMaximum)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::UnitOfMeasure)
                            .string_len(32)
                            .null(),
                    )
                    .col(ColumnDef::new(InventoryItems::Location).string().null())
                    .col(
                        ColumnDef::new(InventoryItems::PurchasePrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::SalePrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            InventoryItems::Table.into_iden(),
            Services::Table.into_iden(),
            Suppliers::Table.into_iden(),
            Vehicles::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Vehicles {
    Table,
    Id,
    OwnerId,
    Make,
    Model,
    Year,
    Plate,
    Vin,
    Color,
    Mileage,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Suppliers {
    Table,
    Id,
    Name,
    Contact,
    Phone,
    Email,
    Address,
    City,
    StateProvince,
    PostalCode,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Services {
    Table,
    Id,
    Name,
    Description,
    Category,
    EstimatedPrice,
    EstimatedDurationMinutes,
}

#[derive(DeriveIden)]
pub enum InventoryItems {
    Table,
    Id,
    Code,
    Name,
    Description,
    Category,
    Subcategory,
    Brand,
    Model,
    StockQuantity,
    StockMinimum,
    StockMaximum,
    UnitOfMeasure,
    Location,
    PurchasePrice,
    SalePrice,
    LastUpdated,
}
