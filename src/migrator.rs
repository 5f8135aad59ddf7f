use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(
            m20260801_000001_create_suppliers_table::Migration,
        )]
    }
}

mod m20260801_000001_create_suppliers_table {
    use sea_orm_migration::{prelude::*, schema::*};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260801_000001_create_suppliers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        // Columns mirror entities::supplier::Model
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(pk_uuid(Suppliers::Id))
                        .col(string(Suppliers::Name))
                        .col(string(Suppliers::Telephone))
                        .col(string(Suppliers::SocialMedia))
                        .col(boolean(Suppliers::IsActive).default(true))
                        .col(timestamp_with_time_zone(Suppliers::CreatedAt))
                        .col(timestamp_with_time_zone(Suppliers::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_suppliers_name")
                        .table(Suppliers::Table)
                        .col(Suppliers::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Default listing order is newest first
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_suppliers_created_at")
                        .table(Suppliers::Table)
                        .col(Suppliers::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
        Name,
        Telephone,
        SocialMedia,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}
