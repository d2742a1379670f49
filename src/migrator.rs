use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_reference_tables::Migration),
            Box::new(m20240101_000002_create_devices_table::Migration),
            Box::new(m20240101_000003_create_goods_in_tables::Migration),
            Box::new(m20240101_000004_create_qc_records_table::Migration),
            Box::new(m20240101_000005_create_goods_out_tables::Migration),
            Box::new(m20240101_000006_create_log_entries_and_users::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_reference_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Code)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Categories::Title).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TacCodes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TacCodes::Tac)
                                .string_len(8)
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(TacCodes::Brand).string().not_null())
                        .col(ColumnDef::new(TacCodes::Model).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Trays::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Trays::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Trays::Name).string().not_null())
                        .col(ColumnDef::new(Trays::Capacity).integer().null())
                        .to_owned(),
                )
                .await?;

            // customers and suppliers share a shape
            for table in [Parties::Customers, Parties::Suppliers] {
                manager
                    .create_table(
                        Table::create()
                            .table(table)
                            .if_not_exists()
                            .col(ColumnDef::new(Parties::Id).string().not_null().primary_key())
                            .col(ColumnDef::new(Parties::Name).string().not_null())
                            .col(ColumnDef::new(Parties::ContactName).string().null())
                            .col(ColumnDef::new(Parties::Email).string().null())
                            .col(ColumnDef::new(Parties::Phone).string().null())
                            .col(ColumnDef::new(Parties::Address).string().null())
                            .col(
                                ColumnDef::new(Parties::CreatedAt)
                                    .timestamp_with_time_zone()
                                    .not_null(),
                            )
                            .to_owned(),
                    )
                    .await?;
            }

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_name")
                        .table(Parties::Customers)
                        .col(Parties::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_suppliers_name")
                        .table(Parties::Suppliers)
                        .col(Parties::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Parties::Suppliers).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Parties::Customers).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Trays::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TacCodes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Categories {
        Table,
        Code,
        Title,
    }

    #[derive(DeriveIden)]
    enum TacCodes {
        Table,
        Tac,
        Brand,
        Model,
    }

    #[derive(DeriveIden)]
    enum Trays {
        Table,
        Id,
        Name,
        Capacity,
    }

    #[derive(DeriveIden, Clone, Copy)]
    pub(super) enum Parties {
        Customers,
        Suppliers,
        Id,
        Name,
        ContactName,
        Email,
        Phone,
        Address,
        CreatedAt,
    }
}

mod m20240101_000002_create_devices_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_devices_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Devices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Devices::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Devices::Imei)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Devices::Tac).string_len(8).null())
                        .col(ColumnDef::new(Devices::Color).string().null())
                        .col(
                            ColumnDef::new(Devices::Grade)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Devices::Storage).string().null())
                        .col(
                            ColumnDef::new(Devices::Status)
                                .string_len(8)
                                .not_null()
                                .default("in"),
                        )
                        .col(ColumnDef::new(Devices::PurchaseId).integer().null())
                        .col(ColumnDef::new(Devices::TrayId).string().null())
                        .col(
                            ColumnDef::new(Devices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Devices::UpdatedAt)
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
                        .name("idx_devices_status")
                        .table(Devices::Table)
                        .col(Devices::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_devices_purchase_id")
                        .table(Devices::Table)
                        .col(Devices::PurchaseId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Devices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Devices {
        Table,
        Id,
        Imei,
        Tac,
        Color,
        Grade,
        Storage,
        Status,
        PurchaseId,
        TrayId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_goods_in_tables {

    use super::m20240101_000001_create_reference_tables::Parties;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_goods_in_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Date).date().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::SupplierId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::PoRef).string().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_supplier")
                                .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                                .to(Parties::Suppliers, Parties::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseLines::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLines::PurchaseId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseLines::Imei).string().not_null())
                        .col(
                            ColumnDef::new(PurchaseLines::QcRequired)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PurchaseLines::QcCompleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PurchaseLines::RepairRequired)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PurchaseLines::RepairCompleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PurchaseLines::Priority)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(PurchaseLines::TrayId).string().null())
                        .col(
                            ColumnDef::new(PurchaseLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_lines_purchase_order")
                                .from(PurchaseLines::Table, PurchaseLines::PurchaseId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_supplier_date")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::SupplierId)
                        .col(PurchaseOrders::Date)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_lines_purchase_id")
                        .table(PurchaseLines::Table)
                        .col(PurchaseLines::PurchaseId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_lines_imei")
                        .table(PurchaseLines::Table)
                        .col(PurchaseLines::Imei)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        Date,
        SupplierId,
        PoRef,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseLines {
        Table,
        Id,
        PurchaseId,
        Imei,
        QcRequired,
        QcCompleted,
        RepairRequired,
        RepairCompleted,
        Priority,
        TrayId,
        CreatedAt,
    }
}

mod m20240101_000004_create_qc_records_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_qc_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QcRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QcRecords::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(QcRecords::PurchaseId).integer().not_null())
                        .col(ColumnDef::new(QcRecords::DeviceCode).string().not_null())
                        .col(
                            ColumnDef::new(QcRecords::CosmeticPassed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(QcRecords::FunctionalPassed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(QcRecords::Comments).text().null())
                        .col(
                            ColumnDef::new(QcRecords::Flashed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(QcRecords::Eu)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(QcRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QcRecords::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Upserts conflict on this pair
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_qc_records_device_purchase")
                        .table(QcRecords::Table)
                        .col(QcRecords::DeviceCode)
                        .col(QcRecords::PurchaseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_qc_records_purchase_id")
                        .table(QcRecords::Table)
                        .col(QcRecords::PurchaseId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QcRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum QcRecords {
        Table,
        Id,
        PurchaseId,
        DeviceCode,
        CosmeticPassed,
        FunctionalPassed,
        Comments,
        Flashed,
        Eu,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_goods_out_tables {

    use super::m20240101_000001_create_reference_tables::Parties;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_goods_out_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SalesOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SalesOrders::CustomerId).string().not_null())
                        .col(ColumnDef::new(SalesOrders::CustomerRef).string().null())
                        .col(ColumnDef::new(SalesOrders::PoRef).string().null())
                        .col(ColumnDef::new(SalesOrders::DispatchId).string().null())
                        .col(
                            ColumnDef::new(SalesOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_orders_customer")
                                .from(SalesOrders::Table, SalesOrders::CustomerId)
                                .to(Parties::Customers, Parties::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesOrderLines::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::OrderId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOrderLines::Date).date().null())
                        .col(ColumnDef::new(SalesOrderLines::Brand).string().null())
                        .col(ColumnDef::new(SalesOrderLines::Details).string().null())
                        .col(ColumnDef::new(SalesOrderLines::Color).string().null())
                        .col(ColumnDef::new(SalesOrderLines::Grade).integer().null())
                        .col(ColumnDef::new(SalesOrderLines::Storage).string().null())
                        .col(ColumnDef::new(SalesOrderLines::Imei).string().null())
                        .col(
                            ColumnDef::new(SalesOrderLines::IsCompleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_order_lines_order")
                                .from(SalesOrderLines::Table, SalesOrderLines::OrderId)
                                .to(SalesOrders::Table, SalesOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_orders_customer_id")
                        .table(SalesOrders::Table)
                        .col(SalesOrders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_order_lines_order_id")
                        .table(SalesOrderLines::Table)
                        .col(SalesOrderLines::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_order_lines_imei")
                        .table(SalesOrderLines::Table)
                        .col(SalesOrderLines::Imei)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SalesOrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SalesOrders {
        Table,
        Id,
        CustomerId,
        CustomerRef,
        PoRef,
        DispatchId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum SalesOrderLines {
        Table,
        Id,
        OrderId,
        Date,
        Brand,
        Details,
        Color,
        Grade,
        Storage,
        Imei,
        IsCompleted,
        UpdatedAt,
    }
}

mod m20240101_000006_create_log_entries_and_users {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_log_entries_and_users"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(LogEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LogEntries::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(LogEntries::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(LogEntries::Subject).string().not_null())
                        .col(ColumnDef::new(LogEntries::Details).text().not_null())
                        .col(ColumnDef::new(LogEntries::RefId).string().null())
                        .col(ColumnDef::new(LogEntries::Actor).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_log_entries_date")
                        .table(LogEntries::Table)
                        .col(LogEntries::Date)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(LogEntries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum LogEntries {
        Table,
        Id,
        Date,
        Subject,
        Details,
        RefId,
        Actor,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Username,
        PasswordHash,
        CreatedAt,
        UpdatedAt,
    }
}
