use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Redemptions::Table)
          .if_not_exists()
          .col(ColumnDef::new(Redemptions::UserId).big_integer().not_null())
          .col(ColumnDef::new(Redemptions::Month).string().not_null())
          .col(ColumnDef::new(Redemptions::Tier).string().not_null())
          .col(ColumnDef::new(Redemptions::Cost).integer().not_null())
          .col(ColumnDef::new(Redemptions::RedeemedAt).date_time().not_null())
          // the whole once-a-month rule lives in this key
          .primary_key(
            Index::create().col(Redemptions::UserId).col(Redemptions::Month),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_redemptions_user")
              .from(Redemptions::Table, Redemptions::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Redemptions::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Redemptions {
  Table,
  UserId,
  Month,
  Tier,
  Cost,
  RedeemedAt,
}
