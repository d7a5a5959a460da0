use sea_orm_migration::prelude::*;

use super::{
  m20260301_000001_create_users::Users, m20260301_000002_create_items::Items,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(DailyDraws::Table)
          .if_not_exists()
          .col(ColumnDef::new(DailyDraws::UserId).big_integer().not_null())
          .col(ColumnDef::new(DailyDraws::DrawDate).date().not_null())
          .col(ColumnDef::new(DailyDraws::ItemId).integer().not_null())
          .col(
            ColumnDef::new(DailyDraws::IsNew)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(DailyDraws::CreatedAt).date_time().not_null())
          // one draw per user per logical day
          .primary_key(
            Index::create().col(DailyDraws::UserId).col(DailyDraws::DrawDate),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_daily_draws_user")
              .from(DailyDraws::Table, DailyDraws::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_daily_draws_item")
              .from(DailyDraws::Table, DailyDraws::ItemId)
              .to(Items::Table, Items::Id),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(DailyDraws::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum DailyDraws {
  Table,
  UserId,
  DrawDate,
  ItemId,
  IsNew,
  CreatedAt,
}
