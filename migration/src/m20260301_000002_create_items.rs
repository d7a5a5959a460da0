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
          .table(Items::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Items::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Items::Name).string().not_null())
          .col(ColumnDef::new(Items::ImageUrl).string().not_null())
          .col(
            ColumnDef::new(Items::Series)
              .string()
              .not_null()
              .default("common"),
          )
          .col(ColumnDef::new(Items::Description).text().null())
          .col(ColumnDef::new(Items::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(UserItems::Table)
          .if_not_exists()
          .col(ColumnDef::new(UserItems::UserId).big_integer().not_null())
          .col(ColumnDef::new(UserItems::ItemId).integer().not_null())
          .col(ColumnDef::new(UserItems::ObtainedAt).date_time().not_null())
          .primary_key(
            Index::create().col(UserItems::UserId).col(UserItems::ItemId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_items_user")
              .from(UserItems::Table, UserItems::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_items_item")
              .from(UserItems::Table, UserItems::ItemId)
              .to(Items::Table, Items::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(UserItems::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Items::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Items {
  Table,
  Id,
  Name,
  ImageUrl,
  Series,
  Description,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum UserItems {
  Table,
  UserId,
  ItemId,
  ObtainedAt,
}
