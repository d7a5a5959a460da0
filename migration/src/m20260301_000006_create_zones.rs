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
          .table(CheckinZones::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(CheckinZones::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(CheckinZones::Name).string().not_null())
          .col(ColumnDef::new(CheckinZones::Latitude).double().not_null())
          .col(ColumnDef::new(CheckinZones::Longitude).double().not_null())
          .col(
            ColumnDef::new(CheckinZones::RadiusMeters)
              .double()
              .not_null()
              .default(100.0),
          )
          .col(ColumnDef::new(CheckinZones::AchievementCode).string().null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(LocationCheckins::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(LocationCheckins::UserId).big_integer().not_null(),
          )
          .col(ColumnDef::new(LocationCheckins::ZoneId).integer().not_null())
          .col(ColumnDef::new(LocationCheckins::CheckinDate).date().not_null())
          .col(ColumnDef::new(LocationCheckins::Latitude).double().not_null())
          .col(ColumnDef::new(LocationCheckins::Longitude).double().not_null())
          .col(
            ColumnDef::new(LocationCheckins::CreatedAt).date_time().not_null(),
          )
          .primary_key(
            Index::create()
              .col(LocationCheckins::UserId)
              .col(LocationCheckins::ZoneId)
              .col(LocationCheckins::CheckinDate),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_location_checkins_user")
              .from(LocationCheckins::Table, LocationCheckins::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_location_checkins_zone")
              .from(LocationCheckins::Table, LocationCheckins::ZoneId)
              .to(CheckinZones::Table, CheckinZones::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(LocationCheckins::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(CheckinZones::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum CheckinZones {
  Table,
  Id,
  Name,
  Latitude,
  Longitude,
  RadiusMeters,
  AchievementCode,
}

#[derive(DeriveIden)]
pub enum LocationCheckins {
  Table,
  UserId,
  ZoneId,
  CheckinDate,
  Latitude,
  Longitude,
  CreatedAt,
}
