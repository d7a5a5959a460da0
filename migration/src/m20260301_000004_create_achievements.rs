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
          .table(Achievements::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Achievements::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Achievements::Code).string().not_null().unique_key(),
          )
          .col(ColumnDef::new(Achievements::Name).string().not_null())
          .col(ColumnDef::new(Achievements::Description).text().not_null())
          .col(
            ColumnDef::new(Achievements::RewardPoints)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Achievements::Kind).string().not_null())
          .col(ColumnDef::new(Achievements::Target).integer().null())
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(UserAchievements::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(UserAchievements::UserId).big_integer().not_null(),
          )
          .col(
            ColumnDef::new(UserAchievements::AchievementId).integer().not_null(),
          )
          .col(ColumnDef::new(UserAchievements::UnlockedAt).date_time().null())
          .col(ColumnDef::new(UserAchievements::ClaimedAt).date_time().null())
          .primary_key(
            Index::create()
              .col(UserAchievements::UserId)
              .col(UserAchievements::AchievementId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_achievements_user")
              .from(UserAchievements::Table, UserAchievements::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_achievements_achievement")
              .from(UserAchievements::Table, UserAchievements::AchievementId)
              .to(Achievements::Table, Achievements::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(MilestoneClaims::Table)
          .if_not_exists()
          .col(ColumnDef::new(MilestoneClaims::UserId).big_integer().not_null())
          .col(ColumnDef::new(MilestoneClaims::ItemCount).integer().not_null())
          .col(ColumnDef::new(MilestoneClaims::ClaimedAt).date_time().not_null())
          .primary_key(
            Index::create()
              .col(MilestoneClaims::UserId)
              .col(MilestoneClaims::ItemCount),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_milestone_claims_user")
              .from(MilestoneClaims::Table, MilestoneClaims::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(MilestoneClaims::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(UserAchievements::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(Achievements::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Achievements {
  Table,
  Id,
  Code,
  Name,
  Description,
  RewardPoints,
  Kind,
  Target,
}

#[derive(DeriveIden)]
pub enum UserAchievements {
  Table,
  UserId,
  AchievementId,
  UnlockedAt,
  ClaimedAt,
}

#[derive(DeriveIden)]
pub enum MilestoneClaims {
  Table,
  UserId,
  ItemCount,
  ClaimedAt,
}
