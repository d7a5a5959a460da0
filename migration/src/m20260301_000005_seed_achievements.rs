use sea_orm_migration::prelude::*;

use super::m20260301_000004_create_achievements::Achievements;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (code, name, description, reward points, kind, target)
const CATALOG: &[(&str, &str, &str, i32, &str, Option<i32>)] = &[
  (
    "first_item",
    "A Spark of Starlight",
    "Obtain your first item",
    1,
    "first_item",
    Some(1),
  ),
  (
    "pilgrim_nova",
    "Pilgrim Nova",
    "Draw on 3 different days",
    1,
    "draw_days",
    Some(3),
  ),
  (
    "complete_series",
    "Full Set",
    "Collect every item of one series",
    2,
    "complete_series",
    None,
  ),
  (
    "milestone",
    "Treasures in Heaven",
    "Lights up for every {n} distinct items, rewarded automatically",
    1,
    "milestone",
    None,
  ),
  (
    "complete_all",
    "The Complete Collection",
    "Collect every item in the catalog",
    5,
    "complete_catalog",
    None,
  ),
  (
    "zone_a_15",
    "Faithful Visitor I",
    "Check in at {zone} 15 times",
    2,
    "zone_checkins",
    Some(15),
  ),
  (
    "zone_b_15",
    "Faithful Visitor II",
    "Check in at {zone} 15 times",
    2,
    "zone_checkins",
    Some(15),
  ),
  (
    "zone_c_15",
    "Faithful Visitor III",
    "Check in at {zone} 15 times",
    2,
    "zone_checkins",
    Some(15),
  ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    let mut insert = Query::insert();
    insert.into_table(Achievements::Table).columns([
      Achievements::Code,
      Achievements::Name,
      Achievements::Description,
      Achievements::RewardPoints,
      Achievements::Kind,
      Achievements::Target,
    ]);

    for &(code, name, description, reward, kind, target) in CATALOG {
      insert
        .values([
          code.into(),
          name.into(),
          description.into(),
          reward.into(),
          kind.into(),
          target.into(),
        ])
        .map_err(|err| DbErr::Custom(err.to_string()))?;
    }

    manager.exec_stmt(insert).await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    let codes = CATALOG.iter().map(|&(code, ..)| code);
    let delete = Query::delete()
      .from_table(Achievements::Table)
      .and_where(Expr::col(Achievements::Code).is_in(codes))
      .to_owned();

    manager.exec_stmt(delete).await
  }
}
