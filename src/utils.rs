use std::{fmt::Display, str::FromStr};

use sea_orm::{
  DbErr, IntoActiveModel, Iterable, PrimaryKeyToColumn,
  sea_query::OnConflict,
};

use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn now() -> DateTime {
  Utc::now().naive_utc()
}

/// Inserts the row unless its primary key is already taken.
///
/// Returns `false` when an existing row (possibly written by a concurrent
/// request) won, which keeps check-then-insert sequences atomic without
/// relying on backend-specific error codes.
pub async fn insert_new<A, C>(db: &C, model: A) -> Result<bool, DbErr>
where
  A: ActiveModelTrait + 'static,
  <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
  C: ConnectionTrait,
{
  let keys = <<A::Entity as EntityTrait>::PrimaryKey as Iterable>::iter()
    .map(|key| key.into_column());

  let rows = <A::Entity as EntityTrait>::insert(model)
    .on_conflict(OnConflict::columns(keys).do_nothing().to_owned())
    .exec_without_returning(db)
    .await?;

  Ok(rows > 0)
}

/// Reads an environment variable, falling back to `default` when unset.
pub fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
  T: FromStr,
  T::Err: Display,
{
  match std::env::var(key) {
    Ok(value) if !value.trim().is_empty() => value
      .trim()
      .parse()
      .map_err(|err| anyhow::anyhow!("Invalid {key} `{value}`: {err}")),
    _ => Ok(default),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_env_or() {
    assert_eq!(env_or("PILGRIM_TEST_UNSET_VAR", 7u32).unwrap(), 7);

    // SAFETY: test-local variable name, not read by other tests
    unsafe { std::env::set_var("PILGRIM_TEST_BAD_VAR", "seven") };
    assert!(env_or("PILGRIM_TEST_BAD_VAR", 7u32).is_err());
  }
}
