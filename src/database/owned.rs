//! Atomic ownership-filtered mutations.
//!
//! Every write against an owned row goes through a single
//! `UPDATE/DELETE ... WHERE id = $1 AND owner_id = $2 ... RETURNING *`
//! statement. The ownership filter and the mutation are one store operation,
//! so there is no window between an ownership check and the write. A `None`
//! result means "no row matched" and callers surface it as forbidden without
//! distinguishing a missing row from someone else's row.

use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool};
use std::marker::PhantomData;
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// One mutation fragment applied by `update_if_owned`
#[derive(Debug, Clone)]
pub enum Assignment<'a> {
    /// column = value
    Set(&'a str, Value),
    /// column = NOT column
    Toggle(&'a str),
    /// append an id to a uuid-array column, deduplicating
    ArrayAdd(&'a str, Uuid),
    /// remove an id from a uuid-array column
    ArrayRemove(&'a str, Uuid),
}

pub struct OwnedRepository<T> {
    table_name: String,
    pool: PgPool,
    _phantom: PhantomData<T>,
}

impl<T> OwnedRepository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>, pool: PgPool) -> Self {
        Self {
            table_name: table_name.into(),
            pool,
            _phantom: PhantomData,
        }
    }

    /// Apply `assignments` to the row with `id`, but only if `owner_id` owns
    /// it. Returns the post-mutation row, or `None` when nothing matched.
    pub async fn update_if_owned(
        &self,
        id: Uuid,
        owner_id: Uuid,
        assignments: &[Assignment<'_>],
    ) -> Result<Option<T>, DatabaseError> {
        let sql = build_update_sql(&self.table_name, assignments)?;

        let mut query = sqlx::query_as::<_, T>(&sql).bind(id).bind(owner_id);
        for assignment in assignments {
            query = match assignment {
                Assignment::Set(_, value) => bind_value(query, value),
                Assignment::Toggle(_) => query,
                Assignment::ArrayAdd(_, item) | Assignment::ArrayRemove(_, item) => {
                    query.bind(*item)
                }
            };
        }

        let row = query.fetch_optional(&self.pool).await?;
        Ok(row)
    }

    /// Delete the row with `id`, but only if `owner_id` owns it. Returns the
    /// deleted row, or `None` when nothing matched.
    pub async fn delete_if_owned(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<T>, DatabaseError> {
        let sql = build_delete_sql(&self.table_name)?;

        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

fn build_update_sql(table_name: &str, assignments: &[Assignment<'_>]) -> Result<String, DatabaseError> {
    validate_identifier(table_name)?;
    if assignments.is_empty() {
        return Err(DatabaseError::QueryError("no assignments given".to_string()));
    }

    // $1 = id, $2 = owner_id; value placeholders start at $3
    let mut clauses = Vec::with_capacity(assignments.len() + 1);
    let mut next_param = 3;
    for assignment in assignments {
        match assignment {
            Assignment::Set(column, _) => {
                validate_identifier(column)?;
                clauses.push(format!("\"{}\" = ${}", column, next_param));
                next_param += 1;
            }
            Assignment::Toggle(column) => {
                validate_identifier(column)?;
                clauses.push(format!("\"{0}\" = NOT \"{0}\"", column));
            }
            Assignment::ArrayAdd(column, _) => {
                validate_identifier(column)?;
                clauses.push(format!(
                    "\"{0}\" = array_append(array_remove(\"{0}\", ${1}), ${1})",
                    column, next_param
                ));
                next_param += 1;
            }
            Assignment::ArrayRemove(column, _) => {
                validate_identifier(column)?;
                clauses.push(format!("\"{0}\" = array_remove(\"{0}\", ${1})", column, next_param));
                next_param += 1;
            }
        }
    }
    clauses.push("updated_at = now()".to_string());

    Ok(format!(
        "UPDATE \"{}\" SET {} WHERE id = $1 AND owner_id = $2 RETURNING *",
        table_name,
        clauses.join(", ")
    ))
}

fn build_delete_sql(table_name: &str) -> Result<String, DatabaseError> {
    validate_identifier(table_name)?;
    Ok(format!(
        "DELETE FROM \"{}\" WHERE id = $1 AND owner_id = $2 RETURNING *",
        table_name
    ))
}

/// Table and column names come from code, never from clients, but validate
/// anyway so a future caller cannot smuggle SQL through an identifier.
fn validate_identifier(name: &str) -> Result<(), DatabaseError> {
    let mut chars = name.chars();
    let starts_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if starts_ok && rest_ok {
        Ok(())
    } else {
        Err(DatabaseError::QueryError(format!("invalid identifier: {}", name)))
    }
}

fn bind_value<'q, T>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, T, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, T, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        other => q.bind(other.clone()), // JSONB
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_filters_on_id_and_owner_in_one_statement() {
        let sql = build_update_sql("comments", &[Assignment::Set("content", json!("hi"))]).unwrap();
        assert_eq!(
            sql,
            "UPDATE \"comments\" SET \"content\" = $3, updated_at = now() \
             WHERE id = $1 AND owner_id = $2 RETURNING *"
        );
    }

    #[test]
    fn toggle_consumes_no_placeholder() {
        let sql = build_update_sql(
            "videos",
            &[
                Assignment::Toggle("is_published"),
                Assignment::Set("title", json!("t")),
            ],
        )
        .unwrap();
        assert!(sql.contains("\"is_published\" = NOT \"is_published\""));
        assert!(sql.contains("\"title\" = $3"));
    }

    #[test]
    fn array_ops_number_placeholders_in_order() {
        let video = Uuid::new_v4();
        let sql = build_update_sql(
            "playlists",
            &[
                Assignment::Set("name", json!("mix")),
                Assignment::ArrayAdd("video_ids", video),
            ],
        )
        .unwrap();
        assert!(sql.contains("\"name\" = $3"));
        assert!(sql.contains("array_append(array_remove(\"video_ids\", $4), $4)"));
    }

    #[test]
    fn delete_filters_on_id_and_owner() {
        let sql = build_delete_sql("comments").unwrap();
        assert_eq!(
            sql,
            "DELETE FROM \"comments\" WHERE id = $1 AND owner_id = $2 RETURNING *"
        );
    }

    #[test]
    fn rejects_hostile_identifiers() {
        assert!(build_delete_sql("comments; DROP TABLE users").is_err());
        assert!(build_update_sql("comments", &[Assignment::Set("content\" = '', id = \"", json!(1))]).is_err());
        assert!(build_update_sql("comments", &[]).is_err());
    }
}
