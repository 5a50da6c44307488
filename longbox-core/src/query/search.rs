//! Search DSL (§4.9): a single dynamic `SELECT` built with
//! `sqlx::QueryBuilder`, scoped by the Access Policy before any filter is
//! applied. Grounded on the teacher's `database::postgres_ext::query_optimized`
//! conditional-push pattern — filters are folded into one statement with
//! `EXISTS` subqueries, never applied as a post-fetch pass over the rows.

use longbox_model::issue::Issue;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::access::AccessPolicy;
use crate::error::{CoreError, Result};

pub const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    All,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Contains,
    DoesNotContain,
    MustContain,
    IsEmpty,
    IsNotEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Library,
    Series,
    Volume,
    Number,
    Title,
    Publisher,
    Imprint,
    Format,
    Year,
    Writer,
    Penciller,
    Inker,
    Colorist,
    Letterer,
    CoverArtist,
    Editor,
    Character,
    Team,
    Location,
    Collection,
    ReadingList,
    PullList,
    SeriesGroup,
    StoryArc,
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub field: Field,
    pub operator: Operator,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Created,
    Updated,
    Year,
    Series,
    Title,
    PageCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub match_mode: MatchMode,
    pub filters: Vec<Filter>,
    pub sort: SortField,
    pub sort_dir: SortDir,
    pub limit: i64,
    pub offset: i64,
}

impl SearchRequest {
    fn validate(&self) -> Result<()> {
        if self.limit <= 0 || self.limit > MAX_LIMIT {
            return Err(CoreError::BadRequest(format!("limit must be in 1..={MAX_LIMIT}")));
        }
        if self.offset < 0 {
            return Err(CoreError::BadRequest("offset must be >= 0".into()));
        }
        Ok(())
    }
}

const BASE_SELECT: &str = "SELECT i.id, i.volume_id, i.file_path, i.filename, i.file_size, i.file_mtime, \
     i.page_count, i.number, i.title, i.summary, i.cover_year, i.cover_month, i.cover_day, i.web_url, \
     i.notes, i.age_rating, i.language_iso, i.community_rating, i.count, i.publisher, i.imprint, \
     i.format, i.series_group, i.scan_info, i.alternate_series, i.alternate_number, i.story_arc, \
     i.raw_metadata, i.thumbnail_path, i.cover_color, i.is_dirty, i.created_at, i.updated_at \
     FROM issues i JOIN volumes v ON v.id = i.volume_id JOIN series s ON s.id = v.series_id";

pub async fn search(pool: &PgPool, request: &SearchRequest, access: &AccessPolicy) -> Result<Vec<Issue>> {
    request.validate()?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(BASE_SELECT);
    builder.push(" WHERE ");
    push_scope(&mut builder, access);

    if !request.filters.is_empty() {
        builder.push(" AND (");
        let connector = match request.match_mode {
            MatchMode::All => " AND ",
            MatchMode::Any => " OR ",
        };
        for (idx, filter) in request.filters.iter().enumerate() {
            if idx > 0 {
                builder.push(connector);
            }
            push_filter(&mut builder, filter)?;
        }
        builder.push(")");
    }

    push_sort(&mut builder, request.sort, request.sort_dir);
    builder.push(" LIMIT ");
    builder.push_bind(request.limit);
    builder.push(" OFFSET ");
    builder.push_bind(request.offset);

    let rows = builder.build_query_as::<Issue>().fetch_all(pool).await?;
    Ok(rows)
}

fn push_scope(builder: &mut QueryBuilder<Postgres>, access: &AccessPolicy) {
    builder.push("1 = 1");
    if let Some(libraries) = access.accessible_libraries() {
        let ids: Vec<_> = libraries.iter().copied().collect();
        builder.push(" AND s.library_id = ANY(");
        builder.push_bind(ids);
        builder.push(")");
    }
    builder.push(" AND NOT (i.age_rating = ANY(");
    builder.push_bind(access.banned_ratings().to_vec());
    builder.push(") OR (i.age_rating IS NULL AND ");
    builder.push_bind(access.unknown_banned());
    builder.push("))");
}

fn push_sort(builder: &mut QueryBuilder<Postgres>, sort: SortField, dir: SortDir) {
    let column = match sort {
        SortField::Created => "i.created_at",
        SortField::Updated => "i.updated_at",
        SortField::Year => "i.cover_year",
        SortField::Series => "s.name",
        SortField::Title => "i.title",
        SortField::PageCount => "i.page_count",
    };
    let direction = match dir {
        SortDir::Asc => "ASC",
        SortDir::Desc => "DESC",
    };
    builder.push(format!(" ORDER BY {column} {direction} NULLS LAST, i.id ASC"));
}

/// Scalar text/numeric fields live directly on `issues`/`volumes`/`series`;
/// everything else is a many-to-many relation reached through an `EXISTS`
/// subquery so a multi-valued match never fans the outer row out.
fn push_filter(builder: &mut QueryBuilder<Postgres>, filter: &Filter) -> Result<()> {
    match filter.field {
        Field::Library => push_scalar(builder, "s.library_id::text", filter),
        Field::Series => push_scalar(builder, "s.name", filter),
        Field::Volume => push_scalar(builder, "v.volume_number::text", filter),
        Field::Number => push_scalar(builder, "i.number", filter),
        Field::Title => push_scalar(builder, "i.title", filter),
        Field::Publisher => push_scalar(builder, "i.publisher", filter),
        Field::Imprint => push_scalar(builder, "i.imprint", filter),
        Field::Format => push_scalar(builder, "i.format", filter),
        Field::Year => push_scalar(builder, "i.cover_year::text", filter),
        Field::SeriesGroup => push_scalar(builder, "i.series_group", filter),
        Field::StoryArc => push_scalar(builder, "i.story_arc", filter),
        Field::Writer => push_credit_exists(builder, "writer", filter),
        Field::Penciller => push_credit_exists(builder, "penciller", filter),
        Field::Inker => push_credit_exists(builder, "inker", filter),
        Field::Colorist => push_credit_exists(builder, "colorist", filter),
        Field::Letterer => push_credit_exists(builder, "letterer", filter),
        Field::CoverArtist => push_credit_exists(builder, "cover_artist", filter),
        Field::Editor => push_credit_exists(builder, "editor", filter),
        Field::Character => push_tag_exists(builder, "issue_characters", "character_id", "characters", filter),
        Field::Team => push_tag_exists(builder, "issue_teams", "team_id", "teams", filter),
        Field::Location => push_tag_exists(builder, "issue_locations", "location_id", "locations", filter),
        Field::Collection => push_container_exists(builder, "collection", filter),
        Field::ReadingList => push_container_exists(builder, "reading_list", filter),
        Field::PullList => push_container_exists(builder, "pull_list", filter),
    }
}

fn push_scalar(builder: &mut QueryBuilder<Postgres>, column: &str, filter: &Filter) -> Result<()> {
    match filter.operator {
        Operator::IsEmpty => {
            builder.push(format!("({column} IS NULL OR {column} = '')"));
        }
        Operator::IsNotEmpty => {
            builder.push(format!("({column} IS NOT NULL AND {column} != '')"));
        }
        Operator::Equal => {
            let value = single_value(filter)?;
            builder.push(format!("{column} = "));
            builder.push_bind(value);
        }
        Operator::NotEqual => {
            let value = single_value(filter)?;
            builder.push(format!("{column} != "));
            builder.push_bind(value);
        }
        Operator::Contains => {
            builder.push("(");
            push_ilike_group(builder, column, &filter.values, " OR ");
            builder.push(")");
        }
        Operator::DoesNotContain => {
            builder.push("NOT (");
            push_ilike_group(builder, column, &filter.values, " OR ");
            builder.push(")");
        }
        Operator::MustContain => {
            builder.push("(");
            push_ilike_group(builder, column, &filter.values, " AND ");
            builder.push(")");
        }
    }
    Ok(())
}

fn push_ilike_group(builder: &mut QueryBuilder<Postgres>, column: &str, values: &[String], connector: &str) {
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            builder.push(connector);
        }
        builder.push(format!("{column} ILIKE "));
        builder.push_bind(format!("%{value}%"));
    }
    if values.is_empty() {
        builder.push("FALSE");
    }
}

fn push_credit_exists(builder: &mut QueryBuilder<Postgres>, role: &str, filter: &Filter) -> Result<()> {
    match filter.operator {
        Operator::IsEmpty => {
            builder.push("NOT EXISTS (SELECT 1 FROM credits c WHERE c.issue_id = i.id AND c.role = ");
            builder.push_bind(role.to_string());
            builder.push(")");
        }
        Operator::IsNotEmpty => {
            builder.push("EXISTS (SELECT 1 FROM credits c WHERE c.issue_id = i.id AND c.role = ");
            builder.push_bind(role.to_string());
            builder.push(")");
        }
        Operator::MustContain => {
            for (idx, value) in filter.values.iter().enumerate() {
                if idx > 0 {
                    builder.push(" AND ");
                }
                push_one_credit_exists(builder, role, value);
            }
        }
        Operator::DoesNotContain => {
            builder.push("NOT (");
            for (idx, value) in filter.values.iter().enumerate() {
                if idx > 0 {
                    builder.push(" OR ");
                }
                push_one_credit_exists(builder, role, value);
            }
            builder.push(")");
        }
        Operator::Equal | Operator::Contains => {
            builder.push("(");
            for (idx, value) in filter.values.iter().enumerate() {
                if idx > 0 {
                    builder.push(" OR ");
                }
                push_one_credit_exists(builder, role, value);
            }
            builder.push(")");
        }
        Operator::NotEqual => {
            builder.push("NOT (");
            for (idx, value) in filter.values.iter().enumerate() {
                if idx > 0 {
                    builder.push(" OR ");
                }
                push_one_credit_exists(builder, role, value);
            }
            builder.push(")");
        }
    }
    Ok(())
}

fn push_one_credit_exists(builder: &mut QueryBuilder<Postgres>, role: &str, name: &str) {
    builder.push("EXISTS (SELECT 1 FROM credits c JOIN people p ON p.id = c.person_id WHERE c.issue_id = i.id AND c.role = ");
    builder.push_bind(role.to_string());
    builder.push(" AND p.name ILIKE ");
    builder.push_bind(format!("%{name}%"));
    builder.push(")");
}

fn push_tag_exists(builder: &mut QueryBuilder<Postgres>, join_table: &str, fk: &str, name_table: &str, filter: &Filter) -> Result<()> {
    match filter.operator {
        Operator::IsEmpty => {
            builder.push(format!("NOT EXISTS (SELECT 1 FROM {join_table} j WHERE j.issue_id = i.id)"));
        }
        Operator::IsNotEmpty => {
            builder.push(format!("EXISTS (SELECT 1 FROM {join_table} j WHERE j.issue_id = i.id)"));
        }
        Operator::MustContain => {
            for (idx, value) in filter.values.iter().enumerate() {
                if idx > 0 {
                    builder.push(" AND ");
                }
                push_one_tag_exists(builder, join_table, fk, name_table, value);
            }
        }
        Operator::DoesNotContain | Operator::NotEqual => {
            builder.push("NOT (");
            for (idx, value) in filter.values.iter().enumerate() {
                if idx > 0 {
                    builder.push(" OR ");
                }
                push_one_tag_exists(builder, join_table, fk, name_table, value);
            }
            builder.push(")");
        }
        Operator::Equal | Operator::Contains => {
            builder.push("(");
            for (idx, value) in filter.values.iter().enumerate() {
                if idx > 0 {
                    builder.push(" OR ");
                }
                push_one_tag_exists(builder, join_table, fk, name_table, value);
            }
            builder.push(")");
        }
    }
    Ok(())
}

fn push_one_tag_exists(builder: &mut QueryBuilder<Postgres>, join_table: &str, fk: &str, name_table: &str, name: &str) {
    builder.push(format!(
        "EXISTS (SELECT 1 FROM {join_table} j JOIN {name_table} t ON t.id = j.{fk} WHERE j.issue_id = i.id AND t.name ILIKE "
    ));
    builder.push_bind(format!("%{name}%"));
    builder.push(")");
}

fn push_container_exists(builder: &mut QueryBuilder<Postgres>, kind: &str, filter: &Filter) -> Result<()> {
    match filter.operator {
        Operator::IsEmpty => {
            builder.push(
                "NOT EXISTS (SELECT 1 FROM container_items ci JOIN containers c ON c.id = ci.container_id \
                 WHERE ci.issue_id = i.id AND c.kind = ",
            );
            builder.push_bind(kind.to_string());
            builder.push(")");
        }
        Operator::IsNotEmpty => {
            builder.push(
                "EXISTS (SELECT 1 FROM container_items ci JOIN containers c ON c.id = ci.container_id \
                 WHERE ci.issue_id = i.id AND c.kind = ",
            );
            builder.push_bind(kind.to_string());
            builder.push(")");
        }
        Operator::MustContain => {
            for (idx, value) in filter.values.iter().enumerate() {
                if idx > 0 {
                    builder.push(" AND ");
                }
                push_one_container_exists(builder, kind, value);
            }
        }
        Operator::DoesNotContain | Operator::NotEqual => {
            builder.push("NOT (");
            for (idx, value) in filter.values.iter().enumerate() {
                if idx > 0 {
                    builder.push(" OR ");
                }
                push_one_container_exists(builder, kind, value);
            }
            builder.push(")");
        }
        Operator::Equal | Operator::Contains => {
            builder.push("(");
            for (idx, value) in filter.values.iter().enumerate() {
                if idx > 0 {
                    builder.push(" OR ");
                }
                push_one_container_exists(builder, kind, value);
            }
            builder.push(")");
        }
    }
    Ok(())
}

fn push_one_container_exists(builder: &mut QueryBuilder<Postgres>, kind: &str, name: &str) {
    builder.push(
        "EXISTS (SELECT 1 FROM container_items ci JOIN containers c ON c.id = ci.container_id \
         WHERE ci.issue_id = i.id AND c.kind = ",
    );
    builder.push_bind(kind.to_string());
    builder.push(" AND c.name ILIKE ");
    builder.push_bind(format!("%{name}%"));
    builder.push(")");
}

fn single_value(filter: &Filter) -> Result<String> {
    filter
        .values
        .first()
        .cloned()
        .ok_or_else(|| CoreError::BadRequest("filter requires exactly one value".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_above_max_is_rejected() {
        let req = SearchRequest {
            match_mode: MatchMode::All,
            filters: vec![],
            sort: SortField::Created,
            sort_dir: SortDir::Desc,
            limit: MAX_LIMIT + 1,
            offset: 0,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn negative_offset_is_rejected() {
        let req = SearchRequest {
            match_mode: MatchMode::All,
            filters: vec![],
            sort: SortField::Created,
            sort_dir: SortDir::Desc,
            limit: 50,
            offset: -1,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn builds_without_panicking_for_a_mixed_filter_set() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(BASE_SELECT);
        builder.push(" WHERE 1 = 1");
        push_filter(
            &mut builder,
            &Filter { field: Field::Writer, operator: Operator::Contains, values: vec!["Moore".into()] },
        )
        .unwrap();
        push_filter(
            &mut builder,
            &Filter { field: Field::Year, operator: Operator::Equal, values: vec!["1986".into()] },
        )
        .unwrap();
        let sql = builder.sql();
        assert!(sql.contains("EXISTS"));
        assert!(sql.contains("cover_year"));
    }
}
