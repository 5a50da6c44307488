//! `POST /comics/search` (§6, §4.9): the wire DSL deserializes into this
//! crate's own DTOs, then maps one-to-one onto `longbox_core::query::search`'s
//! internal enums, none of which carry serde derives of their own.

use axum::extract::State;
use axum::routing::post;
use axum::{Extension, Json, Router};
use longbox_core::access::AccessPolicy;
use longbox_core::query::search::{Field, MatchMode, Operator, SortDir, SortField};
use longbox_core::query::SearchRequest;
use longbox_model::issue::Issue;
use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/comics/search", post(search))
}

#[derive(Debug, Deserialize)]
struct FilterDto {
    field: String,
    operator: String,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchRequestDto {
    #[serde(default = "default_match_mode")]
    match_mode: String,
    #[serde(default)]
    filters: Vec<FilterDto>,
    #[serde(default = "default_sort")]
    sort: String,
    #[serde(default = "default_sort_dir")]
    sort_dir: String,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_match_mode() -> String {
    "all".to_string()
}

fn default_sort() -> String {
    "created".to_string()
}

fn default_sort_dir() -> String {
    "desc".to_string()
}

fn default_limit() -> i64 {
    50
}

fn parse_field(raw: &str) -> AppResult<Field> {
    Ok(match raw {
        "library" => Field::Library,
        "series" => Field::Series,
        "volume" => Field::Volume,
        "number" => Field::Number,
        "title" => Field::Title,
        "publisher" => Field::Publisher,
        "imprint" => Field::Imprint,
        "format" => Field::Format,
        "year" => Field::Year,
        "writer" => Field::Writer,
        "penciller" => Field::Penciller,
        "inker" => Field::Inker,
        "colorist" => Field::Colorist,
        "letterer" => Field::Letterer,
        "cover_artist" => Field::CoverArtist,
        "editor" => Field::Editor,
        "character" => Field::Character,
        "team" => Field::Team,
        "location" => Field::Location,
        "collection" => Field::Collection,
        "reading_list" => Field::ReadingList,
        "pull_list" => Field::PullList,
        "series_group" => Field::SeriesGroup,
        "story_arc" => Field::StoryArc,
        other => return Err(AppError::bad_request(format!("unknown search field {other:?}"))),
    })
}

fn parse_operator(raw: &str) -> AppResult<Operator> {
    Ok(match raw {
        "equal" => Operator::Equal,
        "not_equal" => Operator::NotEqual,
        "contains" => Operator::Contains,
        "does_not_contain" => Operator::DoesNotContain,
        "must_contain" => Operator::MustContain,
        "is_empty" => Operator::IsEmpty,
        "is_not_empty" => Operator::IsNotEmpty,
        other => return Err(AppError::bad_request(format!("unknown search operator {other:?}"))),
    })
}

fn parse_sort(raw: &str) -> AppResult<SortField> {
    Ok(match raw {
        "created" => SortField::Created,
        "updated" => SortField::Updated,
        "year" => SortField::Year,
        "series" => SortField::Series,
        "title" => SortField::Title,
        "page_count" => SortField::PageCount,
        other => return Err(AppError::bad_request(format!("unknown sort field {other:?}"))),
    })
}

fn parse_sort_dir(raw: &str) -> AppResult<SortDir> {
    match raw {
        "asc" => Ok(SortDir::Asc),
        "desc" => Ok(SortDir::Desc),
        other => Err(AppError::bad_request(format!("unknown sort direction {other:?}"))),
    }
}

impl SearchRequestDto {
    fn into_core(self) -> AppResult<SearchRequest> {
        let match_mode = match self.match_mode.as_str() {
            "all" => MatchMode::All,
            "any" => MatchMode::Any,
            other => return Err(AppError::bad_request(format!("unknown match_mode {other:?}"))),
        };
        let filters = self
            .filters
            .into_iter()
            .map(|f| Ok(longbox_core::query::search::Filter { field: parse_field(&f.field)?, operator: parse_operator(&f.operator)?, values: f.values }))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(SearchRequest {
            match_mode,
            filters,
            sort: parse_sort(&self.sort)?,
            sort_dir: parse_sort_dir(&self.sort_dir)?,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

async fn search(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Json(body): Json<SearchRequestDto>,
) -> AppResult<Json<Vec<Issue>>> {
    let request = body.into_core()?;
    let results = state.query.search(&request, &access).await?;
    Ok(Json(results))
}
