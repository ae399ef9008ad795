//! Reporting Engine endpoints.
//!
//! Query values arrive as strings and are parsed here so malformed input is a
//! 400 with a field name rather than an extractor rejection.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::AppState;
use carniceria_core::validation::parse_date;
use carniceria_core::{DailyReport, DateRange, MonthlyReport, RangeReport, ValidationError};

#[derive(Debug, Default, Deserialize)]
pub struct DailyQuery {
    pub fecha: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthlyQuery {
    pub anio: Option<String>,
    pub mes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub desde: Option<String>,
    pub hasta: Option<String>,
}

/// `GET /admin/reportes/diario?fecha=YYYY-MM-DD` (default: today)
pub async fn daily(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DailyQuery>, QueryRejection>,
) -> ApiResult<Json<DailyReport>> {
    let Query(query) = query?;
    let date = match present(query.fecha) {
        Some(raw) => parse_date("fecha", &raw)?,
        None => today(),
    };

    Ok(Json(state.db.reports().daily(date).await?))
}

/// `GET /admin/reportes/mensual?anio=&mes=` (default: current month)
pub async fn monthly(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MonthlyQuery>, QueryRejection>,
) -> ApiResult<Json<MonthlyReport>> {
    let Query(query) = query?;
    let now = today();
    let year = parse_number("anio", query.anio)?.unwrap_or(now.year());
    let month = parse_number("mes", query.mes)?.unwrap_or(now.month());

    let range = DateRange::month(year, month)?;
    Ok(Json(state.db.reports().monthly(range).await?))
}

/// `GET /admin/reportes/rango?desde=&hasta=` (both required, inclusive)
pub async fn range(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Json<RangeReport>> {
    let Query(query) = query?;
    let from = required_date("desde", query.desde)?;
    let to = required_date("hasta", query.hasta)?;

    let range = DateRange::new(from, to)?;
    Ok(Json(state.db.reports().range(range).await?))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Blank query values count as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required_date(field: &str, value: Option<String>) -> Result<NaiveDate, ValidationError> {
    let raw = present(value).ok_or_else(|| ValidationError::required(field))?;
    parse_date(field, &raw)
}

fn parse_number<T: std::str::FromStr>(
    field: &str,
    value: Option<String>,
) -> Result<Option<T>, ValidationError> {
    present(value)
        .map(|raw| {
            raw.trim().parse().map_err(|_| ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: format!("'{}' is not a number", raw),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number::<u32>("mes", Some("3".to_string())).unwrap(), Some(3));
        assert_eq!(parse_number::<u32>("mes", Some(" ".to_string())).unwrap(), None);
        assert_eq!(parse_number::<u32>("mes", None).unwrap(), None);
        assert!(parse_number::<u32>("mes", Some("marzo".to_string())).is_err());
    }

    #[test]
    fn test_required_date() {
        assert!(matches!(
            required_date("desde", None),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            required_date("desde", Some("01/02/2024".to_string())),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert_eq!(
            required_date("desde", Some("2024-02-01".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }
}
