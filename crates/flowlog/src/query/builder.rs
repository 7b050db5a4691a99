use std::net::IpAddr;

use tracing::debug;

use super::error::{QueryError, QueryErrors};
use super::filter::{Predicate, QueryFilter};
use crate::record::{Field, FieldCatalog, FieldKind, FieldValue};

/// Builds a [`QueryFilter`] from raw request text.
///
/// Collects every problem across all terms and both time bounds before
/// giving up, so a caller sees the whole list in one response.
#[derive(Debug, Clone, Copy)]
pub struct QueryFilterBuilder<'c> {
    catalog: &'c FieldCatalog,
}

impl QueryFilterBuilder<'static> {
    pub fn global() -> Self {
        Self::new(FieldCatalog::global())
    }
}

impl<'c> QueryFilterBuilder<'c> {
    pub fn new(catalog: &'c FieldCatalog) -> Self {
        Self { catalog }
    }

    /// `search` is `key=value[,key=value…]`; empty means no equality terms.
    /// Empty time bounds count as not supplied.
    pub fn build(
        &self,
        search: &str,
        earliest: Option<&str>,
        latest: Option<&str>,
    ) -> Result<QueryFilter, QueryErrors> {
        let mut filter = QueryFilter::all();
        let mut errors = Vec::new();

        if !search.is_empty() {
            for term in search.split(',') {
                match self.term(term) {
                    Ok(predicate) => filter.push(predicate),
                    Err(e) => errors.push(e),
                }
            }
        }

        let earliest = parse_bound(earliest);
        let latest = parse_bound(latest);

        if earliest.is_err() || latest.is_err() {
            errors.push(QueryError::InvalidTimeFormat);
        }
        if let (Ok(Some(start)), Ok(Some(end))) = (earliest, latest) {
            if start > end {
                errors.push(QueryError::TimeRange);
            }
        }
        if let Ok(Some(start)) = earliest {
            filter.push(Predicate::StartsAtOrAfter(start));
        }
        if let Ok(Some(end)) = latest {
            filter.push(Predicate::EndsAtOrBefore(end));
        }

        if !errors.is_empty() {
            debug!(errors = errors.len(), "Rejected search request");
            return Err(QueryErrors(errors));
        }

        debug!(%filter, "Built search filter");
        Ok(filter)
    }

    fn term(&self, term: &str) -> Result<Predicate, QueryError> {
        let (key, value) = term
            .split_once('=')
            .ok_or_else(|| QueryError::InvalidFormat(term.to_string()))?;

        let field = self
            .catalog
            .lookup_queryable(key)
            .ok_or_else(|| QueryError::UnknownColumn {
                key: key.to_string(),
                allowed: self.catalog.queryable_names(),
            })?;

        if value.is_empty() {
            return Err(QueryError::MissingValue(field));
        }

        Ok(Predicate::Equals(field, convert(field, value)?))
    }
}

fn convert(field: Field, value: &str) -> Result<FieldValue, QueryError> {
    match field.kind() {
        FieldKind::Integer | FieldKind::BigInteger => value
            .trim()
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|_| QueryError::InvalidInteger(field)),
        // stored addresses are in canonical form; anything that isn't an
        // address stays raw and can never match
        FieldKind::Address => Ok(FieldValue::Text(
            value
                .parse::<IpAddr>()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| value.to_string()),
        )),
        FieldKind::Text { .. } => Ok(FieldValue::Text(value.to_string())),
    }
}

fn parse_bound(raw: Option<&str>) -> Result<Option<i64>, ()> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| ()),
    }
}
