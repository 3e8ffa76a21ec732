use super::ranker::TrendingStatuses;
use crate::error::{Result, TrendsError};
use crate::models::{Status, StatusId};
use std::collections::HashSet;

/// Which ranked view a trending filter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendingScope {
    All,
    Allowed,
}

impl TrendingScope {
    /// `allowed` selects the approved view; any other value the unrestricted one.
    pub fn parse(value: &str) -> Self {
        match value {
            "allowed" => TrendingScope::Allowed,
            _ => TrendingScope::All,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, TrendingScope::Allowed)
    }
}

/// A supported query dimension over statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Trending(TrendingScope),
}

impl StatusFilter {
    /// Pagination is handled by the caller and never reaches the filters.
    const PAGINATION_KEY: &'static str = "page";

    /// Parse one caller parameter. Blank values yield no filter.
    pub fn parse(key: &str, value: &str) -> Result<Option<Self>> {
        let value = value.trim();
        match key {
            "trending" if value.is_empty() => Ok(None),
            "trending" => Ok(Some(StatusFilter::Trending(TrendingScope::parse(value)))),
            other => Err(TrendsError::UnknownFilter(other.to_string())),
        }
    }

    /// Ids matching this filter, in the order the filter defines.
    pub async fn ids(&self, trends: &TrendingStatuses) -> Result<Vec<StatusId>> {
        match self {
            StatusFilter::Trending(scope) => {
                trends.currently_trending_ids(scope.is_allowed(), -1).await
            }
        }
    }
}

/// Conjunction of filters built from caller key/value parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusQuery {
    filters: Vec<StatusFilter>,
}

impl StatusQuery {
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = Vec::new();
        for (key, value) in params {
            let key = key.as_ref();
            if key == StatusFilter::PAGINATION_KEY {
                continue;
            }
            if let Some(filter) = StatusFilter::parse(key, value.as_ref())? {
                filters.push(filter);
            }
        }
        Ok(Self { filters })
    }

    pub fn filters(&self) -> &[StatusFilter] {
        &self.filters
    }

    /// Ids matching every filter, ordered by the first filter.
    ///
    /// A query with no filters matches nothing.
    pub async fn ids(&self, trends: &TrendingStatuses) -> Result<Vec<StatusId>> {
        let Some((first, rest)) = self.filters.split_first() else {
            return Ok(Vec::new());
        };

        let mut ids = first.ids(trends).await?;
        for filter in rest {
            if ids.is_empty() {
                break;
            }
            let keep: HashSet<StatusId> = filter.ids(trends).await?.into_iter().collect();
            ids.retain(|id| keep.contains(id));
        }
        Ok(ids)
    }

    pub async fn results(&self, trends: &TrendingStatuses) -> Result<Vec<Status>> {
        let ids = self.ids(trends).await?;
        trends.fetch_ordered(&ids).await
    }
}
