use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::{TimeMachineConfig, TimeMachineError};

/// Một ngày cụ thể hoặc một khoảng ngày.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DateSelector {
    Day { date: NaiveDate },
    Range { from: NaiveDate, to: NaiveDate },
}

/// Tham số thô do trang nhúng cung cấp; chuỗi rỗng coi như không có.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryParams {
    pub country: Option<String>,
    pub category: Option<String>,
    pub emotion: Option<String>,
    pub impact: Option<String>,
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Truy vấn đã chuẩn hoá, sẵn sàng dựng URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub country: String,
    pub categories: Vec<String>,
    pub emotion: String,
    pub impact: String,
    pub selector: DateSelector,
}

impl HistoryQuery {
    pub fn from_params(params: &HistoryParams) -> Result<Self, TimeMachineError> {
        let selector = match (
            non_empty(&params.date),
            non_empty(&params.from),
            non_empty(&params.to),
        ) {
            (Some(date), _, _) => DateSelector::Day {
                date: parse_day(date)?,
            },
            (None, Some(from), Some(to)) => DateSelector::Range {
                from: parse_day(from)?,
                to: parse_day(to)?,
            },
            _ => return Err(TimeMachineError::MissingPeriod),
        };

        Ok(Self {
            country: params.country.clone().unwrap_or_default(),
            categories: split_categories(params.category.as_deref().unwrap_or_default()),
            emotion: params.emotion.clone().unwrap_or_default(),
            impact: params.impact.clone().unwrap_or_default(),
            selector,
        })
    }

    /// Một URL cho mỗi danh mục, theo đúng thứ tự danh mục.
    pub fn urls(&self, config: &TimeMachineConfig) -> Vec<String> {
        let base = config.api_base();
        let limit = config.limit.to_string();

        self.categories
            .iter()
            .map(|category| {
                let mut query = form_urlencoded::Serializer::new(String::new());
                let path = match self.selector {
                    DateSelector::Day { date } => format!("{base}/{}", format_day(date)),
                    DateSelector::Range { from, to } => {
                        query
                            .append_pair("from", &format_day(from))
                            .append_pair("to", &format_day(to));
                        format!("{base}/")
                    }
                };
                query
                    .append_pair("country", &self.country)
                    .append_pair("category", category)
                    .append_pair("emotion", &self.emotion)
                    .append_pair("impact", &self.impact)
                    .append_pair("limit", &limit);
                format!("{path}?{}", query.finish())
            })
            .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn split_categories(raw: &str) -> Vec<String> {
    let categories: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .map(str::to_string)
        .collect();

    if categories.is_empty() {
        // API vẫn nhận `category=` rỗng, giữ đúng một URL.
        vec![String::new()]
    } else {
        categories
    }
}

/// Định dạng giờ có múi giờ, giây là tùy chọn (`Z` hoặc `+hh:mm`).
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"];

/// Không có múi giờ thì coi là UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

fn parse_day(raw: &str) -> Result<NaiveDate, TimeMachineError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| TimeMachineError::InvalidDate(raw.to_string()))
}

fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
