use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Một bản ghi lịch sử (tin tức, bài hát radio, phim chiếu rạp).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Incident {
    pub id: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub source: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub image: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub audio: Vec<String>,
}

impl Incident {
    /// Ảnh đầu tiên, bỏ qua chuỗi rỗng.
    pub fn primary_image(&self) -> Option<&str> {
        self.image
            .first()
            .map(String::as_str)
            .filter(|src| !src.is_empty())
    }

    pub fn category_kind(&self) -> Option<Category> {
        self.category.as_deref().map(Category::from_wire)
    }
}

/// Thân phản hồi của API: `{ "results": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistoryResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<Incident>,
}

/// Danh mục incident, tương ứng với sub-endpoint của API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    NewsItem,
    RadioSong,
    CinemaMovie,
    Other(String),
}

impl Category {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "newsItem" => Self::NewsItem,
            "radioSong" => Self::RadioSong,
            "cinemaMovie" => Self::CinemaMovie,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            Self::NewsItem => "newsItem",
            Self::RadioSong => "radioSong",
            Self::CinemaMovie => "cinemaMovie",
            Self::Other(value) => value,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&value))
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
