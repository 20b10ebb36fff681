//! Logic lõi của time machine: mô hình incident, dựng URL truy vấn, tile và nguồn tin.

mod model;
mod palette;
mod query;
mod sources;
mod tile;

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use model::{Category, HistoryResponse, Incident};
pub use palette::{Palette, DEFAULT_PALETTE};
pub use query::{DateSelector, HistoryParams, HistoryQuery};
pub use sources::SourceSet;
pub use tile::{BrokenImageReport, FallbackPlan, Tile, TileImage};

/// API công khai mặc định.
pub const DEFAULT_API_URL: &str = "https://public.api.v0.tee-e.com";

/// Ảnh thay thế mặc định khi ảnh gốc không tải được.
pub const DEFAULT_NO_IMAGE_SRC: &str = "data:image/svg+xml;utf8,%3Csvg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 400 300'%3E%3Crect width='400' height='300' fill='%23e5e7eb'/%3E%3Cpath d='M120 210l60-70 45 50 35-30 60 50z' fill='%239ca3af'/%3E%3Ccircle cx='270' cy='110' r='22' fill='%239ca3af'/%3E%3C/svg%3E";

/// Cấu hình widget, mọi trường đều có giá trị mặc định.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeMachineConfig {
    /// Địa chỉ gốc của API lịch sử.
    pub api_url: String,
    /// Số incident tối đa cho mỗi URL.
    pub limit: u32,
    /// Ảnh thay thế do người nhúng cấu hình.
    pub no_image_src: Option<String>,
    /// Gửi báo cáo ảnh hỏng về API.
    pub report_broken_images: bool,
    /// Thời gian chờ (ms) trước khi đổi sang ảnh thay thế.
    pub fallback_delay_ms: u64,
    /// Trộn ngẫu nhiên danh sách incident.
    pub shuffle: bool,
    /// Hiển thị biểu tượng danh mục trên từng tile.
    pub show_icons: bool,
}

impl Default for TimeMachineConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            limit: 20,
            no_image_src: None,
            report_broken_images: false,
            fallback_delay_ms: 250,
            shuffle: false,
            show_icons: false,
        }
    }
}

impl TimeMachineConfig {
    /// Ảnh thay thế thực sự được dùng: cấu hình riêng hoặc ảnh mặc định.
    pub fn placeholder(&self) -> &str {
        match self.no_image_src.as_deref() {
            Some(src) if !src.is_empty() => src,
            _ => DEFAULT_NO_IMAGE_SRC,
        }
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }

    /// `api_url` không kèm dấu `/` cuối.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

/// Trộn ngẫu nhiên danh sách incident tại chỗ.
pub fn shuffle_incidents<R: Rng + ?Sized>(incidents: &mut [Incident], rng: &mut R) {
    incidents.shuffle(rng);
}

/// Lỗi chung của time machine.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimeMachineError {
    #[error("No correct date or period specified.")]
    MissingPeriod,
    #[error("Ngày không hợp lệ: {0}")]
    InvalidDate(String),
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn placeholder_prefers_configured_source() {
        let mut config = TimeMachineConfig::default();
        assert_eq!(config.placeholder(), DEFAULT_NO_IMAGE_SRC);

        config.no_image_src = Some(String::new());
        assert_eq!(config.placeholder(), DEFAULT_NO_IMAGE_SRC);

        config.no_image_src = Some("https://cdn.example/none.png".into());
        assert_eq!(config.placeholder(), "https://cdn.example/none.png");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: TimeMachineConfig =
            serde_json::from_str(r#"{ "limit": 5, "shuffle": true }"#).unwrap();
        assert_eq!(config.limit, 5);
        assert!(config.shuffle);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.fallback_delay(), Duration::from_millis(250));
    }

    #[test]
    fn api_base_drops_trailing_slash() {
        let config = TimeMachineConfig {
            api_url: "http://localhost:8080//".into(),
            ..TimeMachineConfig::default()
        };
        assert_eq!(config.api_base(), "http://localhost:8080");
    }

    #[test]
    fn shuffle_keeps_every_incident() {
        let mut incidents: Vec<Incident> = (0..16)
            .map(|i| Incident {
                id: Some(i.to_string()),
                ..Incident::default()
            })
            .collect();
        let mut rng = SmallRng::seed_from_u64(7);
        shuffle_incidents(&mut incidents, &mut rng);

        let mut ids: Vec<u32> = incidents
            .iter()
            .map(|incident| incident.id.as_deref().unwrap().parse().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..16).collect::<Vec<_>>());
    }
}
