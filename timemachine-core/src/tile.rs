use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Category, Incident, TimeMachineConfig};

/// Dữ liệu hiển thị của một thẻ trong lưới masonry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: Option<String>,
    pub src: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub category: Option<Category>,
    pub show_icon: bool,
}

impl Tile {
    pub fn from_incident(incident: &Incident, config: &TimeMachineConfig) -> Self {
        Self {
            id: incident.id.clone(),
            src: incident.primary_image().map(str::to_string),
            title: incident.title.clone().filter(|title| !title.is_empty()),
            text: incident.text.clone().filter(|text| !text.is_empty()),
            category: incident.category_kind(),
            show_icon: config.show_icons,
        }
    }

    pub fn has_image(&self) -> bool {
        self.src.is_some()
    }

    /// Danh mục cần vẽ biểu tượng, chỉ khi được bật và danh mục đã biết.
    pub fn icon_category(&self) -> Option<&Category> {
        self.category
            .as_ref()
            .filter(|category| self.show_icon && category.is_known())
    }
}

/// Báo cáo ảnh hỏng gửi về API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenImageReport {
    pub id: Option<String>,
    pub src: String,
}

/// Kế hoạch đổi sang ảnh thay thế sau khi ảnh gốc lỗi.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPlan {
    pub placeholder: String,
    pub delay: Duration,
    pub report: Option<BrokenImageReport>,
}

/// Trạng thái ảnh của một tile; mỗi tile đổi ảnh tối đa một lần.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    tile_id: Option<String>,
    src: String,
    placeholder: String,
    delay: Duration,
    report_broken: bool,
    pending: bool,
}

impl TileImage {
    pub fn new(tile: &Tile, src: &str, config: &TimeMachineConfig) -> Self {
        Self {
            tile_id: tile.id.clone(),
            src: src.to_string(),
            placeholder: config.placeholder().to_string(),
            delay: config.fallback_delay(),
            report_broken: config.report_broken_images,
            pending: false,
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn is_placeholder(&self) -> bool {
        self.src == self.placeholder
    }

    /// Gọi khi ảnh tải lỗi. `None` nếu đã ở ảnh thay thế hoặc đang chờ đổi.
    pub fn on_load_error(&mut self) -> Option<FallbackPlan> {
        if self.is_placeholder() || self.pending {
            return None;
        }
        self.pending = true;

        let report = self.report_broken.then(|| BrokenImageReport {
            id: self.tile_id.clone(),
            src: self.src.clone(),
        });

        Some(FallbackPlan {
            placeholder: self.placeholder.clone(),
            delay: self.delay,
            report,
        })
    }

    /// Áp dụng kế hoạch sau khi hết thời gian chờ.
    pub fn apply(&mut self, plan: &FallbackPlan) {
        self.src = plan.placeholder.clone();
        self.pending = false;
    }
}
