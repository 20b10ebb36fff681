use serde::{Deserialize, Serialize};

use crate::TimeMachineError;

/// Bảng màu mặc định khi trang nhúng không cung cấp hoặc cung cấp sai.
pub const DEFAULT_PALETTE: [&str; 6] = [
    "white", "#1f3b6c", "#42c0d9", "#6accdf", "#92d8e5", "#bae4eb",
];

/// Sáu màu theo thứ tự: nền, chính, phụ, và ba sắc độ nhấn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub background: String,
    pub primary: String,
    pub secondary: String,
    pub tertiary: String,
    pub quaternary: String,
    pub quinary: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_array(DEFAULT_PALETTE.map(str::to_string))
    }
}

impl Palette {
    /// Đọc mảng JSON sáu màu, ví dụ `["#fff", "#000", ...]`.
    pub fn from_json(raw: &str) -> Result<Self, TimeMachineError> {
        let colors: Vec<String> =
            serde_json::from_str(raw).map_err(|err| TimeMachineError::Parse(err.to_string()))?;
        let colors: [String; 6] = colors.try_into().map_err(|colors: Vec<String>| {
            TimeMachineError::Parse(format!("cần 6 màu, nhận {}", colors.len()))
        })?;
        Ok(Self::from_array(colors))
    }

    fn from_array(colors: [String; 6]) -> Self {
        let [background, primary, secondary, tertiary, quaternary, quinary] = colors;
        Self {
            background,
            primary,
            secondary,
            tertiary,
            quaternary,
            quinary,
        }
    }

    /// Cặp (biến CSS, giá trị) để gắn lên phần tử gốc.
    pub fn css_variables(&self) -> [(&'static str, &str); 6] {
        [
            ("--time-machine-background-color", self.background.as_str()),
            ("--time-machine-text-color", self.primary.as_str()),
            ("--time-machine-source-color", self.secondary.as_str()),
            ("--time-machine-ruler-color", self.tertiary.as_str()),
            ("--time-machine-title-background-color", self.quaternary.as_str()),
            ("--time-machine-text-background-color", self.quinary.as_str()),
        ]
    }
}
