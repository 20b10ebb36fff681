//! Bridge WASM <-> JavaScript trung lập framework.

use std::future::Future;
use std::rc::Rc;

use js_sys::Promise;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use timemachine_api::{
    ApiError, HistoryBatch, HistoryClient, HistoryFetcher, HttpSource, IncidentSource,
};
use timemachine_core::{
    HistoryParams, HistoryQuery, Incident, Palette, SourceSet, TimeMachineConfig,
    TimeMachineError,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct JsTimeMachineConfig {
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    no_image_src: Option<String>,
    #[serde(default)]
    report_broken_images: Option<bool>,
    #[serde(default)]
    fallback_delay_ms: Option<u64>,
    #[serde(default)]
    shuffle: Option<bool>,
    #[serde(default)]
    show_icons: Option<bool>,
}

impl From<JsTimeMachineConfig> for TimeMachineConfig {
    fn from(cfg: JsTimeMachineConfig) -> Self {
        let mut base = TimeMachineConfig::default();
        if let Some(api_url) = cfg.api_url {
            base.api_url = api_url;
        }
        if let Some(limit) = cfg.limit {
            base.limit = limit;
        }
        if cfg.no_image_src.is_some() {
            base.no_image_src = cfg.no_image_src;
        }
        if let Some(report) = cfg.report_broken_images {
            base.report_broken_images = report;
        }
        if let Some(delay) = cfg.fallback_delay_ms {
            base.fallback_delay_ms = delay;
        }
        if let Some(shuffle) = cfg.shuffle {
            base.shuffle = shuffle;
        }
        if let Some(show_icons) = cfg.show_icons {
            base.show_icons = show_icons;
        }
        base
    }
}

#[derive(Serialize)]
struct JsHistory<'a> {
    incidents: &'a [Incident],
    sources: &'a SourceSet,
    attribution: Option<String>,
}

impl<'a> From<&'a HistoryBatch> for JsHistory<'a> {
    fn from(batch: &'a HistoryBatch) -> Self {
        Self {
            incidents: &batch.incidents,
            sources: &batch.sources,
            attribution: batch.attribution(),
        }
    }
}

fn read_config(config: Option<JsValue>) -> Result<TimeMachineConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsTimeMachineConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            Ok(TimeMachineConfig::from(cfg))
        }
        _ => Ok(TimeMachineConfig::default()),
    }
}

fn read_query(params: JsValue) -> Result<HistoryQuery, JsValue> {
    let params: HistoryParams = from_value(params)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được tham số: {err}")))?;
    HistoryQuery::from_params(&params).map_err(|err| JsValue::from_str(&format_query_error(err)))
}

/// Danh sách URL sẽ được gọi cho bộ tham số `params`.
#[wasm_bindgen]
pub fn build_history_urls(params: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    let cfg = read_config(config)?;
    let query = read_query(params)?;
    to_value(&query.urls(&cfg))
        .map_err(|err| JsValue::from_str(&format!("Không serialize URL: {err}")))
}

/// Gom nguồn tin của một mảng incident.
#[wasm_bindgen]
pub fn aggregate_sources(incidents: JsValue) -> Result<JsValue, JsValue> {
    let incidents: Vec<Incident> = from_value(incidents)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được incidents: {err}")))?;
    let batch = HistoryBatch::new(incidents);
    to_value(&JsHistory::from(&batch))
        .map_err(|err| JsValue::from_str(&format!("Không serialize nguồn tin: {err}")))
}

/// Bảng màu từ chuỗi JSON, sai định dạng thì trả bảng mặc định.
#[wasm_bindgen]
pub fn parse_palette(json: &str) -> Result<JsValue, JsValue> {
    let palette = Palette::from_json(json).unwrap_or_else(|err| {
        console_error(&format!("Could not parse color palette ({err})"));
        Palette::default()
    });
    to_value(&palette).map_err(|err| JsValue::from_str(&format!("Không serialize bảng màu: {err}")))
}

/// Một fetcher dùng chung giữa các lần gọi, nhờ đó cờ in-flight có hiệu lực.
struct SharedFetcher<S>(Rc<HistoryFetcher<S>>);

impl<S: IncidentSource + 'static> SharedFetcher<S> {
    fn new(fetcher: HistoryFetcher<S>) -> Self {
        Self(Rc::new(fetcher))
    }

    fn config(&self) -> &TimeMachineConfig {
        self.0.config()
    }

    fn is_loading(&self) -> bool {
        self.0.is_loading()
    }

    /// `Ok(None)` khi lần tải trước vẫn đang chạy.
    fn fetch(
        &self,
        query: HistoryQuery,
        seed: u64,
    ) -> impl Future<Output = Result<Option<HistoryBatch>, ApiError>> + 'static {
        let fetcher = Rc::clone(&self.0);
        async move {
            let mut rng = SmallRng::seed_from_u64(seed);
            fetcher.fetch_history(&query, &mut rng).await
        }
    }
}

/// Time machine gắn với một cấu hình; giữ một client cho mọi lần tải.
#[wasm_bindgen]
pub struct TimeMachine {
    fetcher: SharedFetcher<HttpSource>,
}

#[wasm_bindgen]
impl TimeMachine {
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<JsValue>) -> Result<TimeMachine, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        let cfg = read_config(config)?;
        Ok(Self {
            fetcher: SharedFetcher::new(HistoryClient::new(cfg)),
        })
    }

    #[wasm_bindgen(getter, js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.fetcher.is_loading()
    }

    /// URL sẽ được gọi cho `params` với cấu hình của instance này.
    pub fn urls(&self, params: JsValue) -> Result<JsValue, JsValue> {
        let query = read_query(params)?;
        to_value(&query.urls(self.fetcher.config()))
            .map_err(|err| JsValue::from_str(&format!("Không serialize URL: {err}")))
    }

    /// Promise của `{ incidents, sources, attribution }`, hoặc `null` nếu
    /// lần tải trước chưa xong.
    #[wasm_bindgen(js_name = fetchHistory)]
    pub fn fetch_history(&self, params: JsValue) -> Result<Promise, JsValue> {
        let query = read_query(params)?;
        let pending = self.fetcher.fetch(query, js_seed());

        Ok(future_to_promise(async move {
            match pending.await {
                Ok(Some(batch)) => to_value(&JsHistory::from(&batch))
                    .map_err(|err| JsValue::from_str(&format!("Không serialize lịch sử: {err}"))),
                Ok(None) => Ok(JsValue::NULL),
                Err(err) => Err(JsValue::from_str(&format_api_error(err))),
            }
        }))
    }
}

fn js_seed() -> u64 {
    (js_random() * u64::MAX as f64) as u64
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Math, js_name = random)]
    fn js_random() -> f64;

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(message: &str);
}

fn format_query_error(err: TimeMachineError) -> String {
    format!("Time machine error: {err}")
}

fn format_api_error(err: ApiError) -> String {
    format!("History API error: {err}")
}
