//! Thành phần giao diện time machine cho môi trường WebAssembly.

#[cfg(target_arch = "wasm32")]
mod styles;

use timemachine_core::{Category, Palette};

/// Ký hiệu hiển thị cho danh mục đã biết.
pub fn category_glyph(category: &Category) -> Option<&'static str> {
    match category {
        Category::NewsItem => Some("📰"),
        Category::RadioSong => Some("🎵"),
        Category::CinemaMovie => Some("🎬"),
        Category::Other(_) => None,
    }
}

/// Giá trị thuộc tính `style` gán bảng màu vào biến CSS.
pub fn palette_style(palette: &Palette) -> String {
    palette
        .css_variables()
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use std::rc::Rc;
    use std::time::Duration;

    use crate::{category_glyph, palette_style, styles};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use serde::Deserialize;
    use serde_wasm_bindgen::from_value;
    use timemachine_api::{HistoryBatch, HistoryClient};
    use timemachine_core::{
        HistoryParams, HistoryQuery, Palette, Tile, TileImage, TimeMachineConfig,
    };
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{spawn_local, JsFuture};
    use web_sys::{console, Document, Element, Window};
    use yew::prelude::*;

    #[derive(Clone, PartialEq)]
    enum LoadState {
        Loading,
        Loaded(HistoryBatch),
        Failed(String),
    }

    /// Client dùng chung; so sánh theo con trỏ để làm prop.
    #[derive(Clone)]
    struct SharedClient(Rc<HistoryClient>);

    impl PartialEq for SharedClient {
        fn eq(&self, other: &Self) -> bool {
            Rc::ptr_eq(&self.0, &other.0)
        }
    }

    #[derive(Properties, PartialEq)]
    pub struct TimeMachineProps {
        pub query: HistoryQuery,
        pub config: TimeMachineConfig,
        pub palette: Palette,
    }

    #[function_component(TimeMachineView)]
    fn time_machine_view(props: &TimeMachineProps) -> Html {
        use_effect_with((), |_| {
            if let Some(window) = web_sys::window() {
                if let Some(document) = window.document() {
                    if let Err(err) = styles::ensure_styles(&document) {
                        console::error_1(&err);
                    }
                }
            }
            || ()
        });

        let client = use_memo(props.config.clone(), |config| {
            SharedClient(Rc::new(HistoryClient::new(config.clone())))
        });
        let state = use_state(|| LoadState::Loading);

        {
            let client = (*client).clone();
            let state = state.clone();
            use_effect_with(props.query.clone(), move |query| {
                let query = query.clone();
                spawn_local(async move {
                    let mut rng = SmallRng::seed_from_u64(js_seed());
                    match client.0.fetch_history(&query, &mut rng).await {
                        Ok(Some(batch)) => state.set(LoadState::Loaded(batch)),
                        Ok(None) => console::debug_1(&"fetchHistory: đang tải, bỏ qua".into()),
                        Err(err) => {
                            console::error_1(&format!("{err}").into());
                            state.set(LoadState::Failed(err.to_string()));
                        }
                    }
                });
                || ()
            });
        }

        let body = match &*state {
            LoadState::Loading => html! {
                <div class="time-machine-status" aria-busy="true">{"Đang tải..."}</div>
            },
            LoadState::Failed(message) => html! {
                <div class="time-machine-status" role="alert">{ message.clone() }</div>
            },
            LoadState::Loaded(batch) => render_batch(batch, &props.config, &client),
        };

        html! {
            <div class="time-machine" style={palette_style(&props.palette)}>
                { body }
            </div>
        }
    }

    fn render_batch(batch: &HistoryBatch, config: &TimeMachineConfig, client: &SharedClient) -> Html {
        let tiles = batch.tiles(config);
        html! {
            <>
                <div class="time-machine-masonry">
                    {
                        for tiles.into_iter().enumerate().map(|(index, tile)| {
                            let key = tile.id.clone().unwrap_or_else(|| format!("tile-{index}"));
                            html! {
                                <TileView
                                    key={key}
                                    tile={tile}
                                    config={config.clone()}
                                    client={client.clone()}
                                />
                            }
                        })
                    }
                </div>
                {
                    batch.attribution().map(|line| html! {
                        <div class="time-machine-sources">{ line }</div>
                    }).unwrap_or_default()
                }
            </>
        }
    }

    #[derive(Properties, PartialEq)]
    struct TileViewProps {
        tile: Tile,
        config: TimeMachineConfig,
        client: SharedClient,
    }

    #[function_component(TileView)]
    fn tile_view(props: &TileViewProps) -> Html {
        let tile = &props.tile;
        let image = use_mut_ref(|| {
            tile.src
                .as_deref()
                .map(|src| TileImage::new(tile, src, &props.config))
        });
        let src = use_state(|| tile.src.clone());

        let on_error = {
            let image = image.clone();
            let src = src.clone();
            let client = props.client.clone();
            let tile_id = tile.id.clone();
            Callback::from(move |_: Event| {
                let plan = match image.borrow_mut().as_mut() {
                    Some(image) => {
                        console::info_1(
                            &format!("image load error {:?} {}", tile_id, image.src()).into(),
                        );
                        image.on_load_error()
                    }
                    None => None,
                };
                let Some(plan) = plan else {
                    return;
                };

                if let Some(report) = plan.report.clone() {
                    let client = client.clone();
                    spawn_local(async move {
                        if let Err(err) = client.0.report_broken_image(&report).await {
                            console::warn_1(&format!("{err}").into());
                        }
                    });
                }

                let image = image.clone();
                let src = src.clone();
                spawn_local(async move {
                    sleep(plan.delay).await;
                    if let Some(image) = image.borrow_mut().as_mut() {
                        image.apply(&plan);
                    }
                    src.set(Some(plan.placeholder));
                });
            })
        };

        let class = classes!("time-machine-tile", tile.has_image().then_some("with-image"));
        html! {
            <div class={class} data-id={tile.id.clone()}>
                <div class="time-machine-tile-content">
                    {
                        tile.title.as_ref().map(|title| html! {
                            <h1 class="time-machine-tile-title">{ title.clone() }</h1>
                        }).unwrap_or_default()
                    }
                    {
                        tile.icon_category().and_then(category_glyph).map(|glyph| html! {
                            <span class="category-icon" aria-hidden="true">{ glyph }</span>
                        }).unwrap_or_default()
                    }
                    {
                        (*src).clone().map(|src| html! {
                            <img src={src} onerror={on_error} />
                        }).unwrap_or_default()
                    }
                    {
                        tile.text.as_ref().map(|text| html! {
                            <p>{ text.clone() }</p>
                        }).unwrap_or_default()
                    }
                </div>
                <hr />
            </div>
        }
    }

    async fn sleep(delay: Duration) {
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().map(|window| {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
            });
            if !matches!(scheduled, Some(Ok(_))) {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    fn js_seed() -> u64 {
        (js_sys::Math::random() * u64::MAX as f64) as u64
    }

    #[derive(Deserialize, Default)]
    #[serde(rename_all = "camelCase", default)]
    struct MountOptions {
        config: Option<TimeMachineConfig>,
        color_palette: Option<String>,
    }

    /// Gắn time machine vào phần tử theo `selector`.
    ///
    /// `params` là `{ country, category, emotion, impact, date, from, to }`,
    /// `options` là `{ config, colorPalette }` (không bắt buộc).
    #[wasm_bindgen]
    pub fn mount_time_machine(
        selector: &str,
        params: JsValue,
        options: Option<JsValue>,
    ) -> Result<(), JsValue> {
        let window: Window =
            web_sys::window().ok_or_else(|| JsValue::from_str("Không có window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Không truy cập được document"))?;

        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Selector lỗi: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("Không tìm thấy element theo selector"))?;

        let params: HistoryParams = from_value(params)?;
        let query = HistoryQuery::from_params(&params)
            .map_err(|err| JsValue::from_str(&format!("Time machine error: {err}")))?;

        let options: MountOptions = match options {
            Some(value) if !value.is_undefined() && !value.is_null() => from_value(value)?,
            _ => MountOptions::default(),
        };
        let palette = match options.color_palette.as_deref() {
            Some(raw) => Palette::from_json(raw).unwrap_or_else(|err| {
                console::error_1(&format!("Could not parse color palette ({err})").into());
                Palette::default()
            }),
            None => Palette::default(),
        };

        yew::Renderer::<TimeMachineView>::with_root_and_props(
            target,
            TimeMachineProps {
                query,
                config: options.config.unwrap_or_default(),
                palette,
            },
        )
        .render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::mount_time_machine;

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_time_machine(
    _: &str,
    _: wasm_bindgen::JsValue,
    _: Option<wasm_bindgen::JsValue>,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "timemachine-ui chỉ hỗ trợ biên dịch target wasm32",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyphs_cover_known_categories_only() {
        assert_eq!(category_glyph(&Category::RadioSong), Some("🎵"));
        assert_eq!(category_glyph(&Category::Other("podcast".into())), None);
    }

    #[test]
    fn palette_style_sets_every_variable() {
        let style = palette_style(&Palette::default());
        assert!(style.starts_with("--time-machine-background-color: white;"));
        assert!(style.contains("--time-machine-text-color: #1f3b6c;"));
        assert_eq!(style.matches(';').count(), 6);
    }
}
