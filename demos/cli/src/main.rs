use anyhow::Context;
use clap::Parser;
use timemachine_api::HistoryClient;
use timemachine_core::{HistoryParams, HistoryQuery, TimeMachineConfig, DEFAULT_API_URL};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "timemachine-cli",
    about = "Tải các incident lịch sử (tin tức, radio, phim) cho một ngày hoặc khoảng ngày."
)]
struct Args {
    /// Mã quốc gia, ví dụ NL.
    #[arg(short, long, default_value = "")]
    country: String,

    /// Danh mục, phân tách bằng dấu phẩy.
    #[arg(long, default_value = "newsItem,radioSong,cinemaMovie")]
    category: String,

    #[arg(long, default_value = "")]
    emotion: String,

    #[arg(long, default_value = "")]
    impact: String,

    /// Ngày cụ thể (YYYY-MM-DD), ưu tiên hơn --from/--to.
    #[arg(short, long)]
    date: Option<String>,

    #[arg(long)]
    from: Option<String>,

    #[arg(long)]
    to: Option<String>,

    #[arg(long, env = "TIMEMACHINE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Số incident tối đa cho mỗi danh mục.
    #[arg(long, env = "TIMEMACHINE_LIMIT", default_value_t = 20)]
    limit: u32,

    #[arg(long)]
    shuffle: bool,

    /// In kết quả dạng JSON thay vì danh sách tile.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn params(&self) -> HistoryParams {
        HistoryParams {
            country: Some(self.country.clone()),
            category: Some(self.category.clone()),
            emotion: Some(self.emotion.clone()),
            impact: Some(self.impact.clone()),
            date: self.date.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }

    fn config(&self) -> TimeMachineConfig {
        TimeMachineConfig {
            api_url: self.api_url.clone(),
            limit: self.limit,
            shuffle: self.shuffle,
            show_icons: true,
            ..TimeMachineConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("timemachine=info".parse()?))
        .init();

    let args = Args::parse();
    let query = HistoryQuery::from_params(&args.params()).context("Tham số ngày không hợp lệ")?;
    let config = args.config();

    for url in query.urls(&config) {
        tracing::debug!(%url, "planned request");
    }

    let client = HistoryClient::new(config.clone());
    let batch = client
        .fetch_history(&query, &mut rand::rng())
        .await
        .with_context(|| format!("Không tải được lịch sử từ {}", config.api_url))?
        .unwrap_or_default();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    for tile in batch.tiles(&config) {
        let icon = match tile.icon_category().map(|category| category.as_wire()) {
            Some("newsItem") => "[news]",
            Some("radioSong") => "[radio]",
            Some("cinemaMovie") => "[movie]",
            _ => "",
        };
        println!(
            "{icon} {}",
            tile.title.as_deref().unwrap_or("(không tiêu đề)")
        );
        if let Some(src) = &tile.src {
            println!("    image: {src}");
        }
        if let Some(text) = &tile.text {
            println!("    {text}");
        }
    }

    println!("Incidents: {}", batch.incidents.len());
    if let Some(line) = batch.attribution() {
        println!("{line}");
    }

    Ok(())
}
