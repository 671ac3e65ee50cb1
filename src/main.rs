use anyhow::Result;
use clap::Parser;
use skin_classifier::{
    config::{Config, DEFAULT_MODEL_PATH},
    image::{ImageLoader, ResultRanker},
    models::ModelManager,
    web::serve,
    ClassificationSession,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skin-classifier")]
#[command(about = "ONNX-powered skin condition image classifier")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,

    /// Path to the ONNX model
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model_path: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Classify a single image file and exit instead of serving
    #[arg(long)]
    image: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting skin condition classifier...");
    tracing::info!("Model path: {}", args.model_path);

    let config = Config::new(args.bind, args.model_path, args.dev)?;

    match args.image {
        Some(path) => classify_file(config, path).await,
        None => {
            tracing::info!("Bind address: {}", config.bind_addr);
            serve(config).await?;
            Ok(())
        }
    }
}

/// 单次分类模式：加载模型、分类图片、打印结果
async fn classify_file(config: Config, path: PathBuf) -> Result<()> {
    let manager = ModelManager::load(config)?;

    let session = ClassificationSession::default();
    session.set_model(manager.classifier());

    let image = ImageLoader::from_path(&path)?;
    let outcome = session.classify_image(image).await?;

    print!("{}", ResultRanker::format_plain_text(&outcome));
    Ok(())
}
