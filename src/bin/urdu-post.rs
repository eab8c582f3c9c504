use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use urdu_post::{
    CpuRasterizer, DirectorySink, EditorController, ExportSurface, Exporter, FieldUpdate,
    FontBook, FontsLoaded, GeminiGenerator, ImageSlot, PostConfig, PreparedAssetStore,
    QuoteGenerator, StudioSettings, clamp_update, is_font_file_name,
};

#[derive(Parser, Debug)]
#[command(name = "urdu-post", version)]
struct Cli {
    /// Settings JSON (defaults apply when omitted).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the default document.
    Init(InitArgs),
    /// Print the composed layer stack as JSON.
    Layers(LayersArgs),
    /// Print a generated quote.
    Generate(GenerateArgs),
    /// Edit a document and export it as PNG.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Output document path.
    #[arg(long, default_value = "post.json")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct LayersArgs {
    /// Input document JSON.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Quote topic.
    #[arg(long)]
    topic: String,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input document JSON; a fresh document when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Field assignment, e.g. `fontSize=40` or `imageUrl=` to clear. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    sets: Vec<String>,

    /// Image upload, e.g. `subject=me.png`. Slots: subject, text-background, background, footer.
    #[arg(long = "image", value_name = "SLOT=PATH")]
    images: Vec<String>,

    /// Font file to install and select. Repeatable; the last one wins.
    #[arg(long = "font", value_name = "PATH")]
    fonts: Vec<PathBuf>,

    /// Preset theme index.
    #[arg(long)]
    theme: Option<usize>,

    /// Pick a random stock background.
    #[arg(long)]
    random_background: bool,

    /// Generate the quote for this topic before exporting.
    #[arg(long)]
    topic: Option<String>,

    /// Output directory (overrides settings).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Write the edited document here as well.
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = StudioSettings::load(cli.settings.as_deref())?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;

    match cli.cmd {
        Command::Init(args) => cmd_init(args),
        Command::Layers(args) => rt.block_on(cmd_layers(args, &settings)),
        Command::Generate(args) => rt.block_on(cmd_generate(args, &settings)),
        Command::Render(args) => rt.block_on(cmd_render(args, &settings)),
    }
}

fn write_config(config: &PostConfig, path: &Path) -> anyhow::Result<()> {
    let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
    config.to_writer_pretty(BufWriter::new(f))?;
    Ok(())
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    write_config(&PostConfig::new_session(), &args.out)?;
    println!("{}", args.out.display());
    Ok(())
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("urdu-post/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("build http client")
}

fn generator(settings: &StudioSettings, client: reqwest::Client) -> GeminiGenerator {
    GeminiGenerator::new(
        client,
        settings.gemini_endpoint.clone(),
        settings.gemini_model.clone(),
        settings.api_key.clone(),
    )
}

async fn cmd_layers(args: LayersArgs, settings: &StudioSettings) -> anyhow::Result<()> {
    let config = PostConfig::from_path(&args.config)?;
    let root = asset_root(settings, Some(args.config.as_path()));
    let assets = PreparedAssetStore::prepare(&config, root, &http_client()?).await;
    let controller = EditorController::new(config);
    let stack = controller.layer_stack(&assets, settings.compose_opts());
    println!("{}", stack.to_json_pretty()?);
    Ok(())
}

async fn cmd_generate(args: GenerateArgs, settings: &StudioSettings) -> anyhow::Result<()> {
    let quote = generator(settings, http_client()?)
        .generate(&args.topic)
        .await?;
    println!("{quote}");
    Ok(())
}

/// Relative image paths resolve against the document's directory unless settings say otherwise.
fn asset_root(settings: &StudioSettings, config_path: Option<&Path>) -> PathBuf {
    if settings.asset_root != Path::new(".") {
        return settings.asset_root.clone();
    }
    config_path
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn file_name_of(path: &Path) -> anyhow::Result<&str> {
    path.file_name()
        .and_then(|s| s.to_str())
        .with_context(|| format!("'{}' has no file name", path.display()))
}

async fn cmd_render(args: RenderArgs, settings: &StudioSettings) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => PostConfig::from_path(path)?,
        None => PostConfig::new_session(),
    };
    let mut controller = EditorController::new(config);

    for path in &args.fonts {
        let name = file_name_of(path)?;
        if !is_font_file_name(name) {
            anyhow::bail!("'{name}' is not a .ttf, .otf, .woff or .woff2 file");
        }
        let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
        let (family, _) = controller.ingest_font(bytes, name)?;
        tracing::info!(%family, "font selected");
    }

    for spec in &args.images {
        let (slot, path) = spec
            .split_once('=')
            .with_context(|| format!("expected SLOT=PATH, got '{spec}'"))?;
        let slot = ImageSlot::parse(slot).with_context(|| format!("unknown image slot '{slot}'"))?;
        let bytes = std::fs::read(path).with_context(|| format!("read '{path}'"))?;
        controller.ingest_image(slot, &bytes)?;
    }

    for assignment in &args.sets {
        controller.update_field(clamp_update(FieldUpdate::parse_assignment(assignment)?));
    }

    if let Some(index) = args.theme {
        controller.set_theme(index);
    }

    if args.random_background {
        if let Some(url) = controller.pick_random_background() {
            tracing::info!(%url, "random background");
        }
    }

    let client = http_client()?;

    if let Some(topic) = &args.topic {
        let generator = generator(settings, client.clone());
        if let Err(e) = controller.generate_quote(topic, &generator).await {
            // The document keeps its previous quote.
            tracing::warn!(error = %e, "quote generation failed");
        }
    }

    if let Some(path) = &args.save_config {
        write_config(controller.config(), path)?;
    }

    let font_dirs = settings.font_dirs.clone();
    let system_fonts = settings.system_fonts;
    let root = asset_root(settings, args.config.as_deref());
    let (font_book, assets) = tokio::join!(
        tokio::task::spawn_blocking(move || FontBook::load(&font_dirs, system_fonts)),
        PreparedAssetStore::prepare(controller.config(), root, &client),
    );
    let font_book = font_book.context("font loading task")?;

    let surface = ExportSurface {
        stack: controller.layer_stack(&assets, settings.compose_opts()),
        assets,
    };
    let mut rasterizer = CpuRasterizer::new(font_book);
    let mut sink = DirectorySink::new(
        args.out_dir
            .clone()
            .unwrap_or_else(|| settings.output_dir.clone()),
    );
    let exporter = Exporter::new(settings.export_opts());

    match exporter
        .export(Some(&surface), &FontsLoaded, &mut rasterizer, &mut sink)
        .await?
    {
        Some(outcome) => {
            tracing::info!(
                width = outcome.width,
                height = outcome.height,
                bytes = outcome.png_len,
                "export done"
            );
            println!("{}", outcome.path.display());
        }
        None => tracing::warn!("nothing exported"),
    }
    Ok(())
}
