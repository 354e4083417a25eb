use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use cre8::{
    ClientStore, CreateOrderRequest, DirectorySink, Editor, FontBook, HttpApi, HttpImageFetcher,
    ImageFetcher, LocalImageFetcher, Side, StudioApi, StudioConfig, UploadFile, download_all,
};

#[derive(Parser, Debug)]
#[command(name = "cre8", version)]
struct Cli {
    /// JSON config file. Without it, defaults plus `CRE8_*` environment overrides are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lay out a product's designs and write per-layer and full-side PNGs.
    Compose(ComposeArgs),
    /// Run the full confirm flow: export, submit the order, save the files.
    Confirm(ConfirmArgs),
    /// Print the file-name prefix derived from the stored user.
    Slug,
    /// Request a new design for a product (prompt and/or uploaded image).
    CreateOrder(CreateOrderArgs),
}

#[derive(Parser, Debug)]
struct SessionArgs {
    /// Product id.
    #[arg(long)]
    product: String,

    /// Order id whose designs are loaded; the first design is placed.
    #[arg(long)]
    order: Option<String>,

    /// Design index to place instead of the first one.
    #[arg(long)]
    design: Option<String>,

    /// Text layers to add to the front side.
    #[arg(long = "text")]
    front_text: Vec<String>,

    /// Text layers to add to the back side.
    #[arg(long = "back-text")]
    back_text: Vec<String>,

    /// Font family for added text.
    #[arg(long)]
    font: Option<String>,

    /// Text color as `#RRGGBB`.
    #[arg(long, default_value = "#ffffff")]
    color: String,

    /// Serve images from this directory instead of over HTTP.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Surface container width in pixels (0 uses the configured default).
    #[arg(long, default_value_t = 0)]
    width: u32,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Output directory (defaults to the configured download directory).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ConfirmArgs {
    #[command(flatten)]
    session: SessionArgs,

    #[arg(long)]
    phone: Option<String>,

    /// Garment size (s, m, l, xl).
    #[arg(long)]
    size: Option<String>,

    /// Garment color (black, white).
    #[arg(long = "garment-color")]
    garment_color: Option<String>,
}

#[derive(Parser, Debug)]
struct CreateOrderArgs {
    #[arg(long)]
    product: String,

    #[arg(long)]
    prompt: Option<String>,

    /// Image to upload as the design source.
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long)]
    size: Option<String>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CRE8_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(p) => StudioConfig::from_path(p)?,
        None => {
            let cfg = StudioConfig::from_env();
            cfg.validate()?;
            cfg
        }
    };

    match cli.cmd {
        Command::Compose(args) => cmd_compose(config, args).await,
        Command::Confirm(args) => cmd_confirm(config, args).await,
        Command::Slug => {
            println!("{}", open_store(&config).identity_slug());
            Ok(())
        }
        Command::CreateOrder(args) => cmd_create_order(config, args).await,
    }
}

fn open_store(config: &StudioConfig) -> ClientStore {
    match &config.store_path {
        Some(p) => ClientStore::open(p),
        None => ClientStore::in_memory(),
    }
}

fn load_fonts(config: &StudioConfig) -> anyhow::Result<FontBook> {
    let book = match &config.fonts_dir {
        Some(dir) => FontBook::load_dir(dir)?,
        None => FontBook::empty(),
    };
    Ok(if config.system_fonts {
        book.with_system_fallback()
    } else {
        book
    })
}

fn http_api(config: &StudioConfig, store: &ClientStore) -> HttpApi {
    HttpApi::new(config.api_base(), store.access_token())
}

async fn open_session(
    config: StudioConfig,
    args: &SessionArgs,
    sink_dir: &Path,
) -> anyhow::Result<Editor> {
    let store = open_store(&config);
    let api = http_api(&config, &store);
    let fetcher: Arc<dyn ImageFetcher> = match &args.assets {
        Some(dir) => Arc::new(LocalImageFetcher::new(dir)),
        None => Arc::new(HttpImageFetcher::new(api.client().clone(), config.api_base())),
    };
    let fonts = load_fonts(&config)?;
    if fonts.is_empty() && !(args.front_text.is_empty() && args.back_text.is_empty()) {
        anyhow::bail!(
            "--text/--back-text need a font: set fonts_dir (CRE8_FONTS_DIR) or enable system_fonts"
        );
    }
    let timeout = config.background_timeout();

    let mut editor = Editor::new(
        config,
        Arc::new(api),
        fetcher,
        fonts,
        store,
        Box::new(DirectorySink::new(sink_dir)),
    );
    editor.initialize(args.width);
    editor
        .open(Some(args.product.as_str()), args.order.as_deref())
        .await;
    if editor.product().is_none() {
        anyhow::bail!("product '{}' could not be loaded", args.product);
    }
    if let Some(raw) = &args.design {
        editor.select_design_option(raw).await;
    }

    if let Some(font) = &args.font {
        editor.set_font(font.clone());
    }
    editor.set_color(args.color.clone());
    for text in &args.front_text {
        editor.set_text_input(text.clone());
        editor.add_text()?;
    }
    if !args.back_text.is_empty() {
        editor.switch_view(Side::Back);
        for text in &args.back_text {
            editor.set_text_input(text.clone());
            editor.add_text()?;
        }
        editor.switch_view(Side::Front);
    }
    editor.surface_mut().settle_background(timeout).await;
    Ok(editor)
}

async fn cmd_compose(config: StudioConfig, args: ComposeArgs) -> anyhow::Result<()> {
    let out = args.out.clone().unwrap_or_else(|| config.download_dir.clone());
    let mut editor = open_session(config, &args.session, &out).await?;

    let files = editor.export_all().await?.into_download_queue();
    let mut sink = DirectorySink::new(&out);
    let saved = download_all(&files, &mut sink);
    for name in &saved {
        eprintln!("wrote {}", out.join(name).display());
    }
    if saved.len() < files.len() {
        anyhow::bail!(
            "{} of {} files could not be written",
            files.len() - saved.len(),
            files.len()
        );
    }
    Ok(())
}

async fn cmd_confirm(config: StudioConfig, args: ConfirmArgs) -> anyhow::Result<()> {
    if args.session.order.is_none() {
        anyhow::bail!("confirm needs --order");
    }
    let out = config.download_dir.clone();
    let mut editor = open_session(config, &args.session, &out).await?;

    let form = editor.confirm_form_mut();
    form.phone_number = args.phone.unwrap_or_default();
    form.size = args.size;
    if args.garment_color.is_some() {
        form.color = args.garment_color;
    }
    editor.open_confirm();

    let outcome = editor.confirm_order().await;
    for notice in editor.take_notices() {
        eprintln!("[{:?}] {}", notice.level, notice.message);
    }
    let outcome = outcome?;
    for name in &outcome.downloads {
        eprintln!("saved {}", out.join(name).display());
    }
    println!("{}", outcome.route);
    Ok(())
}

async fn cmd_create_order(config: StudioConfig, args: CreateOrderArgs) -> anyhow::Result<()> {
    let store = open_store(&config);
    let api = http_api(&config, &store);

    let file = match &args.file {
        Some(p) => {
            let bytes = std::fs::read(p).with_context(|| format!("read '{}'", p.display()))?;
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_owned());
            let mime = match image::guess_format(&bytes) {
                Ok(image::ImageFormat::Png) => "image/png",
                Ok(image::ImageFormat::Jpeg) => "image/jpeg",
                Ok(image::ImageFormat::WebP) => "image/webp",
                _ => "application/octet-stream",
            };
            Some(UploadFile {
                name,
                mime: mime.to_owned(),
                bytes,
            })
        }
        None => None,
    };
    if args.prompt.is_none() && file.is_none() {
        anyhow::bail!("create-order needs --prompt or --file");
    }

    let response = api
        .create_order(CreateOrderRequest {
            product_id: args.product,
            prompt: args.prompt,
            file,
            size: args.size,
        })
        .await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
