use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flipbook_engine::{decode_data_uri, default_engine, inspect_source, DocumentSource};
use flipbook_viewer::{
    CancellationToken, DirectoryDownloader, FlipbookConfig, LoadOutcome, PageFlip, Viewer,
};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "flipbook")]
#[command(about = "Page-flip PDF viewer")]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Rasterize every page into PNG files.
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Pixels per PDF point.
        #[arg(long)]
        scale: Option<f32>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Load a document and print the viewer.
    View {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// 1-based page to flip to after loading.
        #[arg(long, allow_negative_numbers = true)]
        page: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Save a copy of the document under its download name.
    Download {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "DIR")]
        to: PathBuf,
        #[arg(long)]
        filename: Option<String>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    page_count: u32,
    path: String,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    let base = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { file } => run_info(&file).await,
        Commands::Render { file, scale, out_dir } => {
            let mut config = for_document(base, &file)?;
            if let Some(scale) = scale {
                config = config.with_render_scale(scale);
            }
            config.validate()?;
            run_render(config, &file, out_dir.as_deref()).await
        }
        Commands::View { file, page, json } => {
            let config = for_document(base, &file)?;
            config.validate()?;
            run_view(config, page, json).await
        }
        Commands::Download { file, to, filename } => {
            let mut config = for_document(base, &file)?;
            if let Some(filename) = filename {
                config = config.with_download_filename(filename);
            }
            config.validate()?;
            run_download(config, &to).await
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<FlipbookConfig> {
    let config = match path {
        Some(path) => FlipbookConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => FlipbookConfig::default(),
    };

    Ok(config.apply_env()?)
}

fn for_document(config: FlipbookConfig, file: &Path) -> Result<FlipbookConfig> {
    ensure_pdf_exists(file)?;
    Ok(FlipbookConfig { document_url: file.display().to_string(), ..config })
}

async fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let info =
        inspect_source(&DocumentSource::from(file)).await.context("failed to open PDF")?;

    let payload = InfoOutput { page_count: info.page_count(), path: file.display().to_string() };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

/// Mounts a viewer over PDFium and fails unless the load completed.
async fn mount(config: FlipbookConfig) -> Result<Viewer<PageFlip>> {
    let mut engine = default_engine();
    let mut viewer = Viewer::new(config, PageFlip::new());
    let token = CancellationToken::new();
    tracing::debug!(document = %viewer.config().document_url, "mounting viewer");

    match viewer.mount(&mut engine, &token).await {
        LoadOutcome::Loaded { .. } | LoadOutcome::AlreadyLoaded => Ok(viewer),
        LoadOutcome::Failed(err) => Err(anyhow::Error::new(err).context("failed to open PDF")),
        LoadOutcome::Unavailable => anyhow::bail!(
            "no rasterization backend is available: install PDFium or set FLIPBOOK_LIBRARY_DIR"
        ),
        LoadOutcome::Cancelled => anyhow::bail!("load was cancelled"),
    }
}

async fn run_render(config: FlipbookConfig, file: &Path, out_dir: Option<&Path>) -> Result<()> {
    let viewer = mount(config).await?;

    let out_dir = out_dir.map(ToOwned::to_owned).unwrap_or_else(|| default_output_dir(file));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    for page in viewer.state().pages() {
        let png = decode_data_uri(&page.data_uri)?;
        let output = out_dir.join(format!("page-{}.png", page.page_number));
        fs::write(&output, png)
            .with_context(|| format!("failed to write image to {}", output.display()))?;
        println!("{}", output.display());
    }

    Ok(())
}

async fn run_view(config: FlipbookConfig, page: Option<i64>, json: bool) -> Result<()> {
    let mut viewer = mount(config).await?;

    if let Some(page) = page {
        viewer.jump(page);
        viewer.sync();
    }

    let view = viewer.view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{view}");
    }

    Ok(())
}

async fn run_download(config: FlipbookConfig, to: &Path) -> Result<()> {
    let request = flipbook_viewer::DownloadRequest::from_config(&config);
    let written = DirectoryDownloader::new(to)
        .save(&request)
        .await
        .with_context(|| format!("failed to download {}", request.url))?;

    println!("{}", written.display());

    Ok(())
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn default_output_dir(file: &Path) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("document");

    file.with_file_name(format!("{stem}-pages"))
}
