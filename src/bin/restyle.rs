//! CLI for Restyle - bring-your-own-key image restyling.

use clap::{Args, Parser, Subcommand, ValueEnum};
use restyle::transform::providers::{GEMINI_PROMPTS, OPENAI_PROMPTS};
use restyle::transform::style::{style_name, DEFAULT_STYLE, STYLES};
use restyle::{
    FileStorage, ImageReference, InputImage, ProviderKind, SettingsPatch, SettingsStore,
    TransformPipeline, STORAGE_KEY,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "restyle")]
#[command(about = "Restyle images with your own OpenAI or Gemini API key")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform an image into a style
    Transform(TransformArgs),

    /// Show or change saved settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// List available styles
    Styles,

    /// List providers and their models
    Providers,
}

#[derive(Args)]
struct TransformArgs {
    /// Image to transform (JPG, PNG, WebP)
    input: PathBuf,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Style token (see `restyle styles`)
    #[arg(short, long, default_value = DEFAULT_STYLE)]
    style: String,

    /// Provider to use instead of the saved one
    #[arg(short, long, value_enum)]
    provider: Option<ProviderArg>,

    /// Model to use instead of the saved one
    #[arg(short, long)]
    model: Option<String>,

    /// Print a returned image URL instead of downloading it
    #[arg(long)]
    no_download: bool,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show saved settings (keys are masked)
    Show,

    /// Print the settings file location
    Path,

    /// Save the API key for a provider
    SetKey {
        /// Provider the key belongs to
        #[arg(value_enum)]
        provider: ProviderArg,
        /// The API key
        key: String,
    },

    /// Select a provider (also selects its default model)
    Provider {
        /// Provider to select
        #[arg(value_enum)]
        provider: ProviderArg,
    },

    /// Select a model for the current provider
    Model {
        /// Model identifier, e.g. dall-e-3
        model: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProviderArg {
    #[value(name = "openai")]
    OpenAi,
    Gemini,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::OpenAi => ProviderKind::OpenAi,
            ProviderArg::Gemini => ProviderKind::Gemini,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("restyle=warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut store = SettingsStore::open(FileStorage::open_default()?);

    match cli.command {
        Commands::Transform(args) => {
            transform_image(args, &store, cli.json).await?;
        }
        Commands::Config(command) => {
            run_config(command, &mut store, cli.json)?;
        }
        Commands::Styles => {
            list_styles(cli.json)?;
        }
        Commands::Providers => {
            list_providers(&store, cli.json)?;
        }
    }

    Ok(())
}

async fn transform_image(
    args: TransformArgs,
    store: &SettingsStore<FileStorage>,
    json_output: bool,
) -> anyhow::Result<()> {
    // Flags override the saved settings for this run only
    let mut settings = store.get().clone();
    if let Some(provider) = args.provider {
        let kind = ProviderKind::from(provider);
        if kind != settings.selected_provider {
            settings.apply(SettingsPatch::new().switch_provider(kind));
        }
    }
    if let Some(model) = args.model {
        settings.selected_model = model;
    }

    if !settings.is_configured() {
        anyhow::bail!(
            "Please configure your API key in settings: restyle config set-key {} <KEY>",
            settings.selected_provider
        );
    }

    let image = InputImage::from_path(&args.input)?;
    if !image.is_image() {
        anyhow::bail!("Please select a valid image file");
    }

    let prompts = match settings.selected_provider {
        ProviderKind::OpenAi => OPENAI_PROMPTS,
        ProviderKind::Gemini => GEMINI_PROMPTS,
    };
    if prompts.get(&args.style).is_none() {
        tracing::warn!(
            style = %args.style,
            fallback = prompts.default_style(),
            "unknown style, using default prompt"
        );
    }

    if !json_output {
        eprintln!(
            "Transforming image with {} ({})...",
            settings.selected_provider.display_name(),
            settings.selected_model
        );
    }

    let start = Instant::now();
    let pipeline = TransformPipeline::default();
    let result = pipeline
        .transform_with_settings(&settings, image, &args.style)
        .await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let image = match result.into_result() {
        Ok(image) => image,
        Err(message) => {
            if json_output {
                let result = serde_json::json!({
                    "success": false,
                    "error": message,
                    "provider": settings.selected_provider.to_string(),
                    "model": settings.selected_model,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            anyhow::bail!("Failed to transform image: {message}");
        }
    };

    let (url, size_bytes) = match &image {
        ImageReference::Blob(blob) => {
            blob.save(&args.output)?;
            (None, Some(blob.size()))
        }
        ImageReference::Url(url) if args.no_download => (Some(url.clone()), None),
        ImageReference::Url(url) => {
            let bytes = download(url).await?;
            std::fs::write(&args.output, &bytes)?;
            (Some(url.clone()), Some(bytes.len()))
        }
    };
    let output = size_bytes.map(|_| args.output.display().to_string());

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "output": output,
            "url": url,
            "size_bytes": size_bytes,
            "style": args.style,
            "provider": settings.selected_provider.to_string(),
            "model": settings.selected_model,
            "duration_ms": duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match (&output, &url) {
            (Some(path), _) => println!(
                "Transformed image: {} ({} bytes) via {}",
                path,
                size_bytes.unwrap_or_default(),
                settings.selected_provider
            ),
            (None, Some(url)) => println!("Transformed image: {}", url),
            (None, None) => {}
        }
        println!("Duration: {}ms", duration_ms);
    }

    Ok(())
}

async fn download(url: &str) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        anyhow::bail!(
            "Failed to download image from URL: HTTP {}",
            response.status().as_u16()
        );
    }
    Ok(response.bytes().await?.to_vec())
}

fn run_config(
    command: ConfigCommand,
    store: &mut SettingsStore<FileStorage>,
    json_output: bool,
) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            let redacted = store.get().redacted();
            if json_output {
                println!("{}", serde_json::to_string_pretty(&redacted)?);
            } else {
                let unset = |key: &str| {
                    if key.is_empty() {
                        "(not set)".to_string()
                    } else {
                        key.to_string()
                    }
                };
                println!("Provider:       {}", redacted.selected_provider);
                println!("Model:          {}", redacted.selected_model);
                println!("OpenAI API key: {}", unset(&redacted.openai_api_key));
                println!("Gemini API key: {}", unset(&redacted.gemini_api_key));
                println!(
                    "Configured:     {}",
                    if store.is_configured() { "yes" } else { "no" }
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", store.storage().path_for(STORAGE_KEY).display());
        }
        ConfigCommand::SetKey { provider, key } => {
            let kind = ProviderKind::from(provider);
            store.update(SettingsPatch::new().api_key(kind, key.trim()))?;
            println!("Saved {} API key", kind.display_name());
        }
        ConfigCommand::Provider { provider } => {
            let kind = ProviderKind::from(provider);
            store.update(SettingsPatch::new().switch_provider(kind))?;
            println!(
                "Selected {} with model {}",
                kind.display_name(),
                store.get().selected_model
            );
        }
        ConfigCommand::Model { model } => {
            let kind = store.get().selected_provider;
            if !kind.supports_model(&model) {
                eprintln!(
                    "warning: {} is not a known {} model (known: {})",
                    model,
                    kind.display_name(),
                    kind.models().join(", ")
                );
            }
            store.update(SettingsPatch::new().selected_model(model))?;
            println!("Selected model {}", store.get().selected_model);
        }
    }

    Ok(())
}

fn list_styles(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct StyleInfo {
        id: &'static str,
        name: &'static str,
        default: bool,
    }

    let styles: Vec<StyleInfo> = STYLES
        .iter()
        .map(|&(id, name)| StyleInfo {
            id,
            name,
            default: id == DEFAULT_STYLE,
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&styles)?);
    } else {
        println!("Available styles:\n");
        for style in &styles {
            let marker = if style.default { " (default)" } else { "" };
            println!("  {:<14} {}{}", style.id, style.name, marker);
        }
        let extra: Vec<&str> = OPENAI_PROMPTS
            .tokens()
            .filter(|t| style_name(t).is_none())
            .collect();
        println!("\nAlso accepted: {}", extra.join(", "));
    }

    Ok(())
}

fn list_providers(store: &SettingsStore<FileStorage>, json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ProviderInfo {
        name: &'static str,
        kind: &'static str,
        models: &'static [&'static str],
        default_model: &'static str,
        configured: bool,
        selected: bool,
    }

    let settings = store.get();
    let providers: Vec<ProviderInfo> = ProviderKind::ALL
        .iter()
        .map(|kind| ProviderInfo {
            name: kind.display_name(),
            kind: kind.as_str(),
            models: kind.models(),
            default_model: kind.default_model(),
            configured: !settings.api_key_for(*kind).is_empty(),
            selected: settings.selected_provider == *kind,
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&providers)?);
    } else {
        println!("Available providers:\n");
        for p in &providers {
            let status = if p.configured { "✓" } else { "✗" };
            let selected = if p.selected { " [selected]" } else { "" };
            println!("  {} {} ({}){}", status, p.name, p.kind, selected);
            println!("    Models: {}", p.models.join(", "));
        }
    }

    Ok(())
}
