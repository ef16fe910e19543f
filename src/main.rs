use clap::{Parser, Subcommand};
use respimg::config::{self, Config};
use respimg::imaging::RustBackend;
use respimg::render::{self, ImageRequest, RenderOptions};
use respimg::types::Environment;
use respimg::{logging, naming, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "respimg")]
#[command(version, about = "Responsive image markup and asset URLs for static sites")]
#[command(long_about = "\
Responsive image markup and asset URLs for static sites

  respimg url content/photo.png            → /assets/images/photo-960.jpeg
  respimg url content/anim.gif             → /assets/images/anim.gif
  respimg render content/photo.png --alt 'Harbour at dawn' --class img-post

`render` writes the resized variants to the configured output directory,
prints the <figure> markup on stdout, and a summary of generated files on
stderr. Set RESPIMG_ENV=production to emit AVIF/WebP/JPEG instead of the
faster PNG/JPEG development set.

Run 'respimg gen-config' to print a documented respimg.toml.")]
struct Cli {
    /// Config file (stock defaults if it doesn't exist)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Source image
    src: PathBuf,
    /// Alt text. Required; pass an empty string for decorative images
    #[arg(long)]
    alt: Option<String>,
    /// `sizes` attribute for <source> elements
    #[arg(long)]
    sizes: Option<String>,
    /// Class on the <figure>
    #[arg(long)]
    picture_class: Option<String>,
    /// Class on the <img>
    #[arg(long = "class")]
    css_class: Option<String>,
    /// Value of --banner-border-color on the <figure>
    #[arg(long)]
    border_color: Option<String>,
    /// Caption, shown only for images with the caption class
    #[arg(long)]
    caption: Option<String>,
    /// Build environment; only "production" selects the production formats
    #[arg(long = "env", env = "RESPIMG_ENV", default_value = "development")]
    environment: String,
    /// Re-encode every variant even if a cached copy exists
    #[arg(long)]
    no_cache: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the public URL of an image asset
    Url {
        src: PathBuf,
        /// Width token
        #[arg(long, default_value = naming::DEFAULT_SIZE)]
        size: String,
        /// Format token
        #[arg(long, default_value = naming::DEFAULT_FORMAT)]
        format: String,
    },
    /// Generate image variants and print responsive markup
    Render(RenderArgs),
    /// Print a stock respimg.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_subscriber(cli.verbose).map_err(|e| e.to_string())?;

    match cli.command {
        Command::Url { src, size, format } => {
            let config = config::load_config(&cli.config)?;
            println!("{}", naming::img_url(&config.url_path, &src, &size, &format));
        }
        Command::Render(args) => {
            let config = config::load_config(&cli.config)?;
            let options = render_options(&args, &config);
            let backend = RustBackend::new().with_cache(cache_enabled(&args, &config));
            let request = image_request(&args, &config);

            let rendered = render::render_with_metadata(&backend, &request, &options).await?;
            println!("{}", rendered.markup.into_string());
            output::print_render_output(&args.src, options.environment, &rendered.metadata);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn render_options(args: &RenderArgs, config: &Config) -> RenderOptions {
    RenderOptions::from_config(config, Environment::from_env_value(&args.environment))
}

/// `--no-cache` can only turn the cache off, never back on.
fn cache_enabled(args: &RenderArgs, config: &Config) -> bool {
    config.images.use_cache && !args.no_cache
}

/// Request from the command line, with unset options taken from the config.
fn image_request(args: &RenderArgs, config: &Config) -> ImageRequest {
    let markup = &config.markup;
    let or_config = |arg: &Option<String>, fallback: &String| {
        arg.clone().unwrap_or_else(|| fallback.clone())
    };
    let mut request = ImageRequest::new(&args.src, args.alt.as_deref())
        .sizes(or_config(&args.sizes, &config.images.sizes))
        .picture_class(or_config(&args.picture_class, &markup.picture_class))
        .css_class(or_config(&args.css_class, &markup.css_class))
        .border_color(or_config(&args.border_color, &markup.border_color));
    request.caption = args.caption.clone();
    request
}
