//! # Cardstock CLI
//!
//! Command-line interface for the greeting-card template editor.
//!
//! ## Usage
//!
//! ```bash
//! # Run the editor server
//! cardstock serve --listen 0.0.0.0:8080 --service-url https://templates.example.com/get-template
//!
//! # Write an SVG preview of the front side
//! cardstock preview --front 29009-front --output front.svg
//!
//! # Preview the inside side without the bleed guide or asset checks
//! cardstock preview --side inside --inside inside-spread --no-bleed --no-probe -o inside.svg
//!
//! # Dump the render list as JSON
//! cardstock inspect --side inside
//!
//! # List bundled fallback templates
//! cardstock templates
//! ```

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;
use std::time::Duration;

use cardstock::{
    CardstockError, Compositor, EditorConfig, EditorSession, TemplateLoader,
    assets::{AssetProbe, AssetReport},
    compositor::{DEFAULT_SCALE, Viewport},
    config::{DEFAULT_ARTICLE, DEFAULT_FRONT_TEMPLATE, DEFAULT_INSIDE_TEMPLATE, StartupParams},
    loader::{FallbackStore, TemplateSource},
    server,
    svg::{SvgOptions, render_svg},
    template::Side,
};

/// Cardstock - greeting card template editor
#[derive(Parser, Debug)]
#[command(name = "cardstock")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP editor server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        #[command(flatten)]
        endpoints: Endpoints,
    },

    /// Render one side of a card to an SVG file
    Preview {
        #[command(flatten)]
        card: CardArgs,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = "preview.svg")]
        output: PathBuf,

        /// Hide the bleed guide
        #[arg(long)]
        no_bleed: bool,

        /// Element to draw as selected
        #[arg(long)]
        select: Option<String>,

        /// Skip checking image assets (missing ones are then not marked)
        #[arg(long)]
        no_probe: bool,

        #[command(flatten)]
        endpoints: Endpoints,
    },

    /// Print the render list of one side as JSON
    Inspect {
        #[command(flatten)]
        card: CardArgs,

        #[command(flatten)]
        endpoints: Endpoints,
    },

    /// List bundled fallback templates
    Templates,
}

/// Which card and side to load.
#[derive(Args, Debug)]
struct CardArgs {
    /// Article number
    #[arg(long, default_value = DEFAULT_ARTICLE)]
    art: String,

    /// Front template id
    #[arg(long, default_value = DEFAULT_FRONT_TEMPLATE)]
    front: String,

    /// Inside template id
    #[arg(long, default_value = DEFAULT_INSIDE_TEMPLATE)]
    inside: String,

    /// Side to render (front or inside)
    #[arg(long, default_value = "front")]
    side: Side,

    /// Preview zoom factor
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    scale: f64,
}

/// Remote endpoints shared by every subcommand that loads templates.
#[derive(Args, Debug)]
struct Endpoints {
    /// Template service URL
    #[arg(long)]
    service_url: Option<String>,

    /// Query parameter carrying the template id
    #[arg(long)]
    template_param: Option<String>,

    /// Base URL of auto-derived front photos
    #[arg(long)]
    fronts_url: Option<String>,

    /// Base URL of per-article assets
    #[arg(long)]
    assets_url: Option<String>,

    /// Template request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl Endpoints {
    fn into_config(self) -> EditorConfig {
        let mut config = EditorConfig::default();
        if let Some(url) = self.service_url {
            config.service_url = url;
        }
        if let Some(param) = self.template_param {
            config.template_param = param;
        }
        if let Some(url) = self.fronts_url {
            config.fronts_base_url = url;
        }
        if let Some(url) = self.assets_url {
            config.assets_base_url = url;
        }
        if let Some(secs) = self.timeout {
            config.request_timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[tokio::main]
async fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CardstockError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { listen, endpoints } => {
            let mut config = endpoints.into_config();
            config.listen_addr = listen;
            server::serve(config).await
        }

        Commands::Preview {
            card,
            output,
            no_bleed,
            select,
            no_probe,
            endpoints,
        } => {
            let config = endpoints.into_config();
            let (mut session, compositor) = open_session(&config, &card).await?;
            if let Some(id) = &select {
                if !session.select(id) {
                    log::warn!("'{}' is not a selectable element on the {} side", id, card.side.label());
                }
            }

            let composition = session.compose(&compositor, viewport(card.scale)?)?;
            let report = if !no_probe {
                AssetProbe::new(&config)?.probe_composition(&composition).await
            } else {
                AssetReport::default()
            };
            for url in report.missing() {
                println!("Missing asset: {}", url);
            }

            let svg = render_svg(
                &composition,
                &SvgOptions {
                    show_bleed: !no_bleed,
                    selected: session.selected(),
                    assets: &report,
                },
            );
            std::fs::write(&output, svg)?;
            println!(
                "Saved {} side of '{}' to {}",
                card.side.label(),
                session.active_project().name,
                output.display()
            );
            Ok(())
        }

        Commands::Inspect { card, endpoints } => {
            let config = endpoints.into_config();
            let (session, compositor) = open_session(&config, &card).await?;
            let composition = session.compose(&compositor, viewport(card.scale)?)?;
            println!("{}", serde_json::to_string_pretty(&composition)?);
            Ok(())
        }

        Commands::Templates => {
            let store = FallbackStore::bundled()?;
            println!("Bundled templates:");
            for id in store.ids() {
                let name = store.get(id).map(|p| p.name.as_str()).unwrap_or_default();
                println!("  {:<20} {}", id, name);
            }
            Ok(())
        }
    }
}

/// Load both sides and switch to the requested one.
async fn open_session(config: &EditorConfig, card: &CardArgs) -> Result<(EditorSession, Compositor), CardstockError> {
    let loader = TemplateLoader::from_config(config)?;
    let compositor = Compositor::new(config)?;
    let params = StartupParams {
        article_number: card.art.clone(),
        front_template: card.front.clone(),
        inside_template: card.inside.clone(),
        token: String::new(),
    };

    let mut session = EditorSession::start(&loader, params).await?;
    for side in [Side::Front, Side::Inside] {
        if let TemplateSource::Fallback { reason } = &session.template(side).source {
            println!(
                "Using bundled {} template '{}' ({})",
                side.label(),
                session.template(side).template_id,
                reason
            );
        }
    }
    session.set_active_side(card.side);
    Ok((session, compositor))
}

fn viewport(scale: f64) -> Result<Viewport, CardstockError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(CardstockError::Shape(format!("Invalid scale: {}", scale)));
    }
    Ok(Viewport::scaled(scale))
}
