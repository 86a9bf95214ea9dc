//! Obcine Map - command line front end
//!
//! Serves the statistics queries as JSON and renders static choropleth snapshots.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use obcine_map::config::AppConfig;
use obcine_map::data::{closest_year, DatasetKind};
use obcine_map::map::tooltip::{legend_labels, tooltip_text};
use obcine_map::map::{
    GeometryLocation, GeometrySource, Layer, LayerController, Legend, LoadStatus, MapRenderer,
    StaticGeometrySource, ValueIndex,
};
use obcine_map::service::AtlasService;
use obcine_map::stats::RankingMode;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "obcine-map", version, about = "Slovenian municipal & regional statistics")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DatasetArg {
    /// Query the regional dataset instead of municipalities
    #[arg(long)]
    regions: bool,
}

impl DatasetArg {
    fn kind(&self) -> DatasetKind {
        if self.regions {
            DatasetKind::Regions
        } else {
            DatasetKind::Municipalities
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RankArg {
    Top,
    Bottom,
    AroundMedian,
}

impl From<RankArg> for RankingMode {
    fn from(arg: RankArg) -> Self {
        match arg {
            RankArg::Top => RankingMode::Top,
            RankArg::Bottom => RankingMode::Bottom,
            RankArg::AroundMedian => RankingMode::AroundMedian,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Parameter groups and the years each parameter has data for
    Parameters(DatasetArg),
    /// Every entity name in the dataset
    Entities(DatasetArg),
    /// Values and statistics of one parameter in one year
    Data {
        #[command(flatten)]
        dataset: DatasetArg,
        #[arg(short, long)]
        parameter: String,
        #[arg(short, long)]
        year: i32,
        /// Only print a ranking of the slice
        #[arg(long, value_enum)]
        rank: Option<RankArg>,
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// One entity's values of a parameter across all available years
    History {
        #[command(flatten)]
        dataset: DatasetArg,
        #[arg(short, long)]
        entity: String,
        #[arg(short, long)]
        parameter: String,
    },
    /// Render the layer shown at a zoom level to PNG
    Render {
        #[arg(short, long)]
        parameter: String,
        /// Defaults to the latest year with data; otherwise the nearest available year
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        zoom: Option<f64>,
        /// Select the first feature whose name contains this text
        #[arg(long)]
        search: Option<String>,
        #[arg(short, long, default_value = "map.png")]
        output: PathBuf,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderSummary {
    output: PathBuf,
    layer: Layer,
    parameter: &'static str,
    year: i32,
    legend: Option<[String; 3]>,
    selection: Option<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let service = AtlasService::initialize(&config.data).context("loading datasets")?;

    match cli.command {
        Command::Parameters(dataset) => print_json(&service.parameters(dataset.kind())),
        Command::Entities(dataset) => print_json(&service.entities(dataset.kind())),
        Command::Data {
            dataset,
            parameter,
            year,
            rank,
            count,
        } => match rank {
            Some(mode) => print_json(&service.ranking(
                dataset.kind(),
                &parameter,
                year,
                mode.into(),
                count,
            )?),
            None => print_json(&service.data(dataset.kind(), &parameter, year)?),
        },
        Command::History {
            dataset,
            entity,
            parameter,
        } => print_json(&service.history(dataset.kind(), &entity, &parameter)?),
        Command::Render {
            parameter,
            year,
            zoom,
            search,
            output,
        } => render(&config, &service, &parameter, year, zoom, search.as_deref(), output),
    }
}

fn render(
    config: &AppConfig,
    service: &AtlasService,
    parameter: &str,
    year: Option<i32>,
    zoom: Option<f64>,
    search: Option<&str>,
    output: PathBuf,
) -> Result<()> {
    let source: Arc<dyn GeometrySource> = Arc::new(StaticGeometrySource::new(
        GeometryLocation::parse(&config.map.entities_geometry),
        GeometryLocation::parse(&config.map.regions_geometry),
    ));
    let mut controller = LayerController::mount(source, &config.map, zoom);
    let layer = controller.active_layer();

    let dataset = service.dataset(layer.dataset());
    let param = dataset
        .resolve_parameter(parameter)
        .ok_or_else(|| anyhow!("unknown parameter {parameter:?}"))?;
    let years = dataset.available_years_for(param.source_field);
    let year = match year {
        Some(target) => closest_year(years, target),
        None => years.last().copied(),
    }
    .ok_or_else(|| anyhow!("no data for {:?}", param.source_field))?;
    let slice = dataset.get_entity_data(param.source_field, year);

    let wait = Duration::from_secs(config.map.stall_warning_secs.max(1));
    if !controller.wait_for_pending(wait) {
        bail!("geometry for the {layer:?} layer is still loading");
    }
    if let LoadStatus::Failed(message) = controller.load_status(layer) {
        bail!("geometry for the {layer:?} layer failed to load: {message}");
    }

    if let Some(query) = search {
        match controller.search(query) {
            Some(hit) => info!(name = %hit.name, center = ?hit.center, "selected"),
            None => warn!(query, "no feature matches"),
        }
    }

    let palette = config.render.palette;
    let styles = controller.styles(&slice.data, &slice.stats, palette);
    let legend = Legend::new(&slice.stats, palette);
    let png = MapRenderer::render_png(
        &styles,
        legend.as_ref(),
        config.render.width,
        config.render.height,
    )?;
    std::fs::write(&output, png).with_context(|| format!("writing {}", output.display()))?;
    info!(output = %output.display(), ?layer, year, "map rendered");

    let selection = controller.selection().map(|name| {
        let value = ValueIndex::new(&slice.data).value(name);
        tooltip_text(name, param.display_name, value, param.unit)
    });
    print_json(&RenderSummary {
        output,
        layer,
        parameter: param.source_field,
        year,
        legend: legend.as_ref().map(|l| legend_labels(l, param.unit)),
        selection,
    })
}
