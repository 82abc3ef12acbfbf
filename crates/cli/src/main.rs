use anyhow::{anyhow, bail, Context};
use config::{Config, File};
use log::{info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use simple_logger::SimpleLogger;
use skymap::{
    boundary::DefaultSource, timed, BoundaryCache, MapConfig, MapEvent,
    MapInput, MapMode, MapRenderer, MapView, Point2, RenderConfig, Size,
};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process,
};
use structopt::StructOpt;
use strum::{Display, EnumString};

/// CLI for rendering weather station maps with Skymap.
#[derive(Debug, StructOpt)]
#[structopt(name = "skymap")]
struct Opt {
    /// Path to a config file that defines how the map behaves and how it's
    /// drawn. Map options go under `map`, rendering options under `render`.
    /// Supported formats: JSON, TOML
    #[structopt(short, long)]
    config: Option<PathBuf>,

    /// Path to a JSON file with the stations to show. Either a list of
    /// stations, or an object with a `stations` list and optional
    /// `selected`, `rotation_start` and `center` fields
    #[structopt(short, long)]
    stations: PathBuf,

    /// Override the projection from the config file: flat or globe
    #[structopt(short, long)]
    mode: Option<MapMode>,

    /// Container width, in pixels
    #[structopt(long, default_value = "800")]
    width: f64,

    /// Container height, in pixels
    #[structopt(long, default_value = "400")]
    height: f64,

    /// Name of the station to select. Overrides the stations file.
    #[structopt(long)]
    selected: Option<String>,

    /// Path or URL of the boundary dataset. Overrides the config file.
    #[structopt(long)]
    boundaries: Option<String>,

    /// Name of the TopoJSON object to draw from the boundary dataset.
    /// Overrides the config file.
    #[structopt(long)]
    boundary_object: Option<String>,

    /// Don't load or draw country boundaries
    #[structopt(long)]
    no_boundaries: bool,

    /// Don't draw the latitude/longitude grid
    #[structopt(long)]
    no_grid: bool,

    /// Press the zoom-in button this many times before rendering. Flat map
    /// only.
    #[structopt(long, default_value = "0")]
    zoom_in: u32,

    /// Press the zoom-out button this many times before rendering. Flat map
    /// only.
    #[structopt(long, default_value = "0")]
    zoom_out: u32,

    /// Drag the map this many pixels right before rendering. Flat map only.
    #[structopt(long, default_value = "0", allow_hyphen_values = true)]
    pan_x: f64,

    /// Drag the map this many pixels down before rendering. Flat map only.
    #[structopt(long, default_value = "0", allow_hyphen_values = true)]
    pan_y: f64,

    /// Advance the globe's auto-rotation this many steps before rendering.
    /// Globe only.
    #[structopt(long, default_value = "0")]
    ticks: u32,

    /// If given, the rendered map will be saved to this directory. The exact
    /// files that appear in the directory are defined by the output formats.
    /// See `--output-formats` for more info
    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// The format(s) to output the map in. Supported formats:
    ///
    /// cfg - The full config used for the map, in TOML format
    ///
    /// json - Every drawable primitive of the rendered frame, in JSON
    ///
    /// svg - The rendered map as an SVG image
    #[structopt(short = "f", long)]
    output_formats: Vec<OutputFormat>,

    /// The logging level to use. See
    /// https://docs.rs/log/0.4.11/log/enum.LevelFilter.html for options
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Different output formats.
#[derive(Copy, Clone, Debug, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    // If you change this, make sure to update the help text for
    // `--output-formats`!
    /// Export the full config in a human-readable file
    Cfg,
    /// Export the rendered frame as JSON
    Json,
    /// Render the map as an SVG
    Svg,
}

impl OutputFormat {
    fn file_ext(self) -> &'static str {
        match self {
            Self::Cfg => "toml",
            Self::Json => "json",
            Self::Svg => "svg",
        }
    }
}

/// Everything that can be set in the config file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CliConfig {
    map: MapConfig,
    render: RenderConfig,
}

/// The stations file can be a bare list, or the full input object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StationsFile {
    Input(MapInput),
    List(Vec<skymap::Station>),
}

fn load_config(config_path: &Path) -> anyhow::Result<CliConfig> {
    let mut settings = Config::new();
    let config_path = config_path.to_str().ok_or_else(|| {
        anyhow!("invalid character in path {:?}", config_path)
    })?;
    settings
        .merge(File::with_name(config_path))
        .context("error reading config file")?;
    settings.try_into().context("error reading config")
}

fn load_stations(path: &Path) -> anyhow::Result<MapInput> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("error reading stations file {:?}", path))?;
    let input = match serde_json::from_str(&text)
        .with_context(|| format!("error parsing stations file {:?}", path))?
    {
        StationsFile::Input(input) => input,
        StationsFile::List(stations) => MapInput {
            stations,
            ..Default::default()
        },
    };
    info!("Loaded {} stations from {:?}", input.stations.len(), path);
    Ok(input)
}

/// Load the boundary dataset. A failed load is logged and the map is drawn
/// without boundaries, same as a live map would be.
fn load_boundaries(view: &mut MapView) -> anyhow::Result<()> {
    let url = view.config().boundary_url.clone();
    let object = view.config().boundary_object.clone();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("error starting runtime")?;
    let cache = BoundaryCache::new();
    match runtime.block_on(cache.load(&DefaultSource::new(), &url, &object))
    {
        Ok(boundaries) => {
            view.handle(MapEvent::BoundariesLoaded(boundaries));
        }
        Err(err) => warn!("Drawing without boundaries: {:#}", err),
    }
    Ok(())
}

/// Replay the requested interactions on the view
fn apply_interactions(view: &mut MapView, opt: &Opt) {
    let zooms = (0..opt.zoom_in)
        .map(|_| MapEvent::ZoomIn)
        .chain((0..opt.zoom_out).map(|_| MapEvent::ZoomOut));
    for event in zooms {
        view.handle(event);
        // Run the transition to the end
        let duration = view.config().zoom.transition();
        view.handle(MapEvent::Frame(duration));
    }

    if opt.pan_x != 0.0 || opt.pan_y != 0.0 {
        let start = view.size().center();
        let end = start + Point2::new(opt.pan_x, opt.pan_y);
        view.handle(MapEvent::PointerDown(start));
        view.handle(MapEvent::PointerMove(end));
        view.handle(MapEvent::PointerUp(end));
        // Don't leave a hover behind from the drag
        view.handle(MapEvent::PointerLeave);
    }

    for _ in 0..opt.ticks {
        view.handle(MapEvent::Tick);
    }
}

/// Generate an output form of the map in the given format.
fn gen_output(
    output_dir: &Path,
    output_format: OutputFormat,
    config: &CliConfig,
    view: &MapView,
    renderer: &MapRenderer,
) -> anyhow::Result<()> {
    fn generate_bytes(
        output_format: OutputFormat,
        config: &CliConfig,
        view: &MapView,
        renderer: &MapRenderer,
    ) -> anyhow::Result<Vec<u8>> {
        Ok(match output_format {
            OutputFormat::Cfg => {
                // Go through a Value so tables get sorted after plain values
                let value = toml::Value::try_from(config)
                    .context("error serializing config")?;
                toml::to_string_pretty(&value)
                    .context("error serializing config")?
                    .into_bytes()
            }
            OutputFormat::Json => renderer.render(view).to_json().into(),
            OutputFormat::Svg => renderer.render_as_svg(view).into_bytes(),
        })
    }

    let output_file_path = output_dir
        .join("map")
        .with_extension(output_format.file_ext());

    timed!(
        format!(
            "Generating {} output and writing to {:?}",
            output_format, &output_file_path
        ),
        log::Level::Info,
        {
            let bytes = generate_bytes(output_format, config, view, renderer)?;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&output_file_path)
                .with_context(|| {
                    format!("error opening output file {:?}", &output_file_path)
                })?;
            file.write_all(&bytes).with_context(|| {
                format!("error writing to file {:?}", &output_file_path)
            })?;
        }
    );

    Ok(())
}

/// Run the CLI with some options
fn run(opt: Opt) -> anyhow::Result<()> {
    SimpleLogger::new().with_level(opt.log_level).init()?;

    let mut config = match &opt.config {
        Some(config_path) => load_config(config_path)?,
        None => CliConfig::default(),
    };
    if let Some(mode) = opt.mode {
        config.map.mode = mode;
    }
    if let Some(url) = &opt.boundaries {
        config.map.boundary_url = url.clone();
    }
    if let Some(object) = &opt.boundary_object {
        config.map.boundary_object = object.clone();
    }
    if opt.no_grid {
        config.render.show_grid = false;
    }
    if opt.no_boundaries {
        config.render.show_boundaries = false;
    }

    let mut input = load_stations(&opt.stations)?;
    if opt.selected.is_some() {
        input.selected = opt.selected.clone();
    }

    let size = Size::new(opt.width, opt.height);
    let mut view = MapView::new(config.map.clone(), input, size)
        .context("invalid map")?;
    if !opt.no_boundaries {
        load_boundaries(&mut view)?;
    }
    apply_interactions(&mut view, &opt);

    // If an output dir was specified, write out output format(s) there
    match &opt.output {
        Some(output_dir) => {
            if opt.output_formats.is_empty() {
                bail!(
                    "output dir was specified, but no output formats were given"
                )
            }
            fs::create_dir_all(output_dir)?;

            let renderer = MapRenderer::new(config.render)
                .context("invalid render config")?;
            for &format in &opt.output_formats {
                gen_output(output_dir, format, &config, &view, &renderer)?;
            }
        }
        None => info!("No output dir given, nothing to write"),
    }

    Ok(())
}

fn main() {
    let exit_code = match run(Opt::from_args()) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    process::exit(exit_code);
}
