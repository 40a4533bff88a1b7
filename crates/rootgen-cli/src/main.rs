//! rootgen CLI - tooth-root generation from the command line
//!
//! Runs JSON requests from files, generates roots from `.vtp` crowns, trims
//! scans by plane or loop and prints mesh summaries.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use rootgen::{
    generate_root, handle_flat, handle_json, handle_xml, FlatRootRequest, PointsInfo,
    RootSettings, XmlRootRequest,
};
use rootgen_io::{read_vtp_bytes, write_vtp};
use rootgen_math::{Point3, Tolerance, Vec3};
use rootgen_mesh::{
    boundary_edges, order_boundary, plane_cut, select_loop_region, PolyMesh, RegionSelection,
};

#[derive(Parser)]
#[command(name = "rootgen")]
#[command(about = "Synthesize tooth-root meshes from crown scans", long_about = None)]
struct Cli {
    /// Log debug output from every pipeline stage
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a JSON request file and write the JSON response
    Generate {
        /// Request file
        #[arg(short, long)]
        request: PathBuf,
        /// Request shape (detected from the fields when omitted)
        #[arg(short, long, value_enum)]
        format: Option<RequestFormat>,
        /// TOML settings file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Response file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a root from a .vtp crown and a landmark JSON file
    Mesh {
        /// Crown .vtp file
        #[arg(long)]
        crown: PathBuf,
        /// Landmark JSON file (toothName, bottomSphereCenter, ...)
        #[arg(long)]
        landmarks: PathBuf,
        /// Output .vtp file
        #[arg(short, long)]
        output: PathBuf,
        /// TOML settings file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Write the section of a .vtp surface with a plane as polylines
    Cut {
        /// Input .vtp file
        input: PathBuf,
        /// A point on the plane, as x,y,z
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        origin: Vec<f64>,
        /// Plane normal, as x,y,z
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        normal: Vec<f64>,
        /// Output .vtp file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Keep one side of a closed loop drawn on a .vtp surface
    Clip {
        /// Input .vtp file
        input: PathBuf,
        /// .vtp file whose points (or ordered polyline) trace the loop
        #[arg(long = "loop")]
        loop_file: PathBuf,
        /// Which side to keep
        #[arg(long, value_enum, default_value_t = Keep::Smallest)]
        keep: Keep,
        /// Output .vtp file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Display information about a .vtp file
    Info {
        /// Path to the .vtp file
        file: PathBuf,
    },
    /// Print the default settings as TOML
    Settings,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Keep {
    /// The side with fewer faces
    Smallest,
    /// The side with more faces
    Largest,
}

impl From<Keep> for RegionSelection {
    fn from(keep: Keep) -> Self {
        match keep {
            Keep::Smallest => RegionSelection::Smallest,
            Keep::Largest => RegionSelection::Largest,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RequestFormat {
    /// `polydata` + `pointsInfo`
    Xml,
    /// `pointValues` + `cellValues` + `pointsInfo`
    Flat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            request,
            format,
            config,
            output,
        } => {
            let settings = load_settings(config.as_deref())?;
            let body = fs::read_to_string(&request)
                .with_context(|| format!("reading {}", request.display()))?;
            let response = match format {
                None => handle_json(&body, &settings)?,
                Some(RequestFormat::Xml) => {
                    let req: XmlRootRequest = serde_json::from_str(&body)?;
                    serde_json::to_string(&handle_xml(&req, &settings)?)?
                }
                Some(RequestFormat::Flat) => {
                    let req: FlatRootRequest = serde_json::from_str(&body)?;
                    serde_json::to_string(&handle_flat(&req, &settings)?)?
                }
            };
            match output {
                Some(path) => {
                    fs::write(&path, response)?;
                    println!("Wrote response to {}", path.display());
                }
                None => println!("{response}"),
            }
        }
        Commands::Mesh {
            crown,
            landmarks,
            output,
            config,
        } => {
            let settings = load_settings(config.as_deref())?;
            let crown_mesh = read_mesh(&crown)?;
            let points_info: PointsInfo = serde_json::from_str(
                &fs::read_to_string(&landmarks)
                    .with_context(|| format!("reading {}", landmarks.display()))?,
            )?;
            let root = generate_root(&crown_mesh, &points_info.landmarks(), &settings)?;
            fs::write(&output, write_vtp(&root.mesh))?;
            println!(
                "Wrote root for {} to {} ({} faces, ring of {} points, height {:.3}, radius {:.3})",
                points_info.tooth_name,
                output.display(),
                root.mesh.num_faces(),
                root.ring_len,
                root.frame.height,
                root.frame.radius
            );
        }
        Commands::Cut {
            input,
            origin,
            normal,
            output,
        } => {
            let origin = vector(&origin, "--origin")?;
            let normal = vector(&normal, "--normal")?;
            let section = plane_cut(
                &read_mesh(&input)?,
                &Point3::from(origin),
                &normal,
                Tolerance::DEFAULT.linear,
            )?;
            fs::write(&output, write_vtp(&section))?;
            println!(
                "Wrote {} section segments to {}",
                section.num_lines(),
                output.display()
            );
        }
        Commands::Clip {
            input,
            loop_file,
            keep,
            output,
        } => {
            let mesh = read_mesh(&input)?;
            let trace = read_mesh(&loop_file)?;
            // a closed polyline is walked in order, anything else is taken as listed
            let loop_points = match order_boundary(&trace) {
                Ok(ring) => ring.points,
                Err(_) => trace.points,
            };
            let kept = select_loop_region(&mesh, &loop_points, keep.into())?;
            fs::write(&output, write_vtp(&kept))?;
            println!(
                "Kept {} of {} faces, wrote {}",
                kept.num_faces(),
                mesh.num_faces(),
                output.display()
            );
        }
        Commands::Info { file } => {
            show_info(&file, &read_mesh(&file)?);
        }
        Commands::Settings => {
            print!("{}", RootSettings::default().to_toml()?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = ["rootgen", "rootgen_mesh", "rootgen_io", "rootgen_cli"]
        .iter()
        .map(|name| format!("{name}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    if std::env::var("RUST_LOG").is_err() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
    } else {
        env_logger::init();
    }
}

fn load_settings(path: Option<&Path>) -> Result<RootSettings> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let settings = RootSettings::from_toml(&text)?;
            info!("loaded settings from {}", path.display());
            Ok(settings)
        }
        None => Ok(RootSettings::default()),
    }
}

fn read_mesh(path: &Path) -> Result<PolyMesh> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    read_vtp_bytes(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn vector(values: &[f64], flag: &str) -> Result<Vec3> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => bail!("{flag} takes three comma-separated numbers, got {}", values.len()),
    }
}

fn show_info(path: &Path, mesh: &PolyMesh) {
    println!("File: {}", path.display());
    println!("Points: {}", mesh.num_points());
    println!("Faces: {}", mesh.num_faces());
    println!("Lines: {}", mesh.num_lines());
    if let Some((lo, hi)) = mesh.bounds() {
        println!(
            "Bounds: ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3})",
            lo.x, lo.y, lo.z, hi.x, hi.y, hi.z
        );
    }
    let open = boundary_edges(mesh);
    if open.num_lines() == 0 {
        println!("Boundary: closed");
    } else {
        println!(
            "Boundary: {} edges over {} points",
            open.num_lines(),
            open.num_points()
        );
    }
}
