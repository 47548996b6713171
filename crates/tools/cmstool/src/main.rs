mod output;
mod run_config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cms::{CellId, CubicalMarchingSquares, Isosurface};
use tracing_subscriber::EnvFilter;

use run_config::{Overrides, RunConfig};

#[derive(Parser)]
#[command(name = "cmstool")]
#[command(about = "Cubical Marching Squares isosurface extraction tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one isosurface and write mesh, leaf boxes and statistics as JSON
    Extract {
        /// RON run file with `field` and `cms` sections
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Built-in field (see `cmstool fields`)
        #[arg(short, long)]
        field: Option<Isosurface>,

        /// Field expression in x, y and z; takes precedence over --field
        #[arg(short, long)]
        expression: Option<String>,

        /// Minimum octree level
        #[arg(long)]
        min_level: Option<u32>,

        /// Maximum octree level
        #[arg(long)]
        max_level: Option<u32>,

        /// Complex-surface cosine threshold
        #[arg(long)]
        threshold: Option<f64>,

        /// Root-finding refinement budget
        #[arg(long)]
        budget: Option<u32>,

        /// Snap fan centroids onto the surface
        #[arg(long)]
        snap: bool,

        /// Only tessellate these cells (repeatable)
        #[arg(long = "cell")]
        cells: Vec<CellId>,

        /// Output directory
        #[arg(short, long, default_value = "cms-out")]
        output: PathBuf,
    },
    /// List the built-in fields
    Fields,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            config,
            field,
            expression,
            min_level,
            max_level,
            threshold,
            budget,
            snap,
            cells,
            output,
        } => {
            let mut run = match config {
                Some(path) => RunConfig::load_from_file(path)?,
                None => RunConfig::default(),
            };
            run.apply(Overrides {
                field,
                expression,
                min_level,
                max_level,
                threshold,
                budget,
                snap,
            });
            extract(run, cells, output)?;
        }
        Commands::Fields => {
            for surface in Isosurface::ALL {
                println!("{}", surface);
            }
        }
    }

    Ok(())
}

fn extract(run: RunConfig, cells: Vec<CellId>, output: PathBuf) -> Result<()> {
    let label = run.field.label();
    let field = run.field.build()?;
    tracing::info!("Extracting {} at levels {}..={}", label, run.cms.min_octree_level, run.cms.max_octree_level);

    let extraction = CubicalMarchingSquares::new(field.as_ref(), run.cms)
        .context("Invalid run configuration")?
        .with_cell_filter(cells)
        .extract()
        .with_context(|| format!("Extraction of {} failed", label))?;

    let written = output::write_extraction(&output, &label, &extraction)?;

    let stats = &extraction.statistics;
    println!(
        "{}: {} cells ({} leaves), {} vertices, {} triangles in {:.2}ms",
        label,
        stats.octree.total_cells,
        stats.octree.leaf_cells,
        stats.mesh.vertices,
        stats.mesh.triangles,
        extraction.timings.total
    );
    for path in written {
        println!("  {}", path.display());
    }

    Ok(())
}
