//! Thin CLI wrapper around `rmesh::simplify` and the `exchange` module. No
//! simplification logic lives here — only argument parsing, I/O, and the
//! exit-code mapping spec'd at the interface.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use rmesh::config::{resolve_tolerance, CostConfig};
use rmesh::cost::Weights;
use rmesh::exchange::{self, MeshFormat};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Geometric,
    Combined,
}

#[derive(Debug, Parser)]
#[command(name = "mesh-simplify", about = "Edge-collapse mesh simplification")]
struct Cli {
    /// Input mesh file (.inp or .vtk)
    input: PathBuf,
    /// Output mesh file (.inp or .vtk)
    output: PathBuf,
    /// Target active vertex count
    #[arg(long)]
    target: usize,
    #[arg(long, value_enum, default_value_t = Mode::Geometric)]
    mode: Mode,
    /// Combined-mode weights "w_geom,w_disp,w_equi" (must sum to 1.0)
    #[arg(long)]
    weights: Option<String>,
    /// Override MESH_TOL / the default numerical tolerance
    #[arg(long)]
    tolerance: Option<f64>,
}

fn parse_weights(s: &str) -> Option<Weights> {
    let parts: Vec<&str> = s.split(',').collect();
    let [g, d, e] = parts.as_slice() else {
        return None;
    };
    Some(Weights {
        geom: g.trim().parse().ok()?,
        disp: d.trim().parse().ok()?,
        equi: e.trim().parse().ok()?,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let tolerance = resolve_tolerance(cli.tolerance);

    let in_format = match MeshFormat::from_path(&cli.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let out_format = match MeshFormat::from_path(&cli.output) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let text = match std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))
    {
        Ok(t) => t,
        Err(e) => {
            eprintln!("io error: {e:?}");
            return ExitCode::from(1);
        }
    };

    let mesh = match exchange::read_mesh(&text, in_format) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let config = match cli.mode {
        Mode::Geometric => CostConfig::geometric(tolerance),
        Mode::Combined => {
            let weights = match cli.weights.as_deref().and_then(parse_weights) {
                Some(w) => w,
                None => {
                    eprintln!("error: --mode combined requires --weights w_geom,w_disp,w_equi summing to 1.0");
                    return ExitCode::from(2);
                }
            };
            match CostConfig::combined(weights, tolerance) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::from(2);
                }
            }
        }
    };

    let (mut out_mesh, report) = match rmesh::simplify(mesh, config, cli.target, &[]) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let text = exchange::write_mesh(&mut out_mesh, out_format);
    if let Err(e) =
        std::fs::write(&cli.output, text).with_context(|| format!("writing {}", cli.output.display()))
    {
        eprintln!("io error: {e:?}");
        return ExitCode::from(1);
    }

    if !report.reached_target {
        eprintln!(
            "target unreachable: achieved {} vertices after {} collapses (queue drained)",
            report.achieved_vertices, report.committed_collapses
        );
        return ExitCode::from(3);
    }

    ExitCode::SUCCESS
}
