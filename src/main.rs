use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fractal::elements::{SeedValue, WeightSplit};
use fractal::{Fractal, Layout, Strategy};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fractal", about = "Grow n-ary trees from seeds and fold them bottom-up")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Grow a reference tree and print its shape and seed sum.
    Count {
        #[command(flatten)]
        tree: TreeArgs,
        /// Execution strategy.
        #[arg(long, value_enum, default_value_t = StrategyArg::Parallel)]
        strategy: StrategyArg,
    },
    /// Run the sequential and parallel strategies on the same input and
    /// compare results and timings.
    Compare {
        #[command(flatten)]
        tree: TreeArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct TreeArgs {
    /// Branching factor.
    #[arg(long, default_value_t = 2)]
    arity: usize,
    /// Level of the root (leaves are at level 0).
    #[arg(long, default_value_t = 10)]
    depth: usize,
    /// Memory layout.
    #[arg(long, value_enum, default_value_t = LayoutArg::Balanced)]
    layout: LayoutArg,
    /// Root seed. With `--element weight` this is the weight to split.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Reference element to grow.
    #[arg(long, value_enum, default_value_t = ElementArg::Seed)]
    element: ElementArg,
    /// Worker threads (default: FRACTAL_THREADS or all cores).
    #[arg(long)]
    threads: Option<usize>,
    /// Depth below which the unbalanced layout stops forking.
    #[arg(long)]
    cutoff: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LayoutArg {
    Balanced,
    Unbalanced,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Balanced => Layout::Balanced,
            LayoutArg::Unbalanced => Layout::Unbalanced,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StrategyArg {
    Sequential,
    Parallel,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => Strategy::Sequential,
            StrategyArg::Parallel => Strategy::Parallel,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ElementArg {
    /// Every node stores its seed.
    Seed,
    /// Weight split among children until it drops below the arity.
    Weight,
}

/// Shape and fold result of one run.
#[derive(Debug, PartialEq, Eq)]
struct Summary {
    nodes: usize,
    leaves: usize,
    reached_depth: usize,
    sum: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Count { tree, strategy } => run_count(&tree, strategy.into())?,
        Commands::Compare { tree } => run_compare(&tree)?,
    }

    Ok(())
}

fn run_count(args: &TreeArgs, strategy: Strategy) -> Result<()> {
    let started = Instant::now();
    let summary = run(args, strategy)?;

    println!(
        "layout={}\tstrategy={}\tarity={}\tdepth={}",
        Layout::from(args.layout),
        strategy,
        args.arity,
        args.depth
    );
    print_summary(&summary);
    println!("elapsed={:.3?}", started.elapsed());

    Ok(())
}

fn run_compare(args: &TreeArgs) -> Result<()> {
    let started = Instant::now();
    let sequential = run(args, Strategy::Sequential)?;
    let sequential_elapsed = started.elapsed();

    let started = Instant::now();
    let parallel = run(args, Strategy::Parallel)?;
    let parallel_elapsed = started.elapsed();

    if sequential != parallel {
        bail!(
            "strategies disagree: sequential={:?} parallel={:?}",
            sequential,
            parallel
        );
    }

    print_summary(&parallel);
    println!(
        "sequential={:.3?}\tparallel={:.3?}\tspeedup={:.2}x",
        sequential_elapsed,
        parallel_elapsed,
        sequential_elapsed.as_secs_f64() / parallel_elapsed.as_secs_f64().max(f64::EPSILON)
    );

    Ok(())
}

fn run(args: &TreeArgs, strategy: Strategy) -> Result<Summary> {
    match args.element {
        ElementArg::Seed => {
            let mut fractal = build::<SeedValue>(args, strategy)?;
            fractal
                .grow(args.depth, args.seed)
                .with_context(|| format!("growth failed at depth {}", args.depth))?;
            let sum = fractal
                .compute(|node, children: &[u64]| {
                    Ok(children
                        .iter()
                        .fold(node.element().value, |acc, v| acc.wrapping_add(*v)))
                })
                .context("compute failed")?;
            summarize(&fractal, sum)
        }
        ElementArg::Weight => {
            let mut fractal = build::<WeightSplit>(args, strategy)?;
            fractal
                .grow(args.depth, args.seed)
                .with_context(|| format!("growth failed at depth {}", args.depth))?;
            // leaf weights add back up to the root weight
            let sum = fractal
                .compute(|node, children: &[u64]| {
                    if children.is_empty() {
                        Ok(node.element().weight)
                    } else {
                        Ok(children.iter().sum())
                    }
                })
                .context("compute failed")?;
            summarize(&fractal, sum)
        }
    }
}

fn build<E: fractal::Element>(args: &TreeArgs, strategy: Strategy) -> Result<Fractal<E>> {
    let mut builder = Fractal::<E>::builder()
        .arity(args.arity)
        .layout(args.layout.into())
        .strategy(strategy);
    if let Some(threads) = args.threads {
        builder = builder.threads(threads);
    }
    if let Some(cutoff) = args.cutoff {
        builder = builder.cutoff_depth(cutoff);
    }
    builder.build().context("invalid tree configuration")
}

fn summarize<E: fractal::Element>(fractal: &Fractal<E>, sum: u64) -> Result<Summary> {
    Ok(Summary {
        nodes: fractal.len(),
        leaves: fractal.leaf_count(),
        reached_depth: fractal
            .reached_depth()
            .context("tree reported no depth after growth")?,
        sum,
    })
}

fn print_summary(summary: &Summary) {
    println!(
        "nodes={}\tleaves={}\treached_depth={}\tsum={}",
        summary.nodes, summary.leaves, summary.reached_depth, summary.sum
    );
}
