use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use kinship::{Dataset, LocalitySensitiveHashing, LshParams, MergeStrategy, SimilarityGroup};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kinship", about = "LSH neighborhoods and clusters for CSV vectors")]
struct Args {
    /// CSV file with records `id,x1,...,xdim`
    #[arg(short, long)]
    data: PathBuf,

    /// JSON file with index parameters (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vector dimensionality
    #[arg(long)]
    dim: Option<usize>,

    /// Rows per band
    #[arg(short)]
    r: Option<usize>,

    /// Number of bands
    #[arg(short)]
    b: Option<usize>,

    /// Seed for hyperplane generation
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look up the neighborhood of a sample (interactive when no --query is given)
    Neighbors {
        #[arg(long)]
        query: Option<String>,
    },
    /// Build and merge clusters
    Cluster {
        #[arg(long, value_enum, default_value_t = Merge::Coalesce)]
        merge: Merge,

        /// Target cluster count for the L2 strategies
        #[arg(long)]
        expected_clusters: Option<usize>,

        /// Drop clusters with at most this many members
        #[arg(long)]
        min_size: Option<usize>,

        /// Print a label-purity report (identifiers like `sample3_7`)
        #[arg(long, default_value_t = false)]
        evaluate: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Merge {
    Coalesce,
    CoalesceFull,
    L2Sample,
    L2Set,
}

impl From<Merge> for MergeStrategy {
    fn from(m: Merge) -> Self {
        match m {
            Merge::Coalesce => MergeStrategy::Coalescence,
            Merge::CoalesceFull => MergeStrategy::CoalescenceToFixedPoint,
            Merge::L2Sample => MergeStrategy::L2SampleBased,
            Merge::L2Set => MergeStrategy::L2SetBased,
        }
    }
}

fn load_params(args: &Args) -> Result<LshParams, Box<dyn std::error::Error>> {
    let mut params = match &args.config {
        Some(path) => LshParams::from_json_str(&std::fs::read_to_string(path)?)?,
        None => {
            let (Some(dim), Some(r), Some(b)) = (args.dim, args.r, args.b) else {
                return Err("--dim, -r and -b are required without --config".into());
            };
            LshParams::new(dim, r, b)
        }
    };
    if let Some(dim) = args.dim {
        params.dim = dim;
    }
    if let Some(r) = args.r {
        params.r = r;
    }
    if let Some(b) = args.b {
        params.b = b;
    }
    if args.seed.is_some() {
        params.seed = args.seed;
    }
    if let Command::Cluster {
        expected_clusters,
        min_size,
        ..
    } = &args.command
    {
        if expected_clusters.is_some() {
            params.expected_num_of_clusters = *expected_clusters;
        }
        if min_size.is_some() {
            params.similarity_group_min_size_threshold = *min_size;
        }
    }
    params.validate()?;
    Ok(params)
}

fn print_groups(groups: &[SimilarityGroup]) {
    for group in groups {
        let members: Vec<&str> = group.iter().map(String::as_str).collect();
        println!("{}", members.join(","));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("kinship=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let params = load_params(&args)?;
    let dataset = Dataset::from_reader(BufReader::new(File::open(&args.data)?), params.dim)?;
    tracing::info!(
        samples = dataset.len(),
        dim = params.dim,
        r = params.r,
        b = params.b,
        "building index"
    );
    let lsh = LocalitySensitiveHashing::build(params, dataset)?;

    match args.command {
        Command::Neighbors { query: Some(id) } => {
            let neighborhoods = lsh.nearest_neighbors()?;
            match neighborhoods.lookup(&id) {
                Some(n) => println!("{}", n.iter().cloned().collect::<Vec<_>>().join(",")),
                None => {
                    eprintln!("no sample named {id:?}");
                    std::process::exit(1);
                }
            }
        }
        Command::Neighbors { query: None } => {
            let neighborhoods = lsh.nearest_neighbors()?;
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            loop {
                write!(stdout, "sample name: ")?;
                stdout.flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                let id = line.trim();
                if id.is_empty() {
                    continue;
                }
                match neighborhoods.lookup(id) {
                    Some(n) => writeln!(stdout, "nearest neighbors of {id}: {n:?}")?,
                    None => writeln!(stdout, "no sample named {id:?}")?,
                }
            }
        }
        Command::Cluster {
            merge, evaluate, ..
        } => {
            // --min-size has already been folded into the params.
            let clusters = lsh.cluster(merge.into())?;
            print_groups(&clusters);
            if evaluate {
                eprintln!("{}", lsh.evaluate(&clusters)?);
            }
        }
    }
    Ok(())
}
