//! tribvh CLI - build and inspect triangle BVHs.

mod soup;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;
use tribvh::gpu::GpuScene;
use tribvh::prelude::*;

/// Command options shared by `build` and `trace`.
struct Options {
    random: usize,
    seed: u64,
    input: Option<PathBuf>,
    models: usize,
    config: Option<PathBuf>,
    json: bool,
    out: Option<PathBuf>,
    rays: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            random: 10_000,
            seed: 1,
            input: None,
            models: 1,
            config: None,
            json: false,
            out: None,
            rays: 100_000,
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(level);

    let Some((&command, rest)) = filtered_args.split_first() else {
        print_help();
        return;
    };

    let result = match command {
        "b" | "build" => parse_options(rest).and_then(|opts| cmd_build(&opts)),
        "t" | "trace" => parse_options(rest).and_then(|opts| cmd_trace(&opts)),
        "version" | "--version" | "-V" => {
            print_version();
            Ok(())
        }
        "h" | "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the verbosity flags.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_options(args: &[&str]) -> anyhow::Result<Options> {
    let mut opts = Options::default();
    let mut it = args.iter();
    while let Some(&arg) = it.next() {
        let mut value = || {
            it.next()
                .copied()
                .with_context(|| format!("missing value for {arg}"))
        };
        match arg {
            "--random" | "-n" => opts.random = value()?.parse().context("--random")?,
            "--seed" | "-s" => opts.seed = value()?.parse().context("--seed")?,
            "--input" | "-i" => opts.input = Some(PathBuf::from(value()?)),
            "--models" | "-m" => opts.models = value()?.parse().context("--models")?,
            "--config" | "-c" => opts.config = Some(PathBuf::from(value()?)),
            "--out" | "-o" => opts.out = Some(PathBuf::from(value()?)),
            "--rays" | "-r" => opts.rays = value()?.parse().context("--rays")?,
            "--json" | "-j" => opts.json = true,
            other => bail!("unknown option: {other}"),
        }
    }
    if opts.models == 0 {
        bail!("--models must be at least 1");
    }
    Ok(opts)
}

/// Load the soup, split it into models and build.
fn build_from_options(opts: &Options) -> anyhow::Result<Bvh<Material>> {
    let config = match &opts.config {
        Some(path) => BuildConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BuildConfig::default(),
    };

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let triangles = match &opts.input {
        Some(path) => soup::read_raw_triangles(path)?,
        None => soup::random_triangles(&mut rng, opts.random),
    };
    tracing::info!(triangles = triangles.len(), models = opts.models, ?config, "building");

    let per_model = triangles.len().div_ceil(opts.models).max(1);
    let mut builder = BvhBuilder::with_config(config);
    let start = Instant::now();
    let mut chunks = triangles.chunks(per_model).peekable();
    if chunks.peek().is_none() {
        builder.register_model(&[], soup::random_material(&mut rng));
    }
    for chunk in chunks {
        builder.register_model(chunk, soup::random_material(&mut rng));
    }
    let elapsed = start.elapsed();
    tracing::info!(
        nodes = builder.nodes().len(),
        ms = elapsed.as_secs_f64() * 1000.0,
        "build finished"
    );

    let bvh = builder.finish();
    bvh.validate().context("built hierarchy failed validation")?;
    Ok(bvh)
}

fn cmd_build(opts: &Options) -> anyhow::Result<()> {
    let bvh = build_from_options(opts)?;
    let stats = (0..bvh.models().len())
        .map(|i| bvh.stats(i))
        .collect::<tribvh::Result<Vec<_>>>()?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Nodes:     {}", bvh.nodes().len());
        println!("Triangles: {}", bvh.triangles().len());
        println!("Models:    {}", bvh.models().len());
        for (model, s) in bvh.models().iter().zip(&stats) {
            println!();
            println!(
                "Model @ node {} / triangle {} ({} triangles)",
                model.node_offset, model.triangle_offset, model.triangle_count
            );
            println!("  nodes:      {} ({} leaves, {} interior)", s.node_count, s.leaf_count, s.interior_count);
            println!("  max depth:  {}", s.max_depth);
            println!(
                "  leaf size:  min {} / max {} / mean {:.2}",
                s.min_leaf_triangles, s.max_leaf_triangles, s.mean_leaf_triangles
            );
            println!("  empty:      {}", s.empty_leaves);
            println!("  SAH cost:   {:.3}", s.sah_cost);
        }
    }

    if let Some(out) = &opts.out {
        write_gpu_dump(&GpuScene::from_material_bvh(&bvh), out)?;
    }
    Ok(())
}

fn cmd_trace(opts: &Options) -> anyhow::Result<()> {
    let bvh = build_from_options(opts)?;
    let mut rng = StdRng::seed_from_u64(opts.seed ^ 0x9e37_79b9_7f4a_7c15);
    let rays = soup::random_rays(&mut rng, opts.rays);

    let start = Instant::now();
    let hits = bvh.intersect_batch(&rays);
    let elapsed = start.elapsed().as_secs_f64();

    let hit_count = hits.iter().filter(|h| h.is_some()).count();
    println!("Rays:  {}", rays.len());
    println!("Hits:  {} ({:.1}%)", hit_count, 100.0 * hit_count as f64 / rays.len().max(1) as f64);
    println!("Time:  {:.2} ms", elapsed * 1000.0);
    if elapsed > 0.0 {
        println!("Rate:  {:.2} Mrays/s", rays.len() as f64 / elapsed / 1e6);
    }
    Ok(())
}

/// Write `<out>.nodes.bin`, `.triangles.bin`, `.models.bin`, `.materials.bin`.
fn write_gpu_dump(scene: &GpuScene, out: &Path) -> anyhow::Result<()> {
    let parts: [(&str, &[u8]); 4] = [
        ("nodes", scene.nodes_bytes()),
        ("triangles", scene.triangles_bytes()),
        ("models", scene.models_bytes()),
        ("materials", scene.materials_bytes()),
    ];
    for (name, bytes) in parts {
        let path = out.with_extension(format!("{name}.bin"));
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote buffer");
    }
    Ok(())
}

fn print_version() {
    let stamp = option_env!("TRIBVH_BUILD_STAMP").unwrap_or("unknown");
    println!("tribvh {} (built {})", env!("CARGO_PKG_VERSION"), stamp);
}

fn print_help() {
    println!("tribvh - SAH bounding volume hierarchy builder");
    println!();
    println!("USAGE:");
    println!("    tribvh [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    b, build   [input]            Build, validate and print per-model statistics");
    println!("    t, trace   [input] [--rays R] Build, then trace R random rays in parallel");
    println!("    version                       Show version and build date");
    println!("    h, help                       Show this help");
    println!();
    println!("INPUT:");
    println!("    -n, --random <N>     Random soup of N triangles (default 10000)");
    println!("    -s, --seed <S>       RNG seed (default 1)");
    println!("    -i, --input <FILE>   Raw triangles, 9 little-endian f32 each");
    println!("    -m, --models <K>     Split the soup into K models (default 1)");
    println!("    -c, --config <FILE>  Build config JSON");
    println!("    -j, --json           Print statistics as JSON");
    println!("    -o, --out <PATH>     Write GPU buffers to PATH.<buffer>.bin");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Errors only");
    println!();
    println!("EXAMPLES:");
    println!("    tribvh build -n 100000 -m 4          # Four models over one soup");
    println!("    tribvh build -c midpoint.json --json # Alternate policy, JSON stats");
    println!("    tribvh trace -n 50000 -r 1000000     # Throughput check");
    println!();
    println!("NOTES:");
    println!("    - RUST_LOG overrides -v / -q");
}
