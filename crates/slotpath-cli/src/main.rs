mod exit_codes;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use slotpath_core::{JsonOpts, Value};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "slotpath",
    about = "Select and assign values in JSON documents by path expression",
    version
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Re-render a JSON document
    Dump(DumpArgs),
    /// Print every value a path expression matches, as a JSON array
    Get(GetArgs),
    /// Assign a value (raw JSON) to every slot a path expression reaches
    Set(SetArgs),
}

#[derive(ClapArgs, Debug)]
struct RenderArgs {
    /// Max array elements to include per array
    #[arg(long, default_value_t = 128)]
    max_array: usize,
    /// Max recursion depth
    #[arg(long, default_value_t = 16)]
    max_depth: usize,
}

impl RenderArgs {
    fn opts(&self) -> JsonOpts {
        JsonOpts {
            max_array_elems: self.max_array,
            max_depth: self.max_depth,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct DumpArgs {
    /// JSON file to load
    path: PathBuf,
    #[command(flatten)]
    render: RenderArgs,
}

#[derive(ClapArgs, Debug)]
struct GetArgs {
    /// JSON file to load
    path: PathBuf,
    /// Path expression, e.g. /items[*]/name
    #[arg(long)]
    expr: String,
    #[command(flatten)]
    render: RenderArgs,
}

#[derive(ClapArgs, Debug)]
struct SetArgs {
    /// JSON file to load
    path: PathBuf,
    /// Path expression, e.g. /items[2]/name
    #[arg(long)]
    expr: String,
    /// New value as raw JSON (e.g., 123, true, "str", [1,2])
    #[arg(long)]
    value: String,
    /// Optional output .json path to write; otherwise prints to stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Dump(a) => cmd_dump(a),
        Cmd::Get(a) => cmd_get(a),
        Cmd::Set(a) => cmd_set(a),
    }
}

fn load(path: &Path) -> Result<Value> {
    slotpath_core::load_json_file(path).with_context(|| format!("load {}", path.display()))
}

fn check_expr(expr: &str) -> Result<()> {
    if slotpath_core::Path::parse(expr).is_none() {
        bail!("invalid path expression: {expr:?}");
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let s = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{s}");
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> Result<i32> {
    let doc = load(&args.path)?;
    print_json(&slotpath_core::to_json(&doc, args.render.opts()))?;
    Ok(exit_codes::OK)
}

fn cmd_get(args: GetArgs) -> Result<i32> {
    check_expr(&args.expr)?;
    let doc = load(&args.path)?;
    let opts = args.render.opts();
    let found: Vec<serde_json::Value> = slotpath_core::select(&doc, &args.expr)
        .iter()
        .map(|v| slotpath_core::to_json(v, opts))
        .collect();
    if found.is_empty() {
        eprintln!("no match for {}", args.expr);
        return Ok(exit_codes::NO_MATCH);
    }
    print_json(&serde_json::Value::Array(found))?;
    Ok(exit_codes::OK)
}

fn cmd_set(args: SetArgs) -> Result<i32> {
    check_expr(&args.expr)?;
    let raw: serde_json::Value =
        serde_json::from_str(&args.value).context("parse --value as JSON")?;
    let doc = load(&args.path)?;

    // Only a pointer's target is writable, so the document goes behind one.
    let mut root = Value::pointer(doc);
    let updated = slotpath_core::assign(&mut root, &args.expr, slotpath_core::from_json(&raw));
    eprintln!("updated {updated}");
    if updated == 0 {
        return Ok(exit_codes::NO_MATCH);
    }
    let doc = root
        .into_pointee()
        .context("document detached from its root")?;

    let opts = JsonOpts::lossless();
    match &args.out {
        Some(out) => {
            slotpath_core::write_json_file(out, &doc, opts)
                .with_context(|| format!("write {}", out.display()))?;
            info!(out = %out.display(), updated, "document written");
        }
        None => print_json(&slotpath_core::to_json(&doc, opts))?,
    }
    Ok(exit_codes::OK)
}
