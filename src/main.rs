use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use schemagraph::catalog::{CatalogRows, Dialect};
use schemagraph::error::SchemaError;
use schemagraph::graph::{Normalizer, SchemaGraph};
use schemagraph::ir::{DetailLevel, GraphIR};
use schemagraph::text::TextRenderer;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned table listing
    Text,
    /// Full schema graph
    Json,
    /// Diagram nodes and edges
    Ir,
}

/// Normalize database catalog rows into a linked schema graph
#[derive(Parser, Debug)]
#[command(name = "schemagraph", version)]
struct Args {
    /// Catalog rows as JSON: {"columns": [...], "constraints": [...]}
    input: PathBuf,

    /// Engine whose type names the rows use: postgres, mysql, generic
    #[arg(short, long, default_value = "postgres", value_parser = parse_dialect)]
    dialect: Dialect,

    /// Qualify every table name with this schema (e.g. public)
    #[arg(short, long)]
    schema: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Detail level: tables, pk, pk_fk, all
    #[arg(long, default_value = "all", value_parser = parse_detail)]
    detail: DetailLevel,

    /// Only show these tables (repeatable)
    #[arg(short, long = "table")]
    tables: Vec<String>,

    /// Add a reference: 'table.column->table.column[:constraint]'
    #[arg(long = "add-ref", value_parser = parse_add_ref)]
    add_refs: Vec<AddRef>,

    /// Remove a reference: 'table.column:constraint'
    #[arg(long = "drop-ref", value_parser = parse_drop_ref)]
    drop_refs: Vec<DropRef>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnPath {
    table: String,
    column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AddRef {
    from: ColumnPath,
    to: ColumnPath,
    constraint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DropRef {
    from: ColumnPath,
    constraint: String,
}

fn parse_dialect(s: &str) -> Result<Dialect, String> {
    Dialect::from_str(s).ok_or_else(|| format!("invalid dialect: {s}"))
}

fn parse_detail(s: &str) -> Result<DetailLevel, String> {
    DetailLevel::from_str(s).ok_or_else(|| format!("invalid detail level: {s}"))
}

/// The column is the last dot-separated segment; the table may itself be
/// schema-qualified.
fn parse_column_path(s: &str) -> Result<ColumnPath, String> {
    match s.trim().rsplit_once('.') {
        Some((table, column)) if !table.is_empty() && !column.is_empty() => Ok(ColumnPath {
            table: table.to_string(),
            column: column.to_string(),
        }),
        _ => Err(format!("expected table.column, got `{s}`")),
    }
}

fn parse_add_ref(s: &str) -> Result<AddRef, String> {
    let (from, rest) = s
        .split_once("->")
        .ok_or_else(|| format!("expected from->to, got `{s}`"))?;
    let (to, constraint) = match rest.rsplit_once(':') {
        Some((to, name)) if !name.is_empty() => (to, Some(name.to_string())),
        Some((to, _)) => (to, None),
        None => (rest, None),
    };
    Ok(AddRef {
        from: parse_column_path(from)?,
        to: parse_column_path(to)?,
        constraint,
    })
}

fn parse_drop_ref(s: &str) -> Result<DropRef, String> {
    match s.rsplit_once(':') {
        Some((from, name)) if !name.is_empty() => Ok(DropRef {
            from: parse_column_path(from)?,
            constraint: name.to_string(),
        }),
        _ => Err(format!("expected table.column:constraint, got `{s}`")),
    }
}

/// Keep the machine-readable kind in front of the message.
fn kinded(err: SchemaError) -> anyhow::Error {
    let kind = err.kind();
    anyhow::Error::new(err).context(kind)
}

fn apply_edits(graph: &mut SchemaGraph, args: &Args) -> anyhow::Result<()> {
    for edit in &args.add_refs {
        let name = match &edit.constraint {
            Some(name) => name.clone(),
            None => graph
                .suggest_constraint_name(&edit.from.table, &edit.from.column)
                .map_err(kinded)?,
        };
        graph
            .add_reference(
                &edit.from.table,
                &edit.from.column,
                &edit.to.table,
                &edit.to.column,
                &name,
            )
            .map_err(kinded)?;
    }
    for edit in &args.drop_refs {
        graph
            .remove_reference(&edit.from.table, &edit.from.column, &edit.constraint)
            .map_err(kinded)?;
    }
    Ok(())
}

fn run(args: &Args) -> anyhow::Result<()> {
    let input = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let mut rows: CatalogRows = serde_json::from_str(&input)
        .with_context(|| format!("invalid catalog rows in {}", args.input.display()))?;
    if let Some(schema) = &args.schema {
        rows.qualify(schema);
    }
    debug!(
        columns = rows.columns.len(),
        constraints = rows.constraints.len(),
        "catalog rows loaded"
    );

    let mut graph = Normalizer::new(args.dialect)
        .normalize_rows(&rows)
        .map_err(kinded)?;
    apply_edits(&mut graph, args)?;

    let include = (!args.tables.is_empty()).then_some(args.tables.as_slice());
    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&graph)? + "\n",
        OutputFormat::Ir => {
            serde_json::to_string_pretty(&GraphIR::from_graph(&graph, include, args.detail))? + "\n"
        }
        OutputFormat::Text => {
            TextRenderer::default().render(&GraphIR::from_graph(&graph, include, args.detail))
        }
    };

    match &args.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("SCHEMAGRAPH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn path(table: &str, column: &str) -> ColumnPath {
        ColumnPath {
            table: table.into(),
            column: column.into(),
        }
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_add_ref() {
        let edit = parse_add_ref("public.orders.cust_id->public.customers.id:orders_fk1").unwrap();
        assert_eq!(edit.from, path("public.orders", "cust_id"));
        assert_eq!(edit.to, path("public.customers", "id"));
        assert_eq!(edit.constraint.as_deref(), Some("orders_fk1"));

        let edit = parse_add_ref("orders.cust_id->customers.id").unwrap();
        assert_eq!(edit.constraint, None);

        assert!(parse_add_ref("orders.cust_id").is_err());
        assert!(parse_add_ref("orders->customers.id").is_err());
    }

    #[test]
    fn test_parse_drop_ref() {
        let edit = parse_drop_ref("orders.cust_id:fk1").unwrap();
        assert_eq!(edit.from, path("orders", "cust_id"));
        assert_eq!(edit.constraint, "fk1");
        assert!(parse_drop_ref("orders.cust_id").is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "schemagraph",
            "catalog.json",
            "-d",
            "mysql",
            "--detail",
            "pk_fk",
            "--add-ref",
            "a.b->c.d",
            "-t",
            "a",
            "-t",
            "c",
        ])
        .unwrap();
        assert_eq!(args.dialect, Dialect::MySQL);
        assert_eq!(args.detail, DetailLevel::PkFk);
        assert_eq!(args.tables, vec!["a", "c"]);
        assert_eq!(args.add_refs.len(), 1);
        assert_eq!(args.format, OutputFormat::Text);

        assert!(Args::try_parse_from(["schemagraph", "x.json", "-d", "oracle"]).is_err());
    }
}
