use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use clap::{ArgAction, Parser, Subcommand};
use lunte_decode::{
    Composite, Decoder, DecoderConfig, ParsedValue, Scalar, UnknownElements,
};
use lunte_schema::{TypeKind, TypeRegistry};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(
    name = "lnt",
    about = "Command line interface for the lunte decode engine",
    version,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a document (JSON) into its typed value graph.
    Decode {
        /// Path to a document JSON file (or "-" for stdin).
        document: PathBuf,
        /// Path to a schema artifact (JSON). Uses the embedded core artifact if omitted.
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// Decoder configuration file (YAML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Ignore unrecognized document keys instead of rejecting them.
        #[arg(long, action = ArgAction::SetTrue)]
        lenient: bool,
        /// Restrict dispatch to these resource kinds. Repeatable.
        #[arg(short = 'k', long = "resource-kind", value_name = "KIND")]
        resource_kinds: Vec<String>,
        /// Maximum composite nesting depth.
        #[arg(long)]
        max_depth: Option<usize>,
        /// Decode against a named entry-point type instead of the resourceType discriminator.
        #[arg(long)]
        entry: Option<String>,
        /// Pretty-print the output.
        #[arg(long, action = ArgAction::SetTrue)]
        pretty: bool,
    },

    /// List the types of a schema artifact.
    Schema {
        /// Path to a schema artifact (JSON). Uses the embedded core artifact if omitted.
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Decode {
            document,
            schema,
            config,
            lenient,
            resource_kinds,
            max_depth,
            entry,
            pretty,
        } => decode_command(
            &document,
            schema.as_deref(),
            config.as_deref(),
            lenient,
            resource_kinds,
            max_depth,
            entry.as_deref(),
            pretty,
        ),
        Commands::Schema { schema } => schema_command(schema.as_deref()),
    }
}

#[allow(clippy::too_many_arguments)]
fn decode_command(
    document: &Path,
    schema: Option<&Path>,
    config_path: Option<&Path>,
    lenient: bool,
    resource_kinds: Vec<String>,
    max_depth: Option<usize>,
    entry: Option<&str>,
    pretty: bool,
) -> Result<()> {
    let registry = load_registry(schema)?;

    let mut config = match config_path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            DecoderConfig::from_yaml(&text).context("invalid decoder configuration")?
        }
        None => DecoderConfig::defaults(),
    };
    if lenient {
        config.unknown_elements = UnknownElements::Lenient;
    }
    if !resource_kinds.is_empty() {
        config.supported_resource_kinds = Some(resource_kinds);
    }
    if let Some(depth) = max_depth {
        config.max_recursion_depth = depth;
    }

    let decoder = Decoder::from_config(&config, registry)?;

    let input = read_input(document)?;
    let tree: Value = serde_json::from_str(&input).context("document is not valid JSON")?;

    let value = match entry {
        Some(type_name) => decoder.decode_as(type_name, &tree)?,
        None => ParsedValue::Resource(decoder.decode(&tree)?),
    };

    let rendered = render(&value);
    if pretty {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        println!("{}", serde_json::to_string(&rendered)?);
    }
    Ok(())
}

fn schema_command(schema: Option<&Path>) -> Result<()> {
    let registry = load_registry(schema)?;

    let mut names: Vec<&str> = registry.type_names().collect();
    names.sort_unstable();

    for name in names {
        let Some(ty) = registry.get(name) else { continue };
        let kind = match ty.kind {
            TypeKind::PrimitiveType => "primitive-type",
            TypeKind::ComplexType => "complex-type",
            TypeKind::Resource => "resource",
        };
        println!("{:<24} {:<15} {} field(s)", ty.name, kind, ty.fields.len());
    }

    let mut kinds: Vec<&str> = registry.resource_kinds().collect();
    kinds.sort_unstable();
    println!("\ndispatchable resource kinds: {}", kinds.join(", "));
    Ok(())
}

fn load_registry(path: Option<&Path>) -> Result<Arc<TypeRegistry>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read schema {}", path.display()))?;
            let registry = TypeRegistry::from_json(&text)
                .with_context(|| format!("invalid schema artifact {}", path.display()))?;
            Ok(Arc::new(registry))
        }
        None => Ok(Arc::new(TypeRegistry::core().clone())),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read document {}", path.display()))
    }
}

/// Renders a decoded value graph as display JSON. This is a debug view of the
/// typed tree, not a wire-format serializer: every node is shown with its
/// resolved type, and decimals are kept as strings to preserve precision.
fn render(value: &ParsedValue) -> Value {
    match value {
        ParsedValue::Primitive(primitive) => {
            let mut map = Map::new();
            map.insert("type".to_string(), json!(primitive.type_name));
            if let Some(scalar) = &primitive.value {
                map.insert("value".to_string(), render_scalar(scalar));
            }
            if let Some(element) = &primitive.element {
                map.insert("element".to_string(), render_fields(element));
            }
            Value::Object(map)
        }
        ParsedValue::Composite(composite) => {
            let mut map = Map::new();
            map.insert("type".to_string(), json!(composite.type_name));
            map.insert("fields".to_string(), render_fields(composite));
            Value::Object(map)
        }
        ParsedValue::Resource(resource) => {
            let mut map = Map::new();
            map.insert("resourceType".to_string(), json!(resource.kind));
            map.insert("fields".to_string(), render_fields(&resource.body));
            Value::Object(map)
        }
        ParsedValue::List(items) => Value::Array(items.iter().map(render).collect()),
    }
}

fn render_fields(composite: &Composite) -> Value {
    let mut map = Map::new();
    for (name, value) in &composite.fields {
        map.insert(name.clone(), render(value));
    }
    Value::Object(map)
}

fn render_scalar(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Text(s) => json!(s),
        Scalar::Integer(i) => json!(i),
        Scalar::Decimal(d) => json!(d.to_string()),
        Scalar::Boolean(b) => json!(b),
    }
}
