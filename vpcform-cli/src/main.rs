use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::debug;

use vpcform_core::flatten::{attributes_to_json, json_to_value, value_to_json};
use vpcform_core::provider::{Provider, ProviderError};
use vpcform_core::resource::{Resource, ResourceId, State, Value};
use vpcform_core::schema::ResourceSchema;
use vpcform_provider_ibm::resources::resource_types;
use vpcform_provider_ibm::schemas;
use vpcform_provider_ibm::{IbmVpcProvider, ProviderConfig};

/// Prefix marking an attribute value as raw JSON
const JSON_PREFIX: &str = "@json:";

#[derive(Parser)]
#[command(name = "vpcform")]
#[command(about = "Manage IBM Cloud VPC resources", long_about = None)]
struct Cli {
    /// IBM Cloud region (defaults to IC_REGION, then us-south)
    #[arg(long, global = true, env = "IC_REGION")]
    region: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Override the deadline of every status wait
    #[arg(long, global = true, value_name = "MINUTES")]
    timeout_minutes: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported resource kinds
    Types,
    /// Show the attribute schema of a resource kind
    Schema {
        /// Resource kind (e.g. is_subnet)
        kind: String,
    },
    /// Read one object
    Read {
        kind: String,
        /// Remote identifier (<parent>/<id> for nested kinds)
        identifier: String,
    },
    /// List every object of a kind
    List {
        kind: String,

        /// Attribute filter, repeatable (e.g. --filter zone=us-south-1)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },
    /// Check whether an object exists
    Exists { kind: String, identifier: String },
    /// Create an object and wait until it is usable
    Create {
        kind: String,

        #[command(flatten)]
        input: AttributeInput,
    },
    /// Update an object in place
    Update {
        kind: String,
        identifier: String,

        #[command(flatten)]
        input: AttributeInput,
    },
    /// Delete an object and wait until it is gone
    Delete { kind: String, identifier: String },
}

#[derive(Args, Debug, Default)]
struct AttributeInput {
    /// Attribute assignment, repeatable; values parse as bool or int when
    /// they look like one, JSON when prefixed with @json:
    #[arg(long = "attr", value_name = "KEY=VALUE")]
    attrs: Vec<String>,

    /// JSON object of attributes; --attr entries override it
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run(cli: Cli) -> Result<(), String> {
    let output = cli.output;
    match cli.command {
        Commands::Types => {
            run_types(output);
            Ok(())
        }
        Commands::Schema { kind } => run_schema(&kind, output),
        command => {
            let provider = get_provider(cli.region, cli.timeout_minutes)?;
            match command {
                Commands::Read { kind, identifier } => {
                    run_read(&provider, &kind, &identifier, output).await
                }
                Commands::List { kind, filters } => {
                    run_list(&provider, &kind, &filters, output).await
                }
                Commands::Exists { kind, identifier } => {
                    run_exists(&provider, &kind, &identifier, output).await
                }
                Commands::Create { kind, input } => {
                    run_create(&provider, &kind, &input, output).await
                }
                Commands::Update {
                    kind,
                    identifier,
                    input,
                } => run_update(&provider, &kind, &identifier, &input, output).await,
                Commands::Delete { kind, identifier } => {
                    run_delete(&provider, &kind, &identifier).await
                }
                Commands::Types | Commands::Schema { .. } => Ok(()),
            }
        }
    }
}

fn get_provider(region: Option<String>, timeout_minutes: Option<u64>) -> Result<IbmVpcProvider, String> {
    let mut config = ProviderConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(region) = region {
        config = config.with_region(region);
    }
    if let Some(minutes) = timeout_minutes {
        config = config.with_timeout_override(timeout_from_minutes(minutes));
    }
    debug!("using region {}", config.region);
    IbmVpcProvider::new(config).map_err(|e| e.to_string())
}

fn timeout_from_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

fn get_schemas() -> HashMap<String, ResourceSchema> {
    let mut all_schemas = HashMap::new();
    for schema in schemas::all_schemas() {
        all_schemas.insert(schema.resource_type.clone(), schema);
    }
    all_schemas
}

fn get_schema(kind: &str) -> Result<ResourceSchema, String> {
    get_schemas()
        .remove(kind)
        .ok_or_else(|| format!("Unknown resource kind '{}', see `vpcform types`", kind))
}

// =============================================================================
// Attribute parsing
// =============================================================================

/// Parse one command-line attribute value
fn parse_value(raw: &str) -> Result<Value, String> {
    if let Some(json) = raw.strip_prefix(JSON_PREFIX) {
        let parsed: serde_json::Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON '{}': {}", json, e))?;
        return json_to_value(&parsed).ok_or_else(|| "JSON null is not a value".to_string());
    }
    match raw {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Value::Int(n));
    }
    Ok(Value::String(raw.to_string()))
}

fn parse_assignment(assignment: &str) -> Result<(String, Value), String> {
    let (key, raw) = assignment
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got '{}'", assignment))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Missing attribute name in '{}'", assignment));
    }
    Ok((key.to_string(), parse_value(raw)?))
}

fn load_attribute_file(path: &Path) -> Result<HashMap<String, Value>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let parsed: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| format!("{} must contain a JSON object", path.display()))?;
    Ok(object
        .iter()
        .filter_map(|(k, v)| json_to_value(v).map(|v| (k.clone(), v)))
        .collect())
}

fn load_attributes(input: &AttributeInput) -> Result<HashMap<String, Value>, String> {
    let mut attributes = match &input.file {
        Some(path) => load_attribute_file(path)?,
        None => HashMap::new(),
    };
    for assignment in &input.attrs {
        let (key, value) = parse_assignment(assignment)?;
        attributes.insert(key, value);
    }
    Ok(attributes)
}

fn parse_filters(filters: &[String]) -> Result<HashMap<String, String>, String> {
    filters
        .iter()
        .map(|f| {
            f.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| format!("Expected KEY=VALUE filter, got '{}'", f))
        })
        .collect()
}

/// Local label of an object: its name when known, else the identifier
fn resource_id(kind: &str, attributes: &HashMap<String, Value>, fallback: &str) -> ResourceId {
    let label = attributes
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(fallback);
    ResourceId::new(kind, label)
}

// =============================================================================
// Commands
// =============================================================================

fn run_types(output: OutputFormat) {
    let mut names: Vec<&str> = resource_types().iter().map(|t| t.name()).collect();
    names.sort_unstable();
    match output {
        OutputFormat::Json => println!("{}", serde_json::json!(names)),
        OutputFormat::Text => {
            for name in names {
                println!("{}", name);
            }
        }
    }
}

fn schema_to_json(schema: &ResourceSchema) -> serde_json::Value {
    let mut attributes: Vec<_> = schema.attributes.values().collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));
    let attrs: Vec<serde_json::Value> = attributes
        .iter()
        .map(|a| {
            serde_json::json!({
                "name": a.name,
                "type": a.attr_type.to_string(),
                "required": a.required,
                "computed": a.computed,
                "force_new": a.force_new,
                "write_only": a.write_only,
                "default": a.default.as_ref().map(value_to_json),
                "description": a.description,
            })
        })
        .collect();
    serde_json::json!({
        "type": schema.resource_type,
        "description": schema.description,
        "replaced_on_change": schema.force_new_attributes(),
        "attributes": attrs,
    })
}

fn run_schema(kind: &str, output: OutputFormat) -> Result<(), String> {
    let schema = get_schema(kind)?;
    if output == OutputFormat::Json {
        println!("{}", pretty(&schema_to_json(&schema))?);
        return Ok(());
    }

    println!("{}", schema.resource_type.cyan().bold());
    if let Some(description) = &schema.description {
        println!("  {}", description);
    }
    let replaced = schema.force_new_attributes();
    if !replaced.is_empty() {
        println!("  {} {}", "Replaced when changed:".red(), replaced.join(", "));
    }
    println!();

    let mut attributes: Vec<_> = schema.attributes.values().collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));
    for attr in attributes {
        let mut flags = Vec::new();
        if attr.required {
            flags.push("required".yellow().to_string());
        }
        if attr.computed {
            flags.push("computed".dimmed().to_string());
        }
        if attr.force_new {
            flags.push("force-new".red().to_string());
        }
        if attr.write_only {
            flags.push("write-only".to_string());
        }
        if let Some(default) = &attr.default {
            flags.push(format!("default {}", format_value(default)));
        }
        println!(
            "  {} {} {}",
            attr.name.bold(),
            attr.attr_type.to_string().dimmed(),
            flags.join(", ")
        );
        if let Some(description) = &attr.description {
            println!("      {}", description);
        }
    }
    Ok(())
}

async fn run_read(
    provider: &IbmVpcProvider,
    kind: &str,
    identifier: &str,
    output: OutputFormat,
) -> Result<(), String> {
    get_schema(kind)?;
    let id = ResourceId::new(kind, identifier);
    let state = provider
        .read(&id, Some(identifier))
        .await
        .map_err(|e| e.to_string())?;
    if !state.exists {
        return Err(format!("{} {} not found", kind, identifier));
    }
    print_state(&state, output)
}

async fn run_list(
    provider: &IbmVpcProvider,
    kind: &str,
    filters: &[String],
    output: OutputFormat,
) -> Result<(), String> {
    get_schema(kind)?;
    let filters = parse_filters(filters)?;
    let states = provider
        .list(kind, &filters)
        .await
        .map_err(|e| e.to_string())?;

    match output {
        OutputFormat::Json => {
            let docs: Vec<serde_json::Value> = states.iter().map(state_to_json).collect();
            println!("{}", pretty(&serde_json::Value::Array(docs))?);
        }
        OutputFormat::Text => {
            if states.is_empty() {
                println!("{}", "No objects found.".yellow());
            }
            for state in &states {
                print_state(state, output)?;
                println!();
            }
        }
    }
    Ok(())
}

async fn run_exists(
    provider: &IbmVpcProvider,
    kind: &str,
    identifier: &str,
    output: OutputFormat,
) -> Result<(), String> {
    get_schema(kind)?;
    let id = ResourceId::new(kind, identifier);
    let exists = provider
        .exists(&id, identifier)
        .await
        .map_err(|e| e.to_string())?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::json!({ "exists": exists })),
        OutputFormat::Text => println!("{}", exists),
    }
    Ok(())
}

async fn run_create(
    provider: &IbmVpcProvider,
    kind: &str,
    input: &AttributeInput,
    output: OutputFormat,
) -> Result<(), String> {
    get_schema(kind)?;
    let attributes = load_attributes(input)?;
    let id = resource_id(kind, &attributes, kind);
    let resource = Resource {
        id,
        attributes,
        read_only: false,
    };

    println!("{} {}", "Creating".cyan().bold(), kind);
    let state = provider.create(&resource).await.map_err(|e| create_error(&e))?;
    println!(
        "{} {} {}",
        "✓".green(),
        kind,
        state.identifier.as_deref().unwrap_or("")
    );
    print_state(&state, output)
}

async fn run_update(
    provider: &IbmVpcProvider,
    kind: &str,
    identifier: &str,
    input: &AttributeInput,
    output: OutputFormat,
) -> Result<(), String> {
    get_schema(kind)?;
    let attributes = load_attributes(input)?;
    if attributes.is_empty() {
        return Err("Nothing to update, pass --attr or --file".to_string());
    }
    let id = resource_id(kind, &attributes, identifier);

    let from = provider
        .read(&id, Some(identifier))
        .await
        .map_err(|e| e.to_string())?;
    if !from.exists {
        return Err(format!("{} {} not found", kind, identifier));
    }
    let to = Resource {
        id: id.clone(),
        attributes,
        read_only: false,
    };

    println!("{} {} {}", "Updating".cyan().bold(), kind, identifier);
    let state = provider
        .update(&id, identifier, &from, &to)
        .await
        .map_err(|e| e.to_string())?;
    println!("{} {} {}", "✓".green(), kind, identifier);
    print_state(&state, output)
}

async fn run_delete(provider: &IbmVpcProvider, kind: &str, identifier: &str) -> Result<(), String> {
    get_schema(kind)?;
    let id = ResourceId::new(kind, identifier);
    println!("{} {} {}", "Deleting".red().bold(), kind, identifier);
    provider
        .delete(&id, identifier)
        .await
        .map_err(|e| e.to_string())?;
    println!("{} {} {}", "✓".green(), kind, identifier);
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

/// Create failures name any remote object left behind
fn create_error(err: &ProviderError) -> String {
    match &err.identifier {
        Some(identifier) => format!(
            "{} (remote object {} was created and may need to be deleted)",
            err, identifier
        ),
        None => err.to_string(),
    }
}

fn pretty(value: &serde_json::Value) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

fn state_to_json(state: &State) -> serde_json::Value {
    serde_json::json!({
        "type": state.id.resource_type,
        "identifier": state.identifier,
        "attributes": attributes_to_json(&state.attributes),
    })
}

fn print_state(state: &State, output: OutputFormat) -> Result<(), String> {
    if output == OutputFormat::Json {
        println!("{}", pretty(&state_to_json(state))?);
        return Ok(());
    }

    println!(
        "{} {}",
        state.id.resource_type.cyan().bold(),
        state.identifier.as_deref().unwrap_or("-").bold()
    );
    let mut keys: Vec<&String> = state.attributes.keys().collect();
    keys.sort();
    for key in keys {
        println!("  {} = {}", key, format_value(&state.attributes[key]));
    }
    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let strs: Vec<_> = keys
                .into_iter()
                .map(|k| format!("{}: {}", k, format_value(&map[k])))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn values_parse_by_shape() {
        assert_eq!(parse_value("true").unwrap(), Value::Bool(true));
        assert_eq!(parse_value("256").unwrap(), Value::Int(256));
        assert_eq!(parse_value("-1").unwrap(), Value::Int(-1));
        assert_eq!(
            parse_value("10.240.0.0/24").unwrap(),
            Value::String("10.240.0.0/24".to_string())
        );
        assert_eq!(
            parse_value("@json:[\"r006-a\",\"r006-b\"]").unwrap(),
            Value::List(vec![Value::from("r006-a"), Value::from("r006-b")])
        );
        assert_eq!(parse_value("@json:\"42\"").unwrap(), Value::from("42"));
        assert!(parse_value("@json:{").is_err());
        assert!(parse_value("@json:null").is_err());
    }

    #[test]
    fn assignments_need_key_and_equals() {
        let (key, value) = parse_assignment("name=web=1").unwrap();
        assert_eq!(key, "name");
        assert_eq!(value, Value::from("web=1"));
        assert!(parse_assignment("name").is_err());
        assert!(parse_assignment("=web").is_err());
    }

    #[test]
    fn file_attributes_are_overridden_by_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"name": "web", "total_ipv4_address_count": 256, "public_gateway": null}}"#
        )
        .unwrap();

        let input = AttributeInput {
            attrs: vec!["name=db".to_string()],
            file: Some(file.path().to_path_buf()),
        };
        let attributes = load_attributes(&input).unwrap();
        assert_eq!(attributes.get("name"), Some(&Value::from("db")));
        assert_eq!(attributes.get("total_ipv4_address_count"), Some(&Value::Int(256)));
        assert!(!attributes.contains_key("public_gateway"));
    }

    #[test]
    fn attribute_file_must_be_an_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        let err = load_attribute_file(file.path()).unwrap_err();
        assert!(err.contains("JSON object"));

        let missing = load_attribute_file(Path::new("/nonexistent/attrs.json")).unwrap_err();
        assert!(missing.contains("Failed to read"));
    }

    #[test]
    fn filters_parse() {
        let filters = parse_filters(&["zone=us-south-1".to_string()]).unwrap();
        assert_eq!(filters.get("zone").map(String::as_str), Some("us-south-1"));
        assert!(parse_filters(&["zone".to_string()]).is_err());
    }

    #[test]
    fn label_prefers_name() {
        let mut attributes = HashMap::new();
        assert_eq!(resource_id("is_vpc", &attributes, "r006-vpc").name, "r006-vpc");
        attributes.insert("name".to_string(), Value::from("main"));
        assert_eq!(resource_id("is_vpc", &attributes, "r006-vpc").name, "main");
    }

    #[test]
    fn unknown_kind_is_reported() {
        let err = get_schema("is_instance").unwrap_err();
        assert!(err.contains("is_instance"));
        assert!(get_schema("is_subnet").is_ok());
    }

    #[test]
    fn huge_timeouts_saturate() {
        assert_eq!(timeout_from_minutes(30), Duration::from_secs(1800));
        assert_eq!(timeout_from_minutes(u64::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn schema_json_lists_replacement_attributes() {
        let doc = schema_to_json(&get_schema("is_subnet").unwrap());
        let replaced = doc["replaced_on_change"].as_array().unwrap();
        assert!(replaced.contains(&serde_json::json!("zone")));
        assert!(!replaced.contains(&serde_json::json!("name")));
    }

    #[test]
    fn create_errors_name_leftover_objects() {
        let err = ProviderError::timeout("Timed out").with_identifier("r006-subnet");
        assert!(create_error(&err).contains("r006-subnet"));
        assert_eq!(create_error(&ProviderError::new("boom")), "boom");
    }

    #[test]
    fn values_format_stably() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), Value::Int(2));
        map.insert("a".to_string(), Value::from("x"));
        assert_eq!(format_value(&Value::Map(map)), "{a: \"x\", b: 2}");
        assert_eq!(
            format_value(&Value::List(vec![Value::Bool(true), Value::Int(1)])),
            "[true, 1]"
        );
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vpcform",
            "list",
            "is_subnet",
            "--filter",
            "zone=us-south-1",
            "--output",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::List { ref filters, .. } if filters.len() == 1));
    }
}
