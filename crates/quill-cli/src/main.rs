use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use quill_config::{discover_config_path, init_tracing, ConfigDiagnostics, QuillConfig};
use quill_resolve::{
    format_constructor_signature, format_failure_reason, Applicability, ArgumentList,
    ConstructorResolver, NewExpression, NewTarget, ResolveOptions, ResolvedConstructor,
    TypeReference,
};
use quill_types::{format_type, Diagnostic, PrimitiveType, Severity, TypeEnv};
use serde::Serialize;

mod world;

use world::World;

#[derive(Parser)]
#[command(
    name = "quill",
    version,
    about = "Resolve Groovy constructor calls against a described class world"
)]
struct Cli {
    /// Config file to use instead of discovering `quill.toml` in the current directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a `new` expression and report the applicable constructors
    Resolve(ResolveArgs),
    /// List every constructor reachable through a type reference, unchecked
    Variants(VariantsArgs),
    /// Print the JSON schema of `quill.toml`
    Schema,
}

#[derive(Args)]
struct ResolveArgs {
    /// World file describing the classes in scope
    world: PathBuf,

    /// Type reference after `new`, e.g. `Point`, `Box<String>` or `HashMap<>`
    #[arg(long = "type", value_name = "TYPE")]
    type_ref: String,

    /// Positional argument type (`int`, `String`, `null`, ...); repeat per argument
    #[arg(long = "arg", value_name = "TYPE")]
    args: Vec<String>,

    /// Named argument `label=TYPE`; repeat per entry
    #[arg(long = "named", value_name = "LABEL=TYPE", value_parser = parse_named_arg)]
    named: Vec<(String, String)>,

    /// The call has no argument list yet (`new Point`)
    #[arg(long, conflicts_with_all = ["args", "named"])]
    no_arguments: bool,

    /// Array dimensions for `new T[n]...`
    #[arg(long, default_value_t = 0)]
    dims: usize,

    /// The call is followed by an anonymous class body
    #[arg(long)]
    anonymous: bool,

    /// Return every candidate without checking arguments
    #[arg(long)]
    incomplete: bool,

    /// Disable variable-arity matching
    #[arg(long)]
    no_varargs: bool,

    /// Require every parameter, including those with defaults
    #[arg(long)]
    no_default_params: bool,

    /// Pass named arguments of mixed calls as a leading map parameter
    #[arg(long)]
    named_args_as_leading_map: bool,

    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct VariantsArgs {
    /// World file describing the classes in scope
    world: PathBuf,

    /// Type reference after `new`
    #[arg(long = "type", value_name = "TYPE")]
    type_ref: String,

    /// Emit JSON
    #[arg(long)]
    json: bool,
}

fn parse_named_arg(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((label, ty)) if !label.trim().is_empty() && !ty.trim().is_empty() => {
            Ok((label.trim().to_string(), ty.trim().to_string()))
        }
        _ => Err(format!("expected LABEL=TYPE, got `{text}`")),
    }
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let (config, config_path, diagnostics) = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);
    report_config_diagnostics(config_path.as_deref(), &diagnostics);

    match cli.command {
        Command::Resolve(args) => {
            let world = World::load(&args.world)?;
            let options = resolve_options(&config.resolve, &args);
            let report = resolve(&world, &args, options)?;
            let exit = if report.has_errors() { 1 } else { 0 };
            print_output(&report, args.json)?;
            Ok(exit)
        }
        Command::Variants(args) => {
            let world = World::load(&args.world)?;
            let report = variants(&world, &args.type_ref)?;
            let exit = if report.candidates.is_empty() { 1 } else { 0 };
            print_output(&report, args.json)?;
            Ok(exit)
        }
        Command::Schema => {
            let schema = quill_config::json_schema();
            print_output(&schema, true)?;
            Ok(0)
        }
    }
}

fn load_config(
    explicit: Option<&Path>,
) -> Result<(QuillConfig, Option<PathBuf>, ConfigDiagnostics)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            discover_config_path(&cwd)
        }
    };
    let Some(path) = path else {
        return Ok((QuillConfig::default(), None, ConfigDiagnostics::default()));
    };
    let (config, diagnostics) = QuillConfig::load_from_path_with_diagnostics(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    Ok((config, Some(path), diagnostics))
}

fn report_config_diagnostics(path: Option<&Path>, diagnostics: &ConfigDiagnostics) {
    let path = path.map(|path| path.display().to_string()).unwrap_or_default();
    for key in &diagnostics.unknown_keys {
        tracing::warn!(target: "quill.config", path = %path, key = %key, "unknown config key");
    }
    for warning in &diagnostics.warnings {
        tracing::warn!(target: "quill.config", path = %path, "{warning}");
    }
}

fn resolve_options(base: &ResolveOptions, args: &ResolveArgs) -> ResolveOptions {
    ResolveOptions {
        varargs: base.varargs && !args.no_varargs,
        default_params: base.default_params && !args.no_default_params,
        named_args_as_leading_map: base.named_args_as_leading_map
            || args.named_args_as_leading_map,
    }
}

fn new_expression(world: &World, args: &ResolveArgs) -> Result<NewExpression> {
    if args.dims > 0 {
        let target = match PrimitiveType::from_keyword(args.type_ref.trim()) {
            Some(prim) => NewTarget::Builtin(prim),
            None => NewTarget::Reference(parse_reference(&args.type_ref)?),
        };
        return Ok(NewExpression::array(target, args.dims));
    }

    let reference = parse_reference(&args.type_ref)?;
    let expr = if args.no_arguments {
        NewExpression::without_arguments(reference)
    } else {
        let mut list = ArgumentList::new();
        for (label, ty) in &args.named {
            let ty = world
                .argument_type(ty)
                .with_context(|| format!("invalid named argument `{label}`"))?;
            list = list.with_named(label.clone(), ty);
        }
        for text in &args.args {
            let ty = world
                .argument_type(text)
                .with_context(|| format!("invalid argument `{text}`"))?;
            list = list.with_expr(ty);
        }
        NewExpression::new(reference, list)
    };
    Ok(if args.anonymous {
        expr.with_anonymous_body()
    } else {
        expr
    })
}

fn parse_reference(text: &str) -> Result<TypeReference> {
    TypeReference::parse(text).with_context(|| format!("invalid type reference `{text}`"))
}

#[derive(Debug, Serialize)]
struct CandidateReport {
    class: String,
    /// Declaration index; `None` for the implicit no-argument constructor.
    index: Option<usize>,
    signature: String,
    applicability: Applicability,
    params: Vec<String>,
    substitution: Vec<SubstitutionEntry>,
}

#[derive(Debug, Serialize)]
struct SubstitutionEntry {
    var: String,
    #[serde(rename = "type")]
    ty: String,
}

impl CandidateReport {
    fn new(env: &dyn TypeEnv, resolved: &ResolvedConstructor) -> Self {
        let class = env
            .class(resolved.candidate.owner.class)
            .map(|def| def.name.clone())
            .unwrap_or_default();
        let substitution = resolved
            .substitution
            .iter()
            .map(|(var, ty)| SubstitutionEntry {
                var: env
                    .type_param(var)
                    .map(|def| def.name.clone())
                    .unwrap_or_else(|| format!("T#{}", var.to_raw())),
                ty: format_type(env, ty),
            })
            .collect();
        Self {
            class,
            index: resolved.candidate.index,
            signature: format_constructor_signature(env, &resolved.candidate),
            applicability: resolved.applicability,
            params: resolved
                .call_params
                .iter()
                .map(|ty| format_type(env, ty))
                .collect(),
            substitution,
        }
    }
}

#[derive(Debug, Serialize)]
struct RejectedReport {
    signature: String,
    reason: String,
}

#[derive(Debug, Serialize)]
struct ResolveReport {
    expression: String,
    #[serde(rename = "type")]
    ty: String,
    candidates: Vec<CandidateReport>,
    rejected: Vec<RejectedReport>,
    /// The most specific candidate, when there is exactly one.
    unique: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl ResolveReport {
    fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == Severity::Error)
    }
}

fn resolve(world: &World, args: &ResolveArgs, options: ResolveOptions) -> Result<ResolveReport> {
    let env = world.env();
    let scope = world.scope();
    let resolver = ConstructorResolver::new(env, &scope).with_options(options);
    let expr = new_expression(world, args)?;

    let result = resolver.resolve_new_expression(&expr, args.incomplete);
    let unique = if args.incomplete {
        None
    } else {
        resolver
            .resolve_new_expression_target(&expr)
            .map(|resolved| format_constructor_signature(env, &resolved.candidate))
    };
    let diagnostics = if args.incomplete {
        Vec::new()
    } else {
        resolver.diagnostics(&expr)
    };

    Ok(ResolveReport {
        expression: describe_expression(args),
        ty: format_type(env, &resolver.new_expression_type(&expr)),
        candidates: result
            .iter()
            .map(|resolved| CandidateReport::new(env, resolved))
            .collect(),
        rejected: result
            .rejected
            .iter()
            .map(|rejected| RejectedReport {
                signature: format_constructor_signature(env, &rejected.candidate),
                reason: format_failure_reason(env, &rejected.reason),
            })
            .collect(),
        unique,
        diagnostics,
    })
}

fn describe_expression(args: &ResolveArgs) -> String {
    let mut out = format!("new {}", args.type_ref.trim());
    if args.dims > 0 {
        out.push_str(&"[]".repeat(args.dims));
        return out;
    }
    if args.no_arguments {
        return out;
    }
    let rendered: Vec<String> = args
        .named
        .iter()
        .map(|(label, ty)| format!("{label}: {ty}"))
        .chain(args.args.iter().cloned())
        .collect();
    out.push('(');
    out.push_str(&rendered.join(", "));
    out.push(')');
    if args.anonymous {
        out.push_str(" {}");
    }
    out
}

#[derive(Debug, Serialize)]
struct VariantsReport {
    reference: String,
    candidates: Vec<CandidateReport>,
}

fn variants(world: &World, type_ref: &str) -> Result<VariantsReport> {
    let env = world.env();
    let scope = world.scope();
    let resolver = ConstructorResolver::new(env, &scope);
    let reference = parse_reference(type_ref)?;
    let candidates = resolver
        .call_variants(&reference)
        .iter()
        .map(|resolved| CandidateReport::new(env, resolved))
        .collect();
    Ok(VariantsReport {
        reference: reference.to_string(),
        candidates,
    })
}

fn print_output<T: Serialize + 'static>(value: &T, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(value)?;
        println!("{out}");
        return Ok(());
    }

    // Human output for reports; everything else falls back to pretty JSON.
    let any = value as &dyn std::any::Any;
    if let Some(report) = any.downcast_ref::<ResolveReport>() {
        println!("{}: {}", report.expression, report.ty);
        if report.candidates.is_empty() {
            println!("no applicable constructors");
        }
        for candidate in &report.candidates {
            print_candidate(candidate);
        }
        if let Some(unique) = &report.unique {
            println!("selected: {unique}");
        }
        for diag in &report.diagnostics {
            let severity = match diag.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info => "info",
            };
            println!("{severity}[{}]: {}", diag.code, diag.message);
        }
    } else if let Some(report) = any.downcast_ref::<VariantsReport>() {
        println!("{}: {} constructor(s)", report.reference, report.candidates.len());
        for candidate in &report.candidates {
            print_candidate(candidate);
        }
    } else {
        let out = serde_json::to_string_pretty(value)?;
        println!("{out}");
    }
    Ok(())
}

fn print_candidate(candidate: &CandidateReport) {
    let applicability = match candidate.applicability {
        Applicability::Applicable => "applicable",
        Applicability::ApplicableByVarargs => "applicable by varargs",
        Applicability::Unchecked => "unchecked",
    };
    println!("  - {} [{applicability}]", candidate.signature);
    for entry in &candidate.substitution {
        println!("      {} = {}", entry.var, entry.ty);
    }
}
