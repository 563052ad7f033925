//! StackForge CLI
//!
//! `forge synth` composes all configured units and writes one template JSON
//! file per stack; `forge validate` parses and validates the configuration
//! documents without synthesizing anything.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Arg, ArgAction, Command};

use forge_compose::{compose_all, ForgeConfig};
use forge_config::{AppDef, GroupConfig, InfraDef};
use forge_template::{Environment, PolicyDocument};

fn config_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("groups")
            .long("groups")
            .required(true)
            .value_name("FILE")
            .help("Group definitions JSON file"),
    )
    .arg(
        Arg::new("base-policy")
            .long("base-policy")
            .required(true)
            .value_name("FILE")
            .help("Base managed-policy document JSON file"),
    )
    .arg(
        Arg::new("infra")
            .long("infra")
            .required(true)
            .value_name("FILE")
            .help("Infrastructure definition JSON file"),
    )
    .arg(
        Arg::new("app")
            .long("app")
            .value_name("FILE")
            .help("Application definition JSON file (defaults apply when omitted)"),
    )
    .arg(
        Arg::new("skip-app")
            .long("skip-app")
            .action(ArgAction::SetTrue)
            .help("Do not compose the application stack"),
    )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Command::new("forge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Declarative cloud-resource composition")
        .arg_required_else_help(true)
        .subcommand(config_args(
            Command::new("synth")
                .about("Compose all units and write template JSON files")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .default_value("out")
                        .value_name("DIR")
                        .help("Output directory for template files"),
                ),
        ))
        .subcommand(config_args(
            Command::new("validate").about("Parse and validate configuration documents"),
        ));

    match cli.get_matches().subcommand() {
        Some(("synth", args)) => {
            let config = load_config(args)?;
            let out_dir = PathBuf::from(args.get_one::<String>("out").expect("has default"));
            synth(&config, &out_dir)
        }
        Some(("validate", args)) => {
            let config = load_config(args)?;
            println!(
                "ok: {} group(s), {} base policy statement(s), {}",
                config.groups.len(),
                config.base_policy.statement_count(),
                if config.app.is_some() {
                    "app configured"
                } else {
                    "app skipped"
                },
            );
            Ok(())
        }
        _ => unreachable!("subcommand required"),
    }
}

fn load_config(args: &clap::ArgMatches) -> anyhow::Result<ForgeConfig> {
    let groups_path = args.get_one::<String>("groups").expect("required");
    let policy_path = args.get_one::<String>("base-policy").expect("required");
    let infra_path = args.get_one::<String>("infra").expect("required");

    let groups = GroupConfig::load(groups_path)
        .with_context(|| format!("loading group definitions from {groups_path}"))?;
    let base_policy = load_policy(Path::new(policy_path))
        .with_context(|| format!("loading base policy from {policy_path}"))?;
    let infra = InfraDef::load(infra_path)
        .with_context(|| format!("loading infra definition from {infra_path}"))?;

    tracing::debug!(
        groups = groups.len(),
        statements = base_policy.statement_count(),
        "configuration loaded"
    );

    let app = if args.get_flag("skip-app") {
        None
    } else {
        match args.get_one::<String>("app") {
            Some(path) => Some(
                AppDef::load(path).with_context(|| format!("loading app definition from {path}"))?,
            ),
            None => Some(AppDef::default()),
        }
    };

    Ok(ForgeConfig {
        groups,
        base_policy,
        infra,
        app,
    })
}

fn load_policy(path: &Path) -> anyhow::Result<PolicyDocument> {
    let contents = fs::read_to_string(path)?;
    let document: serde_json::Value = serde_json::from_str(&contents)?;
    Ok(PolicyDocument::from_json(document)?)
}

fn synth(config: &ForgeConfig, out_dir: &Path) -> anyhow::Result<()> {
    let env = Environment::from_env();
    let (app, _) = compose_all(&env, config)?;
    let templates = app.synth()?;
    tracing::info!(
        stacks = templates.len(),
        out_dir = %out_dir.display(),
        "synthesized deployment"
    );

    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    for (name, template) in templates {
        let path = out_dir.join(format!("{name}.template.json"));
        fs::write(&path, serde_json::to_string_pretty(&template)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}
