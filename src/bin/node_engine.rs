//! Node Engine command line interface
//!
//! Inspect node trees without a host UI.
//!
//! # Usage
//!
//! ```bash
//! # Validate a tree (field-level errors)
//! node-engine validate tree.json
//!
//! # Render with the built-in renderers
//! node-engine render tree.json --config engine.yaml
//!
//! # Navigate to a node, then press back twice
//! node-engine navigate tree.json --to g1 --back 2
//!
//! # Navigate and render the shell as the user would see it
//! node-engine navigate tree.json --to g1 --render
//!
//! # Effective context menu of a node
//! node-engine menu tree.json --node t1
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use node_engine::{
    back_priority, builtin_registry, menu, model, shell_back_handler, BackDispatcher,
    EngineConfig, Node, NodeId, ShellNavigator, ViewEngine,
};
use serde_json::json;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "node-engine")]
#[command(version)]
#[command(about = "Validate, render and navigate data-driven node trees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a node tree
    Validate {
        /// Tree JSON file
        file: PathBuf,
    },

    /// Render a node tree with the built-in renderers
    Render {
        /// Tree JSON file
        file: PathBuf,

        /// Engine config YAML (NODE_ENGINE_* variables apply on top)
        #[arg(short, long, env = "NODE_ENGINE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Navigate the shell and print path, tab and breadcrumbs
    Navigate {
        /// Tree JSON file
        file: PathBuf,

        /// Target node id
        #[arg(long)]
        to: String,

        /// Back presses after navigating
        #[arg(long, default_value_t = 0)]
        back: usize,

        /// Also render the shell with the resulting navigation state
        #[arg(long)]
        render: bool,
    },

    /// Show the effective context menu of a node
    Menu {
        /// Tree JSON file
        file: PathBuf,

        /// Node id
        #[arg(long)]
        node: String,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,node_engine=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Validate { file } => cmd_validate(&file, cli.format),
        Commands::Render { file, config } => cmd_render(&file, config.as_deref(), cli.format),
        Commands::Navigate {
            file,
            to,
            back,
            render,
        } => cmd_navigate(&file, &to, back, render, cli.format),
        Commands::Menu { file, node } => cmd_menu(&file, &node, cli.format),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn load_tree(path: &Path) -> Result<Arc<Node>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Node::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

fn node_id(raw: &str) -> Result<NodeId> {
    raw.parse().with_context(|| format!("invalid node id '{raw}'"))
}

fn cmd_validate(file: &Path, format: OutputFormat) -> Result<bool> {
    let tree = load_tree(file)?;
    let result = model::validate(&tree);

    match format {
        OutputFormat::Json => {
            let issues = |list: &[node_engine::ValidationError]| {
                list.iter()
                    .map(|e| json!({"code": e.code(), "field": e.field(), "message": e.to_string()}))
                    .collect::<Vec<_>>()
            };
            let out = json!({
                "valid": result.is_valid(),
                "errors": issues(&result.errors[..]),
                "warnings": issues(&result.warnings[..]),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for e in &result.errors {
                println!("error   [{}] {}: {e}", e.code(), e.field());
            }
            for w in &result.warnings {
                println!("warning [{}] {}: {w}", w.code(), w.field());
            }
            println!(
                "{}: {} node(s), {} error(s), {} warning(s)",
                if result.is_valid() { "valid" } else { "invalid" },
                tree.subtree_len(),
                result.errors.len(),
                result.warnings.len()
            );
        }
    }
    Ok(result.is_valid())
}

fn cmd_render(file: &Path, config: Option<&Path>, format: OutputFormat) -> Result<bool> {
    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    }
    .with_env_overrides();

    let tree = load_tree(file)?;
    let mut engine = ViewEngine::new(builtin_registry()).with_config(config);
    let rendered = engine.render_validated(&tree)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rendered)?),
        OutputFormat::Text => {
            print!("{}", rendered.to_text());
            let s = rendered.stats;
            println!(
                "-- rendered {} (exact {}, type default {}, fallback {}, truncated {})",
                s.rendered, s.exact, s.type_default, s.fallback, s.truncated
            );
        }
    }
    Ok(true)
}

fn cmd_navigate(
    file: &Path,
    to: &str,
    back: usize,
    render: bool,
    format: OutputFormat,
) -> Result<bool> {
    let tree = load_tree(file)?;
    let target = node_id(to)?;
    let config = EngineConfig::from_env();
    let default_tab = config.default_tab.as_deref().and_then(|id| id.parse().ok());

    let navigator = Rc::new(RefCell::new(
        ShellNavigator::new(tree).with_default_tab(default_tab),
    ));
    navigator.borrow_mut().navigate_to_node(&target)?;

    let dispatcher = BackDispatcher::new();
    let _shell = dispatcher.register(
        "shell",
        back_priority::SHELL,
        shell_back_handler(Rc::clone(&navigator)),
    );
    let mut unhandled = 0;
    for _ in 0..back {
        if !dispatcher.dispatch().is_consumed() {
            unhandled += 1;
        }
    }

    let nav = navigator.borrow();
    let rendered = render.then(|| {
        let mut engine = ViewEngine::new(builtin_registry()).with_config(config);
        engine.render_navigated(&nav)
    });
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_value(nav.state())?;
            out["unhandled_back"] = json!(unhandled);
            if let Some(rendered) = &rendered {
                out["rendered"] = serde_json::to_value(rendered)?;
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            let path: Vec<&str> = nav.target_path().iter().map(NodeId::as_str).collect();
            println!("path:  {}", path.join(" > "));
            println!(
                "tab:   {}",
                nav.active_tab_id().map(NodeId::as_str).unwrap_or("-")
            );
            println!("view:  {}", if nav.is_deep_view() { "deep" } else { "tab root" });
            println!("title: {}", nav.display_title());
            let crumbs = nav.breadcrumbs();
            let titles: Vec<&str> = crumbs.iter().map(|c| c.title.as_str()).collect();
            println!("crumbs: {}", titles.join(" / "));
            if unhandled > 0 {
                println!("({unhandled} back press(es) reached the root and were not handled)");
            }
            if let Some(rendered) = &rendered {
                print!("{}", rendered.to_text());
            }
        }
    }
    Ok(true)
}

fn cmd_menu(file: &Path, node: &str, format: OutputFormat) -> Result<bool> {
    let tree = load_tree(file)?;
    let id = node_id(node)?;
    let Some(target) = tree.find(&id) else {
        bail!("node '{id}' not found");
    };
    let resolved = menu::resolve(target, tree.parent_of(&id));

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
        OutputFormat::Text => match &resolved {
            Some(config) => {
                for option in &config.options {
                    println!("{:<16} {:<24} {}", option.id, option.label, option.action_type);
                }
            }
            None => println!("(no menu)"),
        },
    }
    Ok(true)
}
