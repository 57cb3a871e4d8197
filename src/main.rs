//! wpbundle CLI
//!
//! Entry point for the `wpbundle` command-line tool.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process;
use wpbundle::config::{load_project, Registry, Scope};
use wpbundle::logging::{init_subscriber, Verbosity};
use wpbundle::{Bundle, LayeredConfig};

#[derive(Parser)]
#[command(name = "wpbundle")]
#[command(about = "Assemble production bundles of WordPress plugins", version)]
struct Cli {
    /// Project root (default: current directory)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Show debug output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the selected files into the output directory and finish the bundle
    Build {
        /// Output directory, relative to the project root
        #[arg(long, short = 'o')]
        output: Option<String>,

        /// Keep the existing output directory contents
        #[arg(long)]
        no_clean: bool,

        /// Write an archive of the output directory
        #[arg(long)]
        archive: bool,

        /// Archive name (default: project directory name)
        #[arg(long)]
        archive_name: Option<String>,

        /// Archive format: zip or tar
        #[arg(long)]
        format: Option<String>,

        /// Skip `composer install`
        #[arg(long)]
        no_composer: bool,

        /// Run php-scoper on the output directory
        #[arg(long)]
        scoper: bool,

        /// Output the report in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the entries that would be copied, without copying
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Inspect or edit the project configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as JSON
    Show,

    /// Print the effective value of a key as JSON
    Get { key: String },

    /// Set a key in the project configuration
    Set {
        key: String,

        /// JSON value; anything that does not parse is stored as a string
        value: String,

        /// Configuration file to write (default: wpbundle.json or composer.json)
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// Remove a key from the project configuration
    Unset {
        key: String,

        /// Configuration file to write (default: wpbundle.json or composer.json)
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
}

/// Settings from `build` flags, written to the overrides registry
struct BuildFlags {
    output: Option<String>,
    no_clean: bool,
    archive: bool,
    archive_name: Option<String>,
    format: Option<String>,
    no_composer: bool,
    scoper: bool,
}

impl BuildFlags {
    fn overrides(&self) -> Vec<(&'static str, Value)> {
        let mut values = Vec::new();
        if let Some(ref output) = self.output {
            values.push(("output", json!(output)));
        }
        if self.no_clean {
            values.push(("clean", json!(false)));
        }
        if self.archive {
            values.push(("archive.enabled", json!(true)));
        }
        if let Some(ref name) = self.archive_name {
            values.push(("archive.name", json!(name)));
        }
        if let Some(ref format) = self.format {
            values.push(("archive.format", json!(format)));
        }
        if self.no_composer {
            values.push(("composer.install", json!(false)));
        }
        if self.scoper {
            values.push(("scoper.enabled", json!(true)));
        }
        values
    }
}

fn main() {
    let cli = Cli::parse();
    init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet));

    match cli.command {
        Commands::Build {
            output,
            no_clean,
            archive,
            archive_name,
            format,
            no_composer,
            scoper,
            json,
        } => {
            let flags = BuildFlags {
                output,
                no_clean,
                archive,
                archive_name,
                format,
                no_composer,
                scoper,
            };
            run_build(&cli.root, &flags, json);
        }
        Commands::List { json } => {
            run_list(&cli.root, json);
        }
        Commands::Config { action } => match action {
            ConfigCommands::Show => run_config_show(&cli.root),
            ConfigCommands::Get { key } => run_config_get(&cli.root, &key),
            ConfigCommands::Set { key, value, file } => {
                run_config_set(&cli.root, &key, Some(&value), file)
            }
            ConfigCommands::Unset { key, file } => run_config_set(&cli.root, &key, None, file),
        },
    }
}

fn load_config(root: &Path) -> LayeredConfig {
    let mut config = LayeredConfig::default();
    match load_project(&mut config, root) {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "loaded project configuration"),
        Ok(None) => tracing::debug!("no project configuration, using built-in defaults"),
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    }
    config
}

fn open_bundle(root: &Path, config: &LayeredConfig) -> Bundle {
    match Bundle::new(root, config) {
        Ok(bundle) => bundle,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_build(root: &Path, flags: &BuildFlags, json_output: bool) {
    let mut config = load_config(root);
    for (key, value) in flags.overrides() {
        if let Err(e) = config.set(key, value, Registry::Overrides) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    let bundle = open_bundle(root, &config);
    let report = match bundle.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        print_json(&report);
        return;
    }

    println!(
        "Bundled {} entries into {}",
        report.entries.len(),
        report.output.display()
    );
    if !report.removed.is_empty() {
        println!("  Removed: {}", report.removed.len());
    }
    for tool in &report.tools {
        println!("  Ran: {}", tool);
    }
    if let Some(ref archive) = report.archive {
        println!("  Archive: {}", archive.path.display());
        println!("  SHA-256: {}", archive.sha256);
    }
}

fn run_list(root: &Path, json_output: bool) {
    let config = load_config(root);
    let bundle = open_bundle(root, &config);
    let set = match bundle.resolve() {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let entries = set.entries();
    if json_output {
        let keys: Vec<&str> = entries.keys().collect();
        print_json(&json!({
            "entries": keys,
            "removals": set.removal_list(),
        }));
        return;
    }

    for key in entries.keys() {
        println!("{}", key);
    }
    for removal in set.removal_list() {
        println!("- {}", removal);
    }
}

fn run_config_show(root: &Path) {
    let config = load_config(root);
    print_json(&config.merged());
}

fn run_config_get(root: &Path, key: &str) {
    let config = load_config(root);
    match config.get(key) {
        Ok(value) => print_json(value),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Set (`value` present) or unset a key in the defaults registry and write
/// it back to its file.
fn run_config_set(root: &Path, key: &str, value: Option<&str>, file: Option<PathBuf>) {
    let mut config = match file {
        Some(path) => {
            let path = root.join(path);
            let mut config = LayeredConfig::empty();
            if path.exists() {
                if let Err(e) = config.load(&path, None, Registry::Defaults) {
                    eprintln!("Error loading configuration: {}", e);
                    process::exit(1);
                }
            }
            config.bind(Registry::Defaults, path, None);
            config
        }
        None => load_config(root),
    };

    let result = match value {
        Some(raw) => {
            let parsed =
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            config.set(key, parsed, Registry::Defaults)
        }
        None => {
            if !config.delete(key, Scope::Registry(Registry::Defaults)) {
                tracing::warn!(key, "key not set in project configuration");
            }
            Ok(())
        }
    };

    if let Err(e) = result.and_then(|()| config.save_bound(Registry::Defaults, false)) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Some(binding) = config.binding(Registry::Defaults) {
        println!("Updated {}", binding.path.display());
    }
}
