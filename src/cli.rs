use clap::{ArgAction, Parser, Subcommand};
use package_size::application::dto::OutputFormat;
use package_size::config::Overrides;
use std::path::PathBuf;

/// Measure the installed footprint of npm packages
///
/// Every package is installed with `npm install` in a disposable Docker
/// container; sizes come from the resulting node_modules directory.
#[derive(Parser, Debug)]
#[command(name = "package-size")]
#[command(version)]
#[command(about = "Measure the installed footprint of npm packages", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to ./package-size.config.yml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Keep sandbox directories for inspection
    #[arg(long, global = true)]
    pub no_cleanup: bool,

    /// Host npm cache mounted read-only into every sandbox (absolute path)
    #[arg(long, global = true, value_name = "ABS DIR")]
    pub npm_cache: Option<PathBuf>,

    /// Container image to install in
    #[arg(long, global = true)]
    pub image: Option<String>,

    /// npm registry base URL
    #[arg(long = "registry", global = true, value_name = "URL")]
    pub registry_url: Option<String>,

    /// npm download-count API base URL
    #[arg(long = "api", global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Concurrent registry lookups when resolving dependency lists
    #[arg(long = "resolvers", global = true, value_name = "N")]
    pub resolver_workers: Option<usize>,

    /// Registry request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub registry_timeout: Option<u64>,

    /// npm install timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub install_timeout: Option<u64>,

    /// Do not forward npm output
    #[arg(long, global = true)]
    pub quiet_install: bool,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Diagnostics as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Install one package and report its size
    Measure {
        /// Package specifier: name, name@range or "name range"
        spec: String,
    },
    /// Estimate the effect of removing or adding dependencies of a package
    Change {
        spec: String,
        /// Dependency to remove; without a version the installed one is used
        #[arg(long, value_name = "NAME[@VERSION]")]
        remove: Vec<String>,
        /// Dependency to add
        #[arg(long, value_name = "SPEC")]
        add: Vec<String>,
        /// Also install the edited package.json to check the estimate
        #[arg(long)]
        verify: bool,
    },
    /// Compare two versions of a package
    Versions {
        name: String,
        old: String,
        new: String,
    },
    /// Measure each direct dependency of a package
    Deps {
        spec: String,
        /// Include devDependencies
        #[arg(long)]
        dev: bool,
    },
    /// Resolve the direct dependencies of a package without installing anything
    Resolve {
        spec: String,
        /// Include devDependencies
        #[arg(long)]
        dev: bool,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            image: self.image.clone(),
            npm_cache: self.npm_cache.clone(),
            no_cleanup: self.no_cleanup,
            quiet_install: self.quiet_install,
            resolver_workers: self.resolver_workers,
            registry_url: self.registry_url.clone(),
            api_url: self.api_url.clone(),
            registry_timeout_secs: self.registry_timeout,
            install_timeout_secs: self.install_timeout,
            format: self.format,
        }
    }
}
