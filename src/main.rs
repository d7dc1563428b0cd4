mod cli;
mod logging;

use cli::{Args, Command};
use package_size::adapters::outbound::console::StderrProgressReporter;
use package_size::adapters::outbound::container::DockerCli;
use package_size::adapters::outbound::filesystem::FileSystemArtifacts;
use package_size::adapters::outbound::network::{CachingRegistry, NpmRegistryClient};
use package_size::application::dto::Report;
use package_size::application::factories::{FormatterFactory, PresenterFactory, PresenterType};
use package_size::application::services::{
    LogSink, PackageMeasurer, SandboxExecutor, SandboxOptions,
};
use package_size::application::use_cases::{
    CompareVersionsUseCase, EstimateDependencyChangeUseCase, MeasureDependenciesUseCase,
    ResolveDependenciesUseCase,
};
use package_size::config::{self, Settings};
use package_size::shared::error::ExitCode;
use package_size::shared::Result;
use std::process;
use std::sync::Arc;

type Registry = CachingRegistry<NpmRegistryClient>;
type Measurer = PackageMeasurer<DockerCli, FileSystemArtifacts>;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();
    logging::init(args.verbose, args.log_json);

    if let Err(e) = run(args).await {
        eprintln!("\n❌ An error occurred:\n");
        eprintln!("{}", e);

        // Display error chain
        for cause in e.chain().skip(1) {
            eprintln!("\nCaused by: {}", cause);
        }

        eprintln!();
        process::exit(ExitCode::for_error(&e).as_i32());
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args)?;
    tracing::debug!(?settings, "Effective settings");

    let registry: Arc<Registry> = Arc::new(CachingRegistry::new(NpmRegistryClient::new(
        &settings.registry_url,
        &settings.api_url,
        settings.registry_timeout,
    )?));
    let resolver =
        ResolveDependenciesUseCase::new(Arc::clone(&registry), settings.resolver_workers);

    let report = match args.command {
        Command::Resolve { spec, dev } => Report::Resolution(resolver.execute(&spec, dev).await?),
        Command::Measure { spec } => {
            let (package, _) = resolver.resolve_specifier(&spec).await?;
            let use_case = EstimateDependencyChangeUseCase::new(
                Arc::clone(&registry),
                create_measurer(&settings).await?,
                StderrProgressReporter::new(),
            );
            Report::Measure(use_case.measure_package(&package).await?)
        }
        Command::Change {
            spec,
            remove,
            add,
            verify,
        } => {
            let (package, _) = resolver.resolve_specifier(&spec).await?;
            let use_case = EstimateDependencyChangeUseCase::new(
                Arc::clone(&registry),
                create_measurer(&settings).await?,
                StderrProgressReporter::new(),
            );
            let request = use_case
                .prepare_request(package, &remove, &add, verify)
                .await?;
            Report::Change(use_case.execute(request).await?)
        }
        Command::Versions { name, old, new } => {
            let use_case = CompareVersionsUseCase::new(
                Arc::clone(&registry),
                create_measurer(&settings).await?,
                StderrProgressReporter::new(),
            );
            Report::Versions(use_case.execute(&name, &old, &new).await?)
        }
        Command::Deps { spec, dev } => {
            let (package, _) = resolver.resolve_specifier(&spec).await?;
            let use_case = MeasureDependenciesUseCase::new(
                Arc::clone(&registry),
                create_measurer(&settings).await?,
                StderrProgressReporter::new(),
                settings.resolver_workers,
            );
            Report::Dependencies(use_case.execute(&package, dev).await?)
        }
    };

    eprintln!("{}", FormatterFactory::progress_message(settings.format));
    let formatter = FormatterFactory::create(settings.format);
    let formatted_output = formatter.format(&report)?;

    let presenter = PresenterFactory::create(PresenterType::for_output(args.output));
    presenter.present(&formatted_output)?;

    Ok(())
}

fn load_settings(args: &Args) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => Some(config::load_config_from_path(path)?),
        None => config::discover_config(&std::env::current_dir()?)?,
    };
    Settings::resolve(&args.overrides(), file)
}

/// Builds the sandbox stack and makes sure the image is available locally.
async fn create_measurer(settings: &Settings) -> Result<Measurer> {
    let options = SandboxOptions {
        image: settings.image.clone(),
        npm_cache: settings.npm_cache.clone(),
        no_cleanup: settings.no_cleanup,
        log_sink: if settings.stream_install_logs {
            LogSink::Stderr
        } else {
            LogSink::Discard
        },
        install_timeout: Some(settings.install_timeout),
        sandbox_root: None,
    };
    let executor = SandboxExecutor::new(Arc::new(DockerCli::new()), options);
    executor.prepare_image().await?;
    Ok(PackageMeasurer::new(executor, FileSystemArtifacts::new()))
}
