use crate::core::config::Config;
use crate::core::download::Downloader;
use crate::core::install::{InstallOutcome, InstallPipeline};
use crate::core::platform::Platform;
use crate::core::releases::ReleaseClient;
use crate::core::version::{normalize, validate_version};
use crate::error::{GetgoError, Result};
use crate::utils::shell::{self, EnvFileUpdate};
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub version: String,
    pub install_path: Option<PathBuf>,
    pub gopath: Option<PathBuf>,
    pub unattended: bool,
    pub envrc: Option<PathBuf>,
    pub os: Option<String>,
    pub arch: Option<String>,
    pub quiet: bool,
}

pub fn install_version(options: &InstallOptions) -> Result<()> {
    let config = Config::load()?
        .with_install_root(options.install_path.as_deref())?
        .with_gopath(options.gopath.as_deref())?;
    let platform = Platform::resolve(options.os.as_deref(), options.arch.as_deref());
    let downloader = Downloader::new().quiet(options.quiet);

    let version = resolve_version(&options.version, &downloader, &config)?;
    validate_version(&version)?;

    let pipeline = InstallPipeline::new(&downloader, &config.download_base_url, &platform);
    log::debug!("archive url: {}", pipeline.archive_url(&version));

    if !pipeline.is_installed(&version, &config.install_root) {
        println!(
            "{}",
            format!(
                "Downloading Go {version} for {platform} into {} ...",
                config.install_root.display()
            )
            .cyan()
        );
    }

    let outcome = pipeline
        .install(&version, &config.install_root)
        .map_err(|e| version_not_found(e, &version, &platform, &config.download_base_url))?;

    match &outcome {
        InstallOutcome::Installed(dir) => println!(
            "{}",
            format!("Go {version} has been successfully installed to {}", dir.display()).green()
        ),
        InstallOutcome::AlreadyInstalled(dir) => println!(
            "{}",
            format!("Go version {version} already exists at {}", dir.display()).yellow()
        ),
    }

    let goroot = outcome.versioned_dir();
    print_env_vars(goroot, &config.gopath);

    if options.unattended {
        setup_environment(goroot, &config.gopath);
    }
    if let Some(envrc) = &options.envrc {
        setup_envrc(envrc, goroot, &config.gopath);
    }

    Ok(())
}

/// Turn a missing archive into an error naming the version and the page to check.
fn version_not_found(err: GetgoError, version: &str, platform: &Platform, base_url: &str) -> GetgoError {
    match err {
        GetgoError::NotFound { .. } => GetgoError::VersionNotFound {
            version: version.to_string(),
            platform: platform.to_string(),
            download_page: format!("{}/", base_url.trim_end_matches('/')),
        },
        other => other,
    }
}

fn resolve_version(requested: &str, downloader: &Downloader, config: &Config) -> Result<String> {
    if !normalize::is_latest(requested) {
        return Ok(normalize::to_plain_version(requested));
    }

    println!("{}", "Fetching latest Go version...".cyan());
    let releases = ReleaseClient::new(downloader.client().clone(), config.releases_url.as_str());
    let version = releases.latest_version().map_err(|e| match e {
        GetgoError::LatestVersionUnavailable { .. } => e,
        other => GetgoError::LatestVersionUnavailable {
            message: other.to_string(),
        },
    })?;
    println!("{}", format!("Latest Go version is {version}").green());
    Ok(version)
}

pub fn print_env_vars(goroot: &Path, gopath: &Path) {
    println!();
    println!("{}:", "Go environment variables".bold());
    println!();
    for line in shell::display_lines(goroot, gopath) {
        println!("{line}");
    }
    println!();
}

/// Persist the variables for future shells. Problems are reported, not fatal.
fn setup_environment(goroot: &Path, gopath: &Path) {
    if cfg!(windows) {
        println!("{}", "Setting up environment variables using PowerShell...".cyan());
        match shell::set_windows_user_environment(goroot, gopath) {
            Ok(()) => {
                println!("{}", "Go environment variables have been set up successfully".green());
                println!(
                    "{}",
                    "Please restart your terminal or system for the changes to take effect".yellow()
                );
            }
            Err(e) => eprintln!("{}", format!("Error setting environment variables: {e}").red()),
        }
        return;
    }

    let config_file = match shell::get_shell_config_path() {
        Ok(path) => path,
        Err(e) => {
            println!(
                "{}",
                format!(
                    "Could not determine shell configuration file ({e}). Please set up environment variables manually."
                )
                .yellow()
            );
            return;
        }
    };

    match shell::append_to_shell_config(&config_file, goroot, gopath) {
        Ok(EnvFileUpdate::AlreadyConfigured) => {
            println!(
                "{}",
                format!("Go environment variables already exist in {}", config_file.display()).yellow()
            );
            println!("{}", "You may need to update them manually:".yellow());
            for line in shell::unix_exports(goroot, gopath, false) {
                println!("{line}");
            }
        }
        Ok(update) => {
            if update == EnvFileUpdate::Created {
                println!(
                    "{}",
                    format!("Created shell configuration file {}", config_file.display()).yellow()
                );
            }
            println!(
                "{}",
                format!("Go environment variables have been added to {}", config_file.display()).green()
            );
            println!(
                "{}",
                format!("Run 'source {}' to apply the changes to your current shell", config_file.display())
                    .yellow()
            );
        }
        Err(e) => eprintln!(
            "{}",
            format!("Error updating {}: {e}", config_file.display()).red()
        ),
    }
}

fn setup_envrc(target: &Path, goroot: &Path, gopath: &Path) {
    match shell::write_envrc(target, goroot, gopath, cfg!(windows)) {
        Ok((path, EnvFileUpdate::AlreadyConfigured)) => {
            println!(
                "{}",
                format!("Go environment variables already exist in {}", path.display()).yellow()
            );
            println!("{}", "Not modifying the existing .envrc file".yellow());
        }
        Ok((path, update)) => {
            let message = if update == EnvFileUpdate::Created {
                format!("Created new .envrc file with Go environment variables at {}", path.display())
            } else {
                format!("Appended Go environment variables to existing .envrc file at {}", path.display())
            };
            println!("{}", message.green());
            println!("{}", "Run 'direnv allow' to enable the environment variables".yellow());
        }
        Err(e) => eprintln!("{}", format!("Error setting up .envrc file: {e}").red()),
    }
}
