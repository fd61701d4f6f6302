use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use getgo::commands::install::{self, InstallOptions};

const EXAMPLES: &str = "\
Examples:
  getgo                                # Latest version in current directory
  getgo -                              # Latest version in current directory
  getgo latest                         # Latest version in current directory
  getgo 1.23.1                         # Specific version in current directory
  getgo latest ~/.go                   # Latest version in ~/.go
  getgo 1.23.1 /usr/local/go           # Specific version in /usr/local/go
  getgo --path ~/custom/gopath         # Custom GOPATH
  getgo --os windows 1.23.1 ./win      # Windows build from any host";

#[derive(Parser)]
#[clap(name = "getgo")]
#[clap(about = "Download and install a Go toolchain into a versioned directory")]
#[clap(version = env!("CARGO_PKG_VERSION"))]
#[clap(after_help = EXAMPLES)]
pub struct Cli {
    /// Version to install (e.g. 1.23.1), or `latest` / `-`
    #[clap(value_name = "VERSION", default_value = "latest")]
    go_version: String,
    /// Directory that will hold go<version>/ (default: current directory)
    install_path: Option<PathBuf>,
    /// Automatically set up environment variables
    #[clap(short, long)]
    unattended: bool,
    /// Set custom GOPATH (default is $HOME/go)
    #[clap(short = 'p', long = "path", value_name = "PATH")]
    gopath: Option<PathBuf>,
    /// Create a .envrc file with Go environment variables at the specified path
    #[clap(long, value_name = "PATH")]
    envrc: Option<PathBuf>,
    /// Target operating system (default: host)
    #[clap(long)]
    os: Option<String>,
    /// Target architecture (default: host)
    #[clap(long)]
    arch: Option<String>,
    /// Do not draw the download progress bar
    #[clap(short, long)]
    quiet: bool,
}

impl From<Cli> for InstallOptions {
    fn from(cli: Cli) -> Self {
        InstallOptions {
            version: cli.go_version,
            install_path: cli.install_path,
            gopath: cli.gopath,
            unattended: cli.unattended,
            envrc: cli.envrc,
            os: cli.os,
            arch: cli.arch,
            quiet: cli.quiet,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = install::install_version(&cli.into()) {
        eprintln!("{}", format!("Error: {e}").red());
        if let Some(hint) = e.hint() {
            eprintln!("{hint}");
        }
        std::process::exit(1);
    }

    Ok(())
}
