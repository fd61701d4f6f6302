use crate::error::{GetgoError, Result};
use crate::utils::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const MARKER: &str = "GOROOT=";
const HEADER: &str = "\n# Go environment variables added by getgo\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFileUpdate {
    Created,
    Appended,
    AlreadyConfigured,
}

/// The three assignments, in POSIX shell syntax.
pub fn unix_exports(goroot: &Path, gopath: &Path, quoted: bool) -> Vec<String> {
    if quoted {
        vec![
            format!("export GOROOT=\"{}\"", goroot.display()),
            format!("export GOPATH=\"{}\"", gopath.display()),
            "export PATH=\"$PATH:$GOPATH/bin:$GOROOT/bin\"".to_string(),
        ]
    } else {
        vec![
            format!("export GOROOT={}", goroot.display()),
            format!("export GOPATH={}", gopath.display()),
            "export PATH=$PATH:$GOPATH/bin:$GOROOT/bin".to_string(),
        ]
    }
}

pub fn windows_assignments(goroot: &Path, gopath: &Path) -> Vec<String> {
    vec![
        format!("GOROOT={}", goroot.display()),
        format!("GOPATH={}", gopath.display()),
        "PATH=%PATH%;%GOPATH%\\bin;%GOROOT%\\bin".to_string(),
    ]
}

/// Lines to show the user for the host they are running on.
pub fn display_lines(goroot: &Path, gopath: &Path) -> Vec<String> {
    if cfg!(windows) {
        windows_assignments(goroot, gopath)
    } else {
        unix_exports(goroot, gopath, false)
    }
}

pub fn detect_shell() -> String {
    std::env::var("SHELL").unwrap_or_default()
}

pub fn get_shell_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(GetgoError::HomeDirectoryNotFound)?;
    Ok(shell_config_for(
        &home,
        &detect_shell(),
        cfg!(target_os = "macos"),
    ))
}

/// Pick the startup file a login shell of kind `shell` reads.
pub fn shell_config_for(home: &Path, shell: &str, macos: bool) -> PathBuf {
    if shell.contains("zsh") {
        return home.join(".zshrc");
    }
    if shell.contains("bash") {
        let bash_profile = home.join(".bash_profile");
        if macos && bash_profile.exists() {
            return bash_profile;
        }
        return home.join(".bashrc");
    }
    if shell.contains("fish") {
        return home.join(".config").join("fish").join("config.fish");
    }

    [".profile", ".bashrc", ".bash_profile", ".zshrc"]
        .iter()
        .map(|name| home.join(name))
        .find(|path| path.exists())
        .unwrap_or_else(|| home.join(".profile"))
}

/// Append the Go exports to a shell startup file, creating it when missing.
/// Files that already assign GOROOT are left untouched.
pub fn append_to_shell_config(config: &Path, goroot: &Path, gopath: &Path) -> Result<EnvFileUpdate> {
    let existed = config.exists();
    if existed {
        let content = std::fs::read_to_string(config)?;
        if content.contains(MARKER) {
            return Ok(EnvFileUpdate::AlreadyConfigured);
        }
    } else if let Some(parent) = config.parent() {
        fs::ensure_dir_exists(parent)?;
    }

    let mut block = HEADER.to_string();
    for line in unix_exports(goroot, gopath, false) {
        block.push_str(&line);
        block.push('\n');
    }
    append(config, &block)?;

    Ok(if existed {
        EnvFileUpdate::Appended
    } else {
        EnvFileUpdate::Created
    })
}

/// Write the exports into a direnv `.envrc`. `target` may name the file or
/// the directory that should hold it.
pub fn write_envrc(
    target: &Path,
    goroot: &Path,
    gopath: &Path,
    quoted: bool,
) -> Result<(PathBuf, EnvFileUpdate)> {
    let mut path = fs::expand_path(target)?;
    if path.is_dir() {
        path = path.join(".envrc");
    }
    if let Some(parent) = path.parent() {
        fs::ensure_dir_exists(parent)?;
    }

    let mut block = String::new();
    let update = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        if content.contains(MARKER) {
            return Ok((path, EnvFileUpdate::AlreadyConfigured));
        }
        if !content.is_empty() && !content.ends_with('\n') {
            block.push('\n');
        }
        EnvFileUpdate::Appended
    } else {
        EnvFileUpdate::Created
    };

    block.push_str(HEADER);
    for line in unix_exports(goroot, gopath, quoted) {
        block.push_str(&line);
        block.push('\n');
    }
    append(&path, &block)?;

    Ok((path, update))
}

fn append(path: &Path, text: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Persist GOROOT, GOPATH and PATH as Windows user variables via PowerShell.
pub fn set_windows_user_environment(goroot: &Path, gopath: &Path) -> Result<()> {
    let set_var = |name: &str, value: &Path| -> Result<()> {
        run_powershell(&format!(
            "[Environment]::SetEnvironmentVariable('{name}', '{}', 'User')",
            value.display()
        ))
    };

    set_var("GOROOT", goroot)?;
    set_var("GOPATH", gopath)?;
    run_powershell(
        r#"
        $currentPath = [Environment]::GetEnvironmentVariable('PATH', 'User')
        $goPathBin = Join-Path -Path $env:GOPATH -ChildPath 'bin'
        $goRootBin = Join-Path -Path $env:GOROOT -ChildPath 'bin'
        if (-not $currentPath.Contains($goPathBin) -and -not $currentPath.Contains($goRootBin)) {
            $newPath = $currentPath + ';' + $goPathBin + ';' + $goRootBin
            [Environment]::SetEnvironmentVariable('PATH', $newPath, 'User')
        }
        "#,
    )
}

fn run_powershell(script: &str) -> Result<()> {
    let status = Command::new("powershell")
        .arg("-Command")
        .arg(script)
        .status()?;
    if !status.success() {
        return Err(GetgoError::shell_error(format!(
            "powershell exited with status {:?}",
            status.code()
        )));
    }
    Ok(())
}
