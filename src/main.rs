use anyhow::{anyhow, Context, Result};
use cc_insights_launcher::command_validation::validate_command_name;
use cc_insights_launcher::config::LauncherConfig;
use cc_insights_launcher::env_util::LOG_ENV;
use cc_insights_launcher::shell::dir_on_path;
use cc_insights_launcher::{
    add_to_path, check_app_location, generate_script, install_launcher, remove_from_path,
    remove_launcher, PathUpdate,
};
use std::env;
use std::future::Future;
use std::path::{Path, PathBuf};

const USAGE: &str = "\
Usage:
  cc-insights-launcher check [<executable>] [--json]
  cc-insights-launcher script [<executable>]
  cc-insights-launcher install [--exe <path>] [--name <command>] [--force] [--skip-path]
  cc-insights-launcher uninstall [--name <command>] [--remove-path]
  cc-insights-launcher add-to-path [<rc-file>]
  cc-insights-launcher --help | --version

<executable> defaults to the path of the running binary.

Environment:
  CC_INSIGHTS_BIN_DIR     directory the launcher is written to (default ~/.local/bin)
  CC_INSIGHTS_RC_FILE     shell startup file to edit (default from $SHELL)
  CC_INSIGHTS_CONFIG_DIR  directory holding launcher.toml
  CC_INSIGHTS_FORCE       install even from a disk image or temporary directory
  CC_INSIGHTS_LOG         log filter (default warn)
";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, "warn"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    std::process::exit(run(&args));
}

fn run(args: &[String]) -> i32 {
    match run_inner(args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    }
}

fn run_inner(args: &[String]) -> Result<()> {
    let Some(command) = args.first() else {
        eprint!("{USAGE}");
        return Err(anyhow!("missing command"));
    };
    let rest = &args[1..];
    match command.as_str() {
        "--help" | "-h" if rest.is_empty() => {
            print!("{USAGE}");
            Ok(())
        }
        "--version" | "-V" if rest.is_empty() => {
            println!("cc-insights-launcher {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "check" => run_check(rest),
        "script" => run_script(rest),
        "install" => run_install(rest),
        "uninstall" => run_uninstall(rest),
        "add-to-path" => run_add_to_path(rest),
        other => Err(anyhow!(
            "unknown command `{other}`; expected check|script|install|uninstall|add-to-path"
        )),
    }
}

fn run_check(raw_args: &[String]) -> Result<()> {
    let mut json = false;
    let mut executable = None;
    for arg in raw_args {
        match arg.as_str() {
            "--json" => json = true,
            other if other.starts_with('-') => {
                return Err(anyhow!("unknown check option `{other}`"))
            }
            other => set_positional(&mut executable, other, "check")?,
        }
    }

    let executable = executable_or_current(executable)?;
    let check = check_app_location(&executable);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&check).context("failed to serialize location check")?
        );
        return Ok(());
    }

    match (&check.app_path, check.is_sane) {
        (None, _) => println!("no application bundle found for {executable}"),
        (Some(app_path), true) => println!("{app_path}: location ok"),
        (Some(app_path), false) => println!(
            "{app_path}: unsuitable location ({})",
            check.reason.as_deref().unwrap_or("unknown reason")
        ),
    }
    Ok(())
}

fn run_script(raw_args: &[String]) -> Result<()> {
    let mut executable = None;
    for arg in raw_args {
        if arg.starts_with('-') {
            return Err(anyhow!("unknown script option `{arg}`"));
        }
        set_positional(&mut executable, arg, "script")?;
    }
    print!("{}", generate_script(&executable_or_current(executable)?));
    Ok(())
}

fn run_install(raw_args: &[String]) -> Result<()> {
    let mut executable = None;
    let mut name = None;
    let mut force = false;
    let mut skip_path = false;
    let mut idx = 0;
    while idx < raw_args.len() {
        match raw_args[idx].as_str() {
            "--exe" => {
                executable = Some(option_value(raw_args, idx, "--exe")?);
                idx += 2;
            }
            "--name" => {
                name = Some(option_value(raw_args, idx, "--name")?);
                idx += 2;
            }
            "--force" => {
                force = true;
                idx += 1;
            }
            "--skip-path" => {
                skip_path = true;
                idx += 1;
            }
            other => return Err(anyhow!("unknown install option `{other}`")),
        }
    }

    let config = resolve_config(name)?;
    let force = force || config.allow_unsafe_location;
    let executable = executable_or_current(executable)?;
    let check = check_app_location(&executable);
    if !check.is_sane {
        let reason = check
            .reason
            .unwrap_or_else(|| format!("{executable} is not inside an application bundle"));
        if !force {
            return Err(anyhow!(
                "refusing to install launcher: {reason}; pass --force to install anyway"
            ));
        }
        log::warn!("installing despite unsuitable location: {reason}");
    }

    let target = install_launcher(&config.bin_dir, &config.command_name, &executable)?;
    println!("installed `{}` at {}", config.command_name, target.display());
    warn_if_shadowed(&config.command_name, &target);

    if skip_path {
        return Ok(());
    }
    if dir_on_path(&config.bin_dir, env::var_os("PATH").as_deref()) {
        println!("{} is already on PATH", config.bin_dir.display());
        return Ok(());
    }
    if !config.uses_default_bin_dir() {
        println!(
            "add {} to PATH to run `{}` from a terminal",
            config.bin_dir.display(),
            config.command_name
        );
        return Ok(());
    }
    report_path_update(&config.rc_file)
}

fn run_uninstall(raw_args: &[String]) -> Result<()> {
    let mut name = None;
    let mut remove_path = false;
    let mut idx = 0;
    while idx < raw_args.len() {
        match raw_args[idx].as_str() {
            "--name" => {
                name = Some(option_value(raw_args, idx, "--name")?);
                idx += 2;
            }
            "--remove-path" => {
                remove_path = true;
                idx += 1;
            }
            other => return Err(anyhow!("unknown uninstall option `{other}`")),
        }
    }

    let config = resolve_config(name)?;
    if remove_launcher(&config.bin_dir, &config.command_name)? {
        println!("removed {}", config.launcher_path().display());
    } else {
        println!("no launcher installed at {}", config.launcher_path().display());
    }

    if remove_path
        && remove_from_path(&config.rc_file)
            .with_context(|| format!("failed to update {}", config.rc_file.display()))?
    {
        println!("removed PATH entry from {}", config.rc_file.display());
    }
    Ok(())
}

fn run_add_to_path(raw_args: &[String]) -> Result<()> {
    let mut rc_file = None;
    for arg in raw_args {
        if arg.starts_with('-') {
            return Err(anyhow!("unknown add-to-path option `{arg}`"));
        }
        set_positional(&mut rc_file, arg, "add-to-path")?;
    }
    let rc_file = match rc_file {
        Some(path) => PathBuf::from(path),
        None => LauncherConfig::resolve()?.rc_file,
    };
    report_path_update(&rc_file)
}

fn report_path_update(rc_file: &Path) -> Result<()> {
    let outcome = block_on(add_to_path(rc_file))?
        .with_context(|| format!("failed to update {}", rc_file.display()))?;
    match outcome {
        PathUpdate::Appended => println!(
            "added ~/.local/bin to PATH in {}; open a new terminal to pick it up",
            rc_file.display()
        ),
        PathUpdate::AlreadyPresent => {
            println!("{} already puts ~/.local/bin on PATH", rc_file.display())
        }
    }
    Ok(())
}

fn resolve_config(name: Option<String>) -> Result<LauncherConfig> {
    let mut config = LauncherConfig::resolve()?;
    if let Some(name) = name {
        validate_command_name(&name).with_context(|| format!("invalid --name `{name}`"))?;
        config.command_name = name;
    }
    log::debug!("resolved launcher config: {config:?}");
    Ok(config)
}

fn warn_if_shadowed(command_name: &str, installed: &Path) {
    let Ok(found) = which::which(command_name) else {
        return;
    };
    let same = match (fs_err::canonicalize(&found), fs_err::canonicalize(installed)) {
        (Ok(a), Ok(b)) => a == b,
        _ => found == installed,
    };
    if !same {
        log::warn!(
            "`{command_name}` currently resolves to {}, which shadows {}",
            found.display(),
            installed.display()
        );
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

fn executable_or_current(executable: Option<String>) -> Result<String> {
    if let Some(executable) = executable {
        return Ok(executable);
    }
    let current = env::current_exe().context("failed to locate the running executable")?;
    current
        .into_os_string()
        .into_string()
        .map_err(|raw| anyhow!("executable path is not valid UTF-8: {}", PathBuf::from(raw).display()))
}

fn set_positional(slot: &mut Option<String>, value: &str, command: &str) -> Result<()> {
    if slot.is_some() {
        return Err(anyhow!("unexpected extra argument `{value}` for {command}"));
    }
    *slot = Some(value.to_string());
    Ok(())
}

fn option_value(raw_args: &[String], idx: usize, flag: &str) -> Result<String> {
    raw_args
        .get(idx + 1)
        .cloned()
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}
