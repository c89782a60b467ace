use std::path::Path;

use anyhow::{bail, Result};
use guest_builder::config::ProvisionConfig;
use guest_builder::locate::{self, guest};
use guest_builder::preflight;
use guest_builder::report::Reporter;
use guest_builder::stages::Pipeline;

fn usage() -> &'static str {
    "Usage:\n  guest-builder run [config.toml]\n  guest-builder resolve <erlang|elixir|qemu|freebsd-image> <version> [arch]\n  guest-builder preflight"
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [cmd] if cmd == "run" => run(None),
        [cmd, config] if cmd == "run" => run(Some(Path::new(config))),
        [cmd, component, version] if cmd == "resolve" => resolve(component, version, None),
        [cmd, component, version, arch] if cmd == "resolve" => {
            resolve(component, version, Some(arch))
        }
        [cmd] if cmd == "preflight" => {
            preflight::check_host_tools()?;
            println!("all required host tools present");
            Ok(())
        }
        _ => bail!(usage()),
    }
}

fn run(config_path: Option<&Path>) -> Result<()> {
    let mut config = match config_path {
        Some(path) => ProvisionConfig::load(path)?,
        None => ProvisionConfig::default(),
    };
    config.apply_env_inputs();

    preflight::check_host_tools()?;

    let rep = Reporter::from_env();
    Pipeline::new(config, &rep).run()?;

    if rep.failed() {
        bail!("provisioning completed with recorded failures");
    }
    Ok(())
}

fn resolve(component: &str, version: &str, arch: Option<&str>) -> Result<()> {
    let resolved = match component {
        "erlang" => locate::runtime(version, "linux", "x86_64")?,
        "elixir" => locate::compiler(version),
        "qemu" => locate::hypervisor(version),
        "freebsd-image" => guest::image(version, arch.unwrap_or("amd64"))?,
        other => bail!(
            "unknown component '{}'; expected erlang, elixir, qemu, or freebsd-image",
            other
        ),
    };
    println!("url:      {}", resolved.url);
    println!("filename: {}", resolved.filename);
    Ok(())
}
