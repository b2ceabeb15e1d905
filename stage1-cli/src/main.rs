// SPDX-License-Identifier: GPL-3.0-only

//! `stage1` - decide where the stage1 bootloader goes and install it there

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use stage1_contracts::DeviceNames;
use stage1_core::{InstallPlan, Stage1Model, Stage1Policy};
use stage1_sys::{
    GrubInstall, InstallDeviceFile, SnapshotInventory, UdevMapping, UdevNamespace,
    detect_architecture,
};
use stage1_types::{Architecture, Proposal};
use tracing::{debug, info};

mod config;
mod logging;

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "stage1", version)]
#[command(about = "Propose, inspect and install the stage1 bootloader location")]
struct Cli {
    /// Configuration file (default: /etc/stage1/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Topology snapshot describing the system storage
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Target architecture, e.g. x86-bios, x86-efi, ppc, s390
    #[arg(long, global = true)]
    arch: Option<Architecture>,

    /// Put stage1 into the MBR of this disk instead of the boot disk
    #[arg(long, global = true)]
    mbr_disk: Option<String>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Propose a stage1 location for this system
    Propose {
        /// Write the proposal to the install-device file
        #[arg(long)]
        save: bool,
    },
    /// Print the physical devices a device rests on
    Resolve { device: String },
    /// Show the saved stage1 configuration
    Show,
    /// List the symbolic locations stage1 can go to
    Locations {
        /// List every device stage1 could be written to instead
        #[arg(long)]
        devices: bool,
    },
    /// Run the bootloader installer for the saved stage1 devices
    Install {
        #[arg(long)]
        secure_boot: bool,
        #[arg(long)]
        trusted_boot: bool,
        /// Print installer commands without running them
        #[arg(long)]
        dry_run: bool,
    },
}

/// Collaborators wired from configuration.
struct Session {
    arch: Architecture,
    policy: Stage1Policy,
    names: Arc<dyn DeviceNames>,
    store: InstallDeviceFile,
}

impl Session {
    fn open(cli: &Cli, config: &Config) -> Result<Self> {
        let snapshot = cli
            .snapshot
            .as_ref()
            .or(config.snapshot.as_ref())
            .context("no topology snapshot given (use --snapshot or set `snapshot` in the config)")?;
        let inventory = SnapshotInventory::load(snapshot)
            .with_context(|| format!("loading snapshot {}", snapshot.display()))?;

        let names: Arc<dyn DeviceNames> = if inventory.snapshot().aliases.is_empty() {
            let mapping = UdevMapping::scan(&config.udev_root, &UdevNamespace::DEFAULT_PRIORITY)
                .with_context(|| format!("scanning {}", config.udev_root.display()))?;
            debug!(aliases = mapping.alias_count(), "using udev name mapping");
            Arc::new(mapping)
        } else {
            Arc::new(inventory.names())
        };

        let arch = cli
            .arch
            .or(config.arch)
            .unwrap_or_else(detect_architecture);
        info!(arch = %arch, snapshot = %snapshot.display(), "starting session");

        let mut policy = Stage1Policy::new(arch, Arc::new(inventory), names.clone())
            .context("detecting boot layout")?;
        if let Some(disk) = &cli.mbr_disk {
            policy.set_mbr_disk(disk);
        }

        Ok(Self {
            arch,
            policy,
            names,
            store: InstallDeviceFile::new(&config.install_device_file),
        })
    }

    fn saved_model(&self) -> Result<Stage1Model> {
        let mut model = Stage1Model::new(self.names.clone());
        model
            .load(&self.store)
            .with_context(|| format!("reading {}", self.store.path().display()))?;
        Ok(model)
    }
}

fn print_proposal(proposal: &Proposal, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(proposal)?);
        return Ok(());
    }
    println!("location: {}", proposal.location);
    for device in &proposal.devices {
        println!("device: {device}");
    }
    println!("activate: {}", proposal.activate);
    println!("generic_boot_code: {}", proposal.generic_boot_code);
    Ok(())
}

fn print_model(model: &Stage1Model, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(model.config())?);
        return Ok(());
    }
    for device in model.devices() {
        println!("device: {device}");
    }
    println!("activate: {}", model.activate());
    println!("generic_boot_code: {}", model.generic_boot_code());
    Ok(())
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Command::Propose { save } => {
            let mut session = Session::open(cli, config)?;
            let mut model = Stage1Model::new(session.names.clone());
            let proposal = session.policy.propose(&mut model)?;
            print_proposal(&proposal, cli.json)?;

            if *save {
                model
                    .save(&session.store)
                    .with_context(|| format!("writing {}", session.store.path().display()))?;
                info!(path = %session.store.path().display(), "saved stage1 configuration");
            }
        }
        Command::Resolve { device } => {
            let mut session = Session::open(cli, config)?;
            let devices = session.policy.resolver().resolve(device)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else {
                for dev in devices {
                    println!("{dev}");
                }
            }
        }
        Command::Show => {
            let mut session = Session::open(cli, config)?;
            let model = session.saved_model()?;
            print_model(&model, cli.json)?;
            if !cli.json {
                println!("mbr: {}", session.policy.is_mbr(&model)?);
                println!("boot_partition: {}", session.policy.is_boot_partition(&model)?);
                println!("root_partition: {}", session.policy.is_root_partition(&model)?);
                println!("extended_partition: {}", session.policy.is_extended_partition(&model)?);
                for device in session.policy.custom_devices(&model) {
                    println!("custom: {device}");
                }
                println!("installable: {}", session.policy.bootloader_installable()?);
                if session.policy.gpt_boot_disk(&model)? {
                    println!("gpt: protective MBR boot flag must be cleared");
                }
            }
        }
        Command::Locations { devices: true } => {
            let session = Session::open(cli, config)?;
            let devices = session.policy.possible_locations()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else {
                for device in devices {
                    println!("{}", session.names.to_stable_name(&device));
                }
            }
        }
        Command::Locations { devices: false } => {
            let mut session = Session::open(cli, config)?;
            let locations = session.policy.available_locations()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&locations)?);
            } else {
                for (location, device) in locations {
                    println!("{location}\t{device}");
                }
            }
        }
        Command::Install {
            secure_boot,
            trusted_boot,
            dry_run,
        } => {
            if !dry_run && unsafe { libc::geteuid() } != 0 {
                bail!("installing stage1 requires root privileges (try --dry-run)");
            }

            let mut session = Session::open(cli, config)?;
            if !session.policy.bootloader_installable()? {
                bail!(
                    "/boot on {} is a RAID without mirroring, stage1 cannot be installed",
                    session.policy.layout().boot
                );
            }
            let plan = InstallPlan::new(session.arch, *secure_boot, *trusted_boot)?;

            let mut model = session.saved_model()?;
            if model.is_empty() && session.arch != Architecture::S390 {
                info!("no saved stage1 devices, proposing");
                session.policy.propose(&mut model)?;
            }

            let installer = if *dry_run {
                GrubInstall::dry_run()
            } else {
                GrubInstall::new()
            };
            let runs = plan.run(&installer, model.devices())?;
            for outcome in installer.outcomes() {
                println!("{}", outcome.command);
            }
            info!(runs, dry_run = *dry_run, "stage1 installed");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    logging::init(
        config.log_level.raised(cli.verbose),
        config.log_file.as_deref(),
    )?;

    run(&cli, &config)
}
