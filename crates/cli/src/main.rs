//! tm155 CLI: command-line configuration tool for the TM155 mouse.

mod session;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use session::{CliHidTransport, InputSource, Session};
use tm155_core::action::ButtonAction;
use tm155_core::bulk::{self, DumpRegion, ThreadPacer};
use tm155_core::buttons::{self, ButtonMap, PhysicalButton, PHYSICAL_BUTTONS};
use tm155_core::config::{self, ConfigBlob, Rgb};
use tm155_core::device::{self, Interface};
use tm155_core::notify::{self, Notification};
use tm155_core::report_rate::ReportRate;
use tm155_core::{dpi, lighting, profile, report_rate, safety, system};

#[derive(Parser)]
#[command(
    name = "tm155",
    version,
    about = "Open-source TM155 mouse configuration"
)]
struct Cli {
    /// Profile to operate on (default: the active profile).
    #[arg(long, global = true)]
    profile: Option<u8>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Give up on bulk reads after this many milliseconds.
    #[arg(long, global = true, default_value_t = 3000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> bool {
        matches!(toggle, Toggle::On)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Region {
    Config,
    Buttons,
    Extra,
}

impl From<Region> for DumpRegion {
    fn from(region: Region) -> Self {
        match region {
            Region::Config => DumpRegion::Config,
            Region::Buttons => DumpRegion::Buttons,
            Region::Extra => DumpRegion::Extra,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the TM155 interfaces that are plugged in.
    ListDevices,
    /// Show firmware version and current settings.
    Info,
    /// Get the active profile.
    GetProfile,
    /// Switch the active profile (0-5).
    SetProfile { id: u8 },
    /// Get the DPI stage of the profile.
    GetDpiStage,
    /// Set the DPI stage of the profile (0-7).
    SetDpiStage { stage: u8 },
    /// Get the report rate code of the profile.
    GetRate,
    /// Set the report rate code of the profile.
    SetRate { code: u8 },
    /// Get the side light state.
    GetSideLight,
    /// Turn the side light on or off.
    SetSideLight {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Blink the lights.
    Blink {
        /// Colour as RRGGBB.
        #[arg(long, default_value = "FFFFFF")]
        color: String,
        /// Delay between blinks, in firmware ticks.
        #[arg(long, default_value_t = 10)]
        delay: u8,
        #[arg(long, default_value_t = 3)]
        count: u8,
    },
    /// Show or edit the profile's config blob.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Show or edit the profile's button mapping.
    #[command(subcommand)]
    Buttons(ButtonsCommand),
    /// Raw blob dumps.
    #[command(subcommand)]
    Dump(DumpCommand),
    /// Print notifications the mouse sends when its own buttons change settings.
    Watch,
    /// Drop any reports the mouse has queued.
    ClearReports,
    /// Reboot the mouse into its firmware bootloader.
    Bootloader {
        /// Confirm that the mouse will stop working until reflashed or replugged.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the understood config fields.
    Show,
    /// Set one of the five colour slots.
    SetColor { slot: usize, color: String },
    /// Set the LED segments lit for a DPI stage (low four bits).
    SetDpiLed { stage: usize, segments: u8 },
    /// Enable or disable a profile.
    SetProfileEnabled {
        id: usize,
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Allow or forbid a report rate (125, 250, 500, 1000).
    SetRateDisabled {
        hz: u16,
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Subcommand)]
enum ButtonsCommand {
    /// Show the mapping of every physical button.
    Show,
    /// Remap a physical button.
    Set {
        /// Button name, e.g. "left", "M1", "wheel-up", "DPI+".
        button: String,
        /// Action name (see `buttons actions`), "key:<name>", "macro:<id>" or "none".
        action: String,
        /// Change the action used while the alternate button group is active.
        #[arg(long)]
        alternate: bool,
    },
    /// List named actions.
    Actions,
}

#[derive(Subcommand)]
enum DumpCommand {
    /// Print a blob as hex.
    Read {
        #[arg(value_enum)]
        region: Region,
        /// Blob index (defaults to the profile).
        #[arg(long)]
        index: Option<u8>,
    },
    /// Write a 128-byte binary file to a blob.
    Write {
        #[arg(value_enum)]
        region: Region,
        file: PathBuf,
        #[arg(long)]
        index: Option<u8>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_millis(cli.timeout_ms);

    match cli.command {
        Commands::ListDevices => {
            let devices = device::discover_devices()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else if devices.is_empty() {
                println!("No TM155 found.");
                println!("Ensure the mouse is connected and you can access its hidraw nodes.");
            } else {
                for dev in &devices {
                    println!("{:?} interface: {}", dev.interface, dev.path);
                }
            }
        }
        Commands::Info => {
            let session = Session::connect(timeout)?;
            let t = &session.transport;
            let version = system::read_firmware_version(t)?;
            let flags = system::read_flags(t)?;
            let in_bootloader = system::read_bootloader_state(t)?;
            let active = profile::read_active_profile(t)?;
            let target = cli.profile.unwrap_or(active);
            let stage = dpi::read_dpi_stage(t, target)?;
            let rate = report_rate::read_report_rate(t, target)?;
            let side_light = lighting::read_side_light(t)?;
            if cli.json {
                let state = json!({
                    "firmware": version,
                    "flags": flags,
                    "bootloader": in_bootloader,
                    "active_profile": active,
                    "profile": target,
                    "dpi_stage": stage,
                    "report_rate": rate,
                    "side_light": side_light,
                });
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("Firmware:        {version}");
                println!("Flags:           0x{flags:02X}");
                println!("Bootloader:      {}", if in_bootloader { "yes" } else { "no" });
                println!("Active profile:  {active}");
                println!("Profile {target}:");
                println!("  DPI stage:     {stage}");
                println!("  Report rate:   {rate}");
                println!("Side light:      {}", if side_light { "on" } else { "off" });
            }
        }
        Commands::GetProfile => {
            let session = Session::connect(timeout)?;
            let active = profile::read_active_profile(&session.transport)?;
            println!("Active profile: {active}");
        }
        Commands::SetProfile { id } => {
            safety::validate_profile_id(id)?;
            let session = Session::connect(timeout)?;
            profile::write_active_profile(&session.transport, id)?;
            println!("Active profile set to {id}");
        }
        Commands::GetDpiStage => {
            let session = Session::connect(timeout)?;
            let target = session.resolve_profile(cli.profile)?;
            let stage = dpi::read_dpi_stage(&session.transport, target)?;
            println!("Profile {target} DPI stage: {stage}");
        }
        Commands::SetDpiStage { stage } => {
            safety::validate_dpi_stage(stage)?;
            let session = Session::connect(timeout)?;
            let target = session.resolve_profile(cli.profile)?;
            dpi::write_dpi_stage(&session.transport, target, stage)?;
            println!("Profile {target} DPI stage set to {stage}");
        }
        Commands::GetRate => {
            let session = Session::connect(timeout)?;
            let target = session.resolve_profile(cli.profile)?;
            let code = report_rate::read_report_rate(&session.transport, target)?;
            println!("Profile {target} report rate code: {code}");
        }
        Commands::SetRate { code } => {
            let session = Session::connect(timeout)?;
            let target = session.resolve_profile(cli.profile)?;
            report_rate::write_report_rate(&session.transport, target, code)?;
            println!("Profile {target} report rate code set to {code}");
        }
        Commands::GetSideLight => {
            let session = Session::connect(timeout)?;
            let on = lighting::read_side_light(&session.transport)?;
            println!("Side light: {}", if on { "on" } else { "off" });
        }
        Commands::SetSideLight { state } => {
            let session = Session::connect(timeout)?;
            lighting::write_side_light(&session.transport, state.into())?;
            println!("Side light {}", if state.into() { "on" } else { "off" });
        }
        Commands::Blink {
            color,
            delay,
            count,
        } => {
            let color = parse_color(&color)?;
            let session = Session::connect(timeout)?;
            lighting::blink_lights(&session.transport, color, delay, count)?;
        }
        Commands::Config(command) => {
            let mut session = Session::connect(timeout)?;
            run_config(&mut session, cli.profile, cli.json, command)?;
        }
        Commands::Buttons(ButtonsCommand::Actions) => {
            for (name, action) in ButtonAction::PRESETS {
                println!("{name:<14} {action}");
            }
            println!("{:<14} single key, e.g. key:f5 or \"key:page up\"", "key:<name>");
            println!("{:<14} macro played once", "macro:<id>");
            println!("{:<14} clear the button", "none");
        }
        Commands::Buttons(command) => {
            let mut session = Session::connect(timeout)?;
            run_buttons(&mut session, cli.profile, cli.json, command)?;
        }
        Commands::Dump(command) => {
            let mut session = Session::connect(timeout)?;
            run_dump(&mut session, cli.profile, cli.json, command)?;
        }
        Commands::Watch => watch()?,
        Commands::ClearReports => {
            let session = Session::connect(timeout)?;
            system::clear_reports(&session.transport)?;
            println!("Cleared queued reports");
        }
        Commands::Bootloader { yes } => {
            if !yes {
                eprintln!("{}", safety::BOOTLOADER_WARNING);
                bail!("refusing to enter the bootloader without --yes");
            }
            let session = Session::connect(timeout)?;
            system::activate_bootloader(&session.transport)?;
            println!("Bootloader activated");
        }
    }

    Ok(())
}

fn parse_color(hex: &str) -> Result<Rgb> {
    Rgb::from_hex(hex).ok_or_else(|| anyhow!("invalid colour '{hex}', expected RRGGBB"))
}

fn read_config(session: &mut Session<CliHidTransport>, target: u8) -> Result<ConfigBlob> {
    let pending = config::request_config(&mut session.reader, &session.transport, target)?;
    let reply = session.wait(pending)?;
    Ok(ConfigBlob::from_slice(&reply.data)?)
}

fn read_button_map(session: &mut Session<CliHidTransport>, target: u8) -> Result<ButtonMap> {
    let pending = buttons::request_button_map(&mut session.reader, &session.transport, target)?;
    let reply = session.wait(pending)?;
    Ok(ButtonMap::from_blob(&reply.data)?)
}

fn run_config(
    session: &mut Session<CliHidTransport>,
    profile_id: Option<u8>,
    json: bool,
    command: ConfigCommand,
) -> Result<()> {
    let target = session.resolve_profile(profile_id)?;
    let mut blob = read_config(session, target)?;

    match command {
        ConfigCommand::Show => {
            let summary = blob.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Profile {target} config:");
                println!("  Enabled profiles: {:?}", summary.profiles_enabled);
                for (stage, leds) in summary.dpi_leds.iter().enumerate() {
                    println!("  DPI stage {stage} LEDs: {leds:04b}");
                }
                for (slot, color) in summary.colors.iter().enumerate() {
                    println!("  Colour {slot}: {color}");
                }
                let disabled: Vec<String> = summary
                    .report_rates_disabled
                    .iter()
                    .map(ReportRate::to_string)
                    .collect();
                println!("  Disabled rates: {}", disabled.join(", "));
            }
            return Ok(());
        }
        ConfigCommand::SetColor { slot, color } => {
            blob.set_rgb(slot, parse_color(&color)?)?;
        }
        ConfigCommand::SetDpiLed { stage, segments } => {
            blob.set_dpi_led(stage, segments)?;
        }
        ConfigCommand::SetProfileEnabled { id, state } => {
            blob.set_profile_enabled(id, state.into())?;
        }
        ConfigCommand::SetRateDisabled { hz, state } => {
            let rate = ReportRate::from_hz(hz)
                .ok_or_else(|| anyhow!("unsupported report rate {hz} Hz"))?;
            blob.set_report_rate_disabled(rate, state.into());
        }
    }

    config::write_config(&session.transport, target, &blob, &ThreadPacer)?;
    println!("Profile {target} config written");
    Ok(())
}

fn run_buttons(
    session: &mut Session<CliHidTransport>,
    profile_id: Option<u8>,
    json: bool,
    command: ButtonsCommand,
) -> Result<()> {
    let target = session.resolve_profile(profile_id)?;
    let mut map = read_button_map(session, target)?;

    match command {
        ButtonsCommand::Show => {
            if json {
                let rows: Vec<_> = PHYSICAL_BUTTONS
                    .iter()
                    .map(|b| {
                        json!({
                            "button": b.name,
                            "slot": b.slot,
                            "primary": map.slots()[b.slot],
                            "alternate": map.slots()[b.alternate_slot()],
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("Profile {target} buttons:");
                for b in PHYSICAL_BUTTONS {
                    println!(
                        "  {:<12} {}  [alt: {}]",
                        b.name,
                        map.slots()[b.slot],
                        map.slots()[b.alternate_slot()]
                    );
                }
            }
        }
        ButtonsCommand::Set {
            button,
            action,
            alternate,
        } => {
            let physical = PhysicalButton::from_name(&button)
                .ok_or_else(|| anyhow!("unknown button '{button}'"))?;
            let parsed = if action.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(ButtonAction::from_name(&action).ok_or_else(|| {
                    anyhow!("unknown action '{action}'; run `tm155 buttons actions` for the list")
                })?)
            };
            let slot = if alternate {
                physical.alternate_slot()
            } else {
                physical.slot
            };
            map.set_action(slot, parsed)?;
            buttons::write_button_map(&session.transport, target, &map, &ThreadPacer)?;
            println!("Set {} to '{}'", physical.name, map.slots()[slot]);
        }
        ButtonsCommand::Actions => {}
    }
    Ok(())
}

fn run_dump(
    session: &mut Session<CliHidTransport>,
    profile_id: Option<u8>,
    json: bool,
    command: DumpCommand,
) -> Result<()> {
    match command {
        DumpCommand::Read { region, index } => {
            let index = index.map_or_else(|| session.resolve_profile(profile_id), Ok)?;
            let pending =
                bulk::request_blob(&mut session.reader, &session.transport, region.into(), index);
            let reply = session.wait(pending)?;
            if json {
                println!("{}", serde_json::to_string(&reply.data)?);
            } else {
                for (row, chunk) in reply.data.chunks(16).enumerate() {
                    let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02X}")).collect();
                    println!("{:04X}: {}", row * 16, hex.join(" "));
                }
            }
        }
        DumpCommand::Write {
            region,
            file,
            index,
        } => {
            let index = index.map_or_else(|| session.resolve_profile(profile_id), Ok)?;
            let data =
                std::fs::read(&file).with_context(|| format!("read {}", file.display()))?;
            bulk::write_blob(&session.transport, region.into(), index, &data, &ThreadPacer)?;
            println!("Wrote {} bytes", data.len());
        }
    }
    Ok(())
}

fn watch() -> Result<()> {
    let devices = device::discover_devices()?;
    let info = device::find_notify_interface(&devices)?;
    let api = hidapi::HidApi::new().map_err(|e| anyhow!("hidapi init: {e}"))?;
    let notify_device = CliHidTransport::open(&api, info)?;
    println!("Watching {:?} interface {} (Ctrl-C to stop)", Interface::Notify, info.path);

    loop {
        let Some(report) = notify_device.read_input(Duration::from_secs(1))? else {
            continue;
        };
        match notify::parse_notification(&report) {
            Some(Notification::DpiStage(stage)) => println!("DPI stage changed to {stage}"),
            Some(Notification::Other { kind, data }) => {
                println!("Notification kind {kind}: {data:02X?}")
            }
            None => {}
        }
    }
}
