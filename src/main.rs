use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use npb_charger::logging::{log_error, log_warn};
use npb_charger::{
    connect, disconnect, init_logger_with_level, log_info, ChargerConfig, GuardedWrite,
    RegisterCode,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "npb-charger")]
#[command(about = "CLI tool for Mean Well NPB chargers on CAN")]
struct Cli {
    /// SocketCAN interface (overrides the config file)
    #[arg(short, long, global = true)]
    interface: Option<String>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the charger answers
    Probe,
    /// Print charge-curve settings and live readings
    Settings {
        #[arg(long)]
        json: bool,
    },
    /// Print the charge status flags
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Read one register by name, e.g. CURVE_CV
    Read { name: String },
    /// Switch the output on or off
    Output {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Set the absorption voltage (V)
    SetVoltage { volts: f64 },
    /// Set the float voltage (V)
    SetFloatVoltage { volts: f64 },
    /// Enable restart and set the restart voltage (V)
    SetRestartVoltage { volts: f64 },
    /// Set the taper current (A)
    SetTaperCurrent { amps: f64 },
}

fn report_write(write: &GuardedWrite) {
    if write.was_clamped() {
        log_warn(&format!("Requested value was clamped to {:.2}", write.value()));
    }
    println!("{} set to {:.2}, output {}", write.register, write.value(), write.output);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger_with_level("info");

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ChargerConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ChargerConfig::default(),
    };
    if let Some(interface) = cli.interface {
        config.interface = interface;
    }

    let charger = connect(&config).with_context(|| format!("opening {}", config.interface))?;

    let result = async {
        match cli.command {
            Commands::Probe => {
                if charger.probe().await {
                    log_info("Charger responded");
                } else {
                    bail!("no response from charger on {}", config.interface);
                }
            }
            Commands::Settings { json } => {
                let settings = charger.read_known_settings().await;
                if json {
                    println!("{}", serde_json::to_string_pretty(&settings)?);
                } else {
                    for reading in settings.iter() {
                        println!("{:<18}{}", format!("{}:", reading.name), reading.value);
                    }
                }
            }
            Commands::Status { json } => {
                let status = charger
                    .read_status()
                    .await
                    .context("charge status unavailable")?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&status)?);
                } else {
                    println!("Charge status");
                    println!("  Temp comp status: {}", status.temp_comp_status);
                    println!("  Bat detect: {}", status.bat_detect);
                    println!("  Timeout const current: {}", status.timeout_constant_current);
                    println!("  Timeout const voltage: {}", status.timeout_constant_voltage);
                    println!("  Timeout float: {}", status.timeout_float);
                    println!("  Fully charged: {}", status.fully_charged);
                    println!("  Constant current: {}", status.constant_current);
                    println!("  Constant voltage: {}", status.constant_voltage);
                    println!("  Float mode: {}", status.float_mode);
                    println!("  Wakeup finished: {}", status.wakeup_finished);
                }
            }
            Commands::Read { name } => {
                let register = RegisterCode::from_name(&name)?;
                match register.info().scale() {
                    Some(_) => {
                        let value = charger
                            .read_scaled(register)
                            .await
                            .with_context(|| format!("{register} unavailable"))?;
                        println!("{}: {}", register, value);
                    }
                    None => {
                        let raw = charger
                            .read_register(register.code())
                            .await
                            .with_context(|| format!("{register} unavailable"))?;
                        println!("{}: 0x{:04X}", register, raw);
                    }
                }
            }
            Commands::Output { state } => {
                let state = charger.set_output(matches!(state, Switch::On)).await?;
                log_info(&format!("Output {state}"));
            }
            Commands::SetVoltage { volts } => report_write(&charger.set_absorption_voltage(volts).await?),
            Commands::SetFloatVoltage { volts } => report_write(&charger.set_float_voltage(volts).await?),
            Commands::SetRestartVoltage { volts } => {
                report_write(&charger.set_restart_voltage(volts).await?)
            }
            Commands::SetTaperCurrent { amps } => report_write(&charger.set_taper_current(amps).await?),
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Err(e) = &result {
        log_error(&format!("{e:#}"));
    }
    disconnect(charger).await?;
    result
}
