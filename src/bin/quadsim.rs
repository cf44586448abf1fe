use clap::{Parser, ValueEnum};
use quadcopter_sim::config::{Builder, PolicyKind};
use quadcopter_sim::control::HeightMode;
use quadcopter_sim::scheduler::Interval;
use quadcopter_sim::telemetry::TelemetryLink;
use quadcopter_sim::{ControlInput, Result, VehicleState};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    Pid,
    Direct,
}

/// Real-time quadcopter simulator with UDP telemetry
#[derive(Debug, Parser)]
#[command(version)]
struct Opt {
    /// Local address for telemetry and inbound commands
    #[arg(long, default_value = "0.0.0.0:9001")]
    bind: SocketAddr,

    /// Ground station receiving telemetry
    #[arg(long, default_value = "127.0.0.1:9000")]
    peer: SocketAddr,

    /// Physics step in milliseconds
    #[arg(long, default_value_t = 2)]
    step_ms: u64,

    #[arg(long, value_enum, default_value = "pid")]
    policy: Policy,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Run headless for this many simulated seconds and print the final state
    #[arg(long)]
    duration: Option<f32>,

    /// Treat the throttle input as a climb rate command
    #[arg(long)]
    climb_hold: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::parse();

    let mut builder = Builder::default().policy(match opt.policy {
        Policy::Pid => PolicyKind::PidBalance,
        Policy::Direct => PolicyKind::DirectControl,
    });
    if let Some(seed) = opt.seed {
        builder = builder.seed(seed);
    }
    if opt.climb_hold {
        builder = builder.height_mode(HeightMode::ClimbRate { max_rate: 2. });
    }
    let config = builder.build()?;

    let mut vehicle = VehicleState::new(&config)?;
    let dt = opt.step_ms.max(1) as f32 * 1.0e-3;

    if let Some(duration) = opt.duration {
        vehicle.set_input(ControlInput::hover(0.5));
        while vehicle.time() < f64::from(duration) {
            vehicle.update(dt);
        }
        print!("{}", vehicle.telemetry());
        return Ok(());
    }

    let link = TelemetryLink::bind(opt.bind, opt.peer).await?;
    let mut telemetry = Interval::from_millis(config.telemetry_period);

    let mut ticker = time::interval(Duration::from_millis(opt.step_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                vehicle.update(dt);
                if telemetry.advance(dt).is_some() {
                    if let Err(e) = link.send(&vehicle.telemetry()).await {
                        log::warn!("telemetry send failed: {}", e);
                    }
                }
            }
            received = link.recv_commands() => match received {
                Ok(commands) => {
                    for command in commands {
                        vehicle.apply_command(command);
                    }
                }
                Err(e) => log::warn!("telemetry receive failed: {}", e),
            },
            _ = &mut shutdown => {
                log::info!("stopping at t={:.3} s", vehicle.time());
                break;
            }
        }
    }

    Ok(())
}
