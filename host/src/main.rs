use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use host::{
    load_config, load_json, run_live, run_script, save_json, verify_report, ControlScript,
    LiveOptions, MatchReport,
};
use paddle_core::constants::TICK_PERIOD_MS;

/// Master node of the networked paddle game
#[derive(Parser)]
#[command(name = "paddle-master")]
#[command(about = "Runs, replays and verifies paddle matches")]
struct Cli {
    /// Game configuration (JSON, camelCase keys); defaults to the hardware setup
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a control script headless and write a match report
    Simulate {
        /// Control script (JSON)
        script: PathBuf,
        /// Report file; defaults to paddle-report_<timestamp>.json
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replay a control script and check it reproduces a report
    Verify {
        script: PathBuf,
        report: PathBuf,
    },

    /// Play in real time against two simulated controllers
    Live {
        /// Wall-clock limit for the match
        #[arg(long, default_value_t = 10)]
        seconds: u64,
        /// Tick period
        #[arg(long, default_value_t = TICK_PERIOD_MS)]
        period_ms: u64,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    println!("🏓 Paddle Master");
    println!("{}", "=".repeat(70));
    println!();

    let result = match cli.command {
        Commands::Simulate { script, output } => {
            simulate_command(cli.config.as_deref(), &script, output.as_deref())
        }
        Commands::Verify { script, report } => {
            verify_command(cli.config.as_deref(), &script, &report)
        }
        Commands::Live { seconds, period_ms } => live_command(
            cli.config.as_deref(),
            Duration::from_secs(seconds),
            Duration::from_millis(period_ms),
        ),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn simulate_command(
    config: Option<&Path>,
    script_file: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let script: ControlScript = load_json(script_file)?;

    println!("📋 Replaying control script");
    println!("  Script: {}", script_file.display());
    println!("  Steps: {}", script.steps.len());
    println!("  Peers: {} (left), {} (right)", script.peers[0], script.peers[1]);
    println!();

    let start = Instant::now();
    let mut report = run_script(&config, &script)?;
    report.created_at = Some(chrono::Utc::now().to_rfc3339());
    println!("  Replay time: {:.2}s", start.elapsed().as_secs_f64());
    println!();

    let default_filename = PathBuf::from(format!(
        "paddle-report_{}.json",
        chrono::Utc::now().timestamp()
    ));
    let file_to_save = output.unwrap_or(default_filename.as_path());
    save_json(&report, file_to_save)?;

    print_report(&report);
    println!();
    println!("💾 Report saved to: {}", file_to_save.display());
    println!(
        "   Use 'verify {} {}' to check it by replay",
        script_file.display(),
        file_to_save.display()
    );
    println!("{}", "=".repeat(70));
    Ok(())
}

fn verify_command(config: Option<&Path>, script_file: &Path, report_file: &Path) -> Result<()> {
    let config = load_config(config)?;
    let script: ControlScript = load_json(script_file)?;
    let report: MatchReport = load_json(report_file)?;

    println!("📋 Verifying report");
    println!("  Script: {}", script_file.display());
    println!("  Report: {}", report_file.display());
    println!();

    println!("🔁 Replaying...");
    let start = Instant::now();
    verify_report(&config, &script, &report)?;
    println!("  Replay time: {:.2}s", start.elapsed().as_secs_f64());
    println!();

    println!("✅ Report reproduced exactly!");
    print_report(&report);
    println!("{}", "=".repeat(70));
    Ok(())
}

fn live_command(config: Option<&Path>, duration: Duration, period: Duration) -> Result<()> {
    let config = load_config(config)?;

    println!("📡 Live match against simulated controllers");
    println!("  Screen: {}x{}", config.screen_width, config.screen_height);
    println!("  Tick period: {} ms", period.as_millis());
    println!("  Time limit: {} s", duration.as_secs());
    println!();

    let summary = run_live(&config, LiveOptions { duration, period })?;

    match summary.winner {
        Some(winner) => println!("🏆 {} wins!", winner),
        None => println!("⏱️  Time limit reached"),
    }
    println!("  Score: {}-{}", summary.score.left, summary.score.right);
    println!("  Ticks: {}", summary.ticks);
    println!("  Paddle hits: {}", summary.paddle_hits);
    if summary.dropped_updates > 0 {
        println!("  Dropped controller updates: {}", summary.dropped_updates);
    }
    println!();
    print!("{}", summary.snapshot);
    println!("{}", "=".repeat(70));
    Ok(())
}

fn print_report(report: &MatchReport) {
    println!("  Score: {}-{}", report.left_score, report.right_score);
    match report.winner {
        Some(winner) => println!("  Winner: {}", winner),
        None => println!("  Winner: none (tick limit reached)"),
    }
    println!("  Ticks: {}", report.ticks);
    println!("  Serves: {}", report.serves);
    println!("  Paddle hits: {}", report.paddle_hits);
    println!("  Wall bounces: {}", report.wall_bounces);
    println!("  Goals: {}", report.goals);
    println!("  Frame digest: 0x{}", report.frame_digest);
}
