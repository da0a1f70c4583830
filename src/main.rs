use bounce_parser::{Config, CorrelationScope, Runner};
use clap::{Arg, Command};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let matches = Command::new("bounce-parser")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extracts bounced and deferred deliveries from Postfix logs")
        .long_about("Bounce Parser - correlates Postfix queue manager and delivery log lines:\n\
                    • Joins sender (qmgr) and failure (smtp/lmtp) lines by queue ID\n\
                    • Resolves a readable reason from the remote reply or DSN code\n\
                    • Writes a JSON file and a Bounces spreadsheet per log file with bounces")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/bounce-parser.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-dir")
                .short('l')
                .long("log-dir")
                .value_name("DIR")
                .help("Directory with Postfix logs (overrides config and LOG_DIR)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Write output files here instead of next to each log")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("year")
                .long("year")
                .value_name("YEAR")
                .help("Year for log timestamps (default: current year)")
                .value_parser(clap::value_parser!(i32))
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("combined")
                .long("combined")
                .help("Correlate all log files as one batch")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-log")
                .long("test-log")
                .value_name("FILE")
                .help("Correlate a single log file and print the bounces without writing output")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Print run statistics when done")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();

    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    if let Some(dir) = matches.get_one::<String>("log-dir") {
        config.log_dir = Some(PathBuf::from(dir));
    } else if config.log_dir.is_none() {
        config.log_dir = std::env::var_os("LOG_DIR").map(PathBuf::from);
    }
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.output.directory = Some(PathBuf::from(dir));
    }
    if let Some(year) = matches.get_one::<i32>("year") {
        config.year = Some(*year);
    }
    if matches.get_flag("combined") {
        config.correlation_scope = CorrelationScope::Combined;
    }

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    let mut runner = match Runner::new(config.clone()) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e:#}");
            process::exit(1);
        }
    };

    if let Some(log_file) = matches.get_one::<String>("test-log") {
        test_log_file(&runner, Path::new(log_file));
        return;
    }

    let Some(log_dir) = config.log_dir.clone() else {
        eprintln!("❌ No log directory: set log_dir in the configuration, pass --log-dir, or export LOG_DIR");
        process::exit(1);
    };

    if !log_dir.is_dir() {
        eprintln!("❌ Log directory not found: {}", log_dir.display());
        process::exit(1);
    }

    log::info!("Scanning {} for bounces...", log_dir.display());
    if let Err(e) = runner.run(&log_dir) {
        log::error!("Error walking through files: {e:#}");
        process::exit(1);
    }

    if matches.get_flag("stats") {
        println!();
        runner.statistics().print_summary();
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}

fn test_config(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();

    let normalizer = match config.validate().and_then(|()| config.normalizer()) {
        Ok(normalizer) => normalizer,
        Err(e) => {
            println!("❌ Configuration validation failed:");
            println!("Error: {e:#}");
            process::exit(1);
        }
    };

    match &config.log_dir {
        Some(dir) if dir.is_dir() => println!("Log directory: {}", dir.display()),
        Some(dir) => println!("⚠️  Log directory does not exist: {}", dir.display()),
        None => println!("⚠️  No log directory configured"),
    }
    println!("Admission tag: {}", config.admission_tag);
    println!(
        "Time zone: {} ({})",
        config.timezone.name,
        normalizer.utc_offset_label()
    );
    match config.year {
        Some(year) => println!("Timestamp year: {year}"),
        None => println!("Timestamp year: current"),
    }
    println!("Correlation scope: {:?}", config.correlation_scope);
    println!(
        "Outputs: json={} xlsx={} csv={}",
        config.output.json, config.output.xlsx, config.output.csv
    );
    println!("Soft DSN codes: {}", config.soft_dsn.soft_codes().join(" "));
    println!("Known bounce reasons: {}", config.bounce_reasons.len());
    println!("✅ Configuration is valid");
}

fn test_log_file(runner: &Runner, path: &Path) {
    println!("🧪 Testing log file: {}", path.display());
    println!();

    let report = match runner.correlate_file(path) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    };

    let stats = &report.stats;
    println!("📧 Lines scanned: {}", stats.lines_scanned);
    println!("   Admissions: {}", stats.admissions);
    println!("   Failure lines: {}", stats.failure_lines);
    println!("   Dropped without sender: {}", stats.dropped_without_sender);
    println!();

    if report.records.is_empty() {
        println!("✅ No bounces found");
    } else {
        println!("🚨 {} bounces:", report.records.len());
        for record in &report.records {
            println!(
                "   {} {} {} -> {} [{} {}] {}",
                record.date.to_rfc3339(),
                record.queue_id,
                record.from,
                record.to,
                record.dsn,
                record.status,
                record.reason
            );
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("⚠️  {} lines skipped:", report.warnings.len());
        for warning in &report.warnings {
            println!("   - {warning}");
        }
    }
}
