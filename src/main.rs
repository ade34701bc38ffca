use clap::Parser;
use dumpsplit::{Cli, DumpSplit, DumpSplitError, OutputFormatter, OutputMode, UserFriendlyError};
use std::path::PathBuf;
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let Some(source) = cli.source.clone() else {
        // clap enforces SOURCE unless --generate-config is given
        return 2;
    };

    let dumpsplit = match DumpSplit::from_cli(&cli) {
        Ok(dumpsplit) => dumpsplit,
        Err(e) => {
            print_startup_error(&e);
            return e.exit_code();
        }
    };

    if cli.dry_run {
        return handle_dry_run(&dumpsplit, &source);
    }

    match dumpsplit.extract(&source) {
        Ok(report) => {
            dumpsplit.output_formatter().print_extraction_report(&report);
            0
        }
        Err(e) => {
            dumpsplit.handle_error(&e);
            e.exit_code()
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("dumpsplit.toml"));

    match DumpSplit::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path.display());
            println!("\nTo use this configuration:");
            println!("  dumpsplit <source> <output-dir> --config {}", config_path.display());
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(dumpsplit: &DumpSplit, source: &std::path::Path) -> i32 {
    let formatter = dumpsplit.output_formatter();

    formatter.info("DRY RUN MODE - No files will be written");
    formatter.print_separator();

    match dumpsplit.plan(source) {
        Ok(report) => {
            formatter.print_plan(&report);
            formatter.print_separator();
            formatter.print_extraction_report(&report);
            0
        }
        Err(e) => {
            dumpsplit.handle_error(&e);
            e.exit_code()
        }
    }
}

fn print_startup_error(error: &DumpSplitError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dumpsplit::Config;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli::try_parse_from([
            "dumpsplit",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(handle_generate_config(&cli), 0);

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[extraction]"));
    }

    #[test]
    fn test_dry_run_mode() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("dump.txt");
        fs::write(&source, "==========\nFILE: a.txt\n==========\nhi\n").unwrap();

        let mut config = Config::default();
        config.output.directory = temp_dir.path().join("out");
        let dumpsplit = DumpSplit::detached(config, OutputMode::Plain, 0, true);

        assert_eq!(handle_dry_run(&dumpsplit, &source), 0);
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_dry_run_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let dumpsplit = DumpSplit::detached(Config::default(), OutputMode::Plain, 0, true);

        assert_eq!(handle_dry_run(&dumpsplit, &temp_dir.path().join("nope.txt")), 3);
    }
}
