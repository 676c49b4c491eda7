//! Integration tests for CLI argument handling
//!
//! Tests the page URL argument and the display flags from the command line.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_statusboard"))
        .args(args)
        .output()
        .expect("Failed to execute statusboard")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("statusboard"), "Help should mention statusboard");
    assert!(stdout.contains("variant"), "Help should mention --variant flag");
    assert!(stdout.contains("headless"), "Help should mention --headless flag");
}

#[test]
fn test_invalid_url_prints_error_and_exits() {
    let output = run_cli(&["not a url", "--headless"]);
    assert!(!output.status.success(), "Expected invalid URL to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid page URL"),
        "Should print error message about the URL: {}",
        stderr
    );
}

#[test]
fn test_unknown_variant_is_rejected() {
    let output = run_cli(&["--variant", "neon"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("neon") || stderr.contains("invalid"),
        "Should name the bad value: {}",
        stderr
    );
}

#[test]
fn test_invalid_date_format_is_rejected() {
    let output = run_cli(&["--date-format", "%Q", "--headless"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid date format"), "stderr: {}", stderr);
}

#[test]
fn test_date_format_with_zone_is_rejected() {
    let output = run_cli(&["--date-format", "%d.%m.%Y %Z", "--headless"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid date format"), "stderr: {}", stderr);
    assert!(!stderr.contains("panicked"), "stderr: {}", stderr);
}

#[test]
fn test_blink_variant_is_valid() {
    // With --help, it should succeed regardless of other flags
    let output = run_cli(&["--variant", "blink", "--help"]);
    assert!(output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use statusboard::cli::{parse_page_url, Cli, StartupConfig, DEFAULT_PAGE_URL};
    use statusboard::clock::DisplayVariant;

    #[test]
    fn test_cli_no_args_uses_default_url() {
        let cli = Cli::parse_from(["statusboard"]);
        assert_eq!(cli.url, DEFAULT_PAGE_URL);
    }

    #[test]
    fn test_cli_url_with_query() {
        let cli = Cli::parse_from(["statusboard", "http://board.local/?station=Garching"]);
        let config = StartupConfig::from_cli(&cli).expect("URL should be accepted");
        assert_eq!(config.page_url.query(), Some("station=Garching"));
    }

    #[test]
    fn test_cli_variant_flag() {
        let cli = Cli::parse_from(["statusboard", "--variant", "blink"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.face.variant, DisplayVariant::Blink);
    }

    #[test]
    fn test_parse_page_url_invalid_returns_error() {
        assert!(parse_page_url("ftp://board.local/").is_err());
        assert!(parse_page_url("").is_err());
    }
}
