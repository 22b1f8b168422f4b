use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "campbell-river-gtfs")]
#[command(about = "Generates Campbell River Transit System bus schedules from a GTFS archive")]
#[command(version)]
pub struct Cli {
    /// GTFS zip file, or an http(s) URL to download it from
    #[arg(default_value = "input/gtfs.zip")]
    pub archive: String,

    /// Directory the generated files are written to
    #[arg(default_value = "../../mtransitapps/ca-campbell-river-transit-system-bus-android/res/raw/")]
    pub output_dir: PathBuf,

    /// Prefix added to every generated file name
    #[arg(default_value = "")]
    pub file_prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["campbell-river-gtfs"]);
        assert_eq!(cli.archive, "input/gtfs.zip");
        assert!(cli.output_dir.ends_with("res/raw"));
        assert_eq!(cli.file_prefix, "");
    }

    #[test]
    fn test_positionals() {
        let cli = Cli::parse_from(["campbell-river-gtfs", "https://example.org/gtfs.zip", "out", "next_"]);
        assert_eq!(cli.archive, "https://example.org/gtfs.zip");
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert_eq!(cli.file_prefix, "next_");
    }
}
