use crate::config::SolverConfig;
use crate::logic::AssignmentPipeline;
use crate::solver::MicroLpBackend;
use crate::store;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

/// Assign inventory fibers to the links of a site plan.
#[derive(Debug, Parser)]
#[command(name = "fiber-assign", version, about)]
pub struct Cli {
    /// Fiber inventory CSV (cores,armor,length,name)
    pub fibers: PathBuf,

    /// Link plan CSV (Subtype,Cores,Length,From-Location,To-Location)
    pub links: PathBuf,

    /// Configuration file (JSON, TOML or YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Search time limit in seconds, 0 for none
    #[arg(long)]
    pub time_limit: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Load configuration and inputs, solve, and render the report.
    pub fn run(&self) -> anyhow::Result<String> {
        let mut config = SolverConfig::load(self.config.as_deref())?;
        if let Some(secs) = self.time_limit {
            config.time_limit_secs = secs;
        }
        config.validate()?;

        let fibers = store::load_fibers_from_path(&self.fibers)
            .with_context(|| format!("Failed to load fibers from {}", self.fibers.display()))?;
        let links = store::load_links_from_path(&self.links, config.link_length_margin)
            .with_context(|| format!("Failed to load links from {}", self.links.display()))?;
        log::info!("Loaded {} fibers and {} links", fibers.len(), links.len());

        let report = AssignmentPipeline::new(&fibers, &links, &config).run(&MicroLpBackend)?;

        if self.json {
            Ok(format!("{}\n", serde_json::to_string_pretty(&report)?))
        } else {
            Ok(report.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_inputs() -> (tempfile::NamedTempFile, tempfile::NamedTempFile) {
        let mut fibers = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(fibers, "cores,armor,length,name").unwrap();
        writeln!(fibers, "1,no,20,F1").unwrap();
        writeln!(fibers, "1,no,25,F2").unwrap();

        let mut links = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(links, "Subtype,Cores,Length,From-Location,To-Location").unwrap();
        writeln!(links, "Fibre,1,30,A,B").unwrap();

        (fibers, links)
    }

    #[test]
    fn test_parses_flags() {
        let cli = Cli::try_parse_from([
            "fiber-assign",
            "fibers.csv",
            "links.csv",
            "--config",
            "solver.toml",
            "--time-limit",
            "5",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.fibers, PathBuf::from("fibers.csv"));
        assert_eq!(cli.links, PathBuf::from("links.csv"));
        assert_eq!(cli.config, Some(PathBuf::from("solver.toml")));
        assert_eq!(cli.time_limit, Some(5));
        assert!(cli.json);
        assert!(Cli::try_parse_from(["fiber-assign", "fibers.csv"]).is_err());
    }

    #[test]
    fn test_json_run_reports_chained_link() {
        let (fibers, links) = write_inputs();
        let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(config, "maxChain = 2\nslack = 5").unwrap();

        let fibers_arg = fibers.path().to_string_lossy().to_string();
        let links_arg = links.path().to_string_lossy().to_string();
        let config_arg = config.path().to_string_lossy().to_string();
        let cli = Cli::try_parse_from([
            "fiber-assign",
            fibers_arg.as_str(),
            links_arg.as_str(),
            "--config",
            config_arg.as_str(),
            "--time-limit",
            "30",
            "--json",
        ])
        .unwrap();

        let output = cli.run().unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["status"], "OPTIMAL");
        // 30 m plus the 20 m margin takes both fibers with slack
        assert_eq!(json["links"][0]["fibers"].as_array().unwrap().len(), 2);
        assert_eq!(json["objective"], 2 * 1_000_000 - 5);
        assert_eq!(json["metadata"]["solver_info"]["time_limit_secs"], 30);
    }

    #[test]
    fn test_text_run_and_missing_input() {
        let (fibers, links) = write_inputs();
        let cli = Cli {
            fibers: fibers.path().to_path_buf(),
            links: links.path().to_path_buf(),
            config: None,
            time_limit: None,
            json: false,
        };
        let output = cli.run().unwrap();
        assert!(output.starts_with("Total cost = 1999995\n"));

        let missing = Cli {
            fibers: PathBuf::from("/nonexistent/fibers.csv"),
            ..cli
        };
        let err = missing.run().unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load fibers"));
    }
}
