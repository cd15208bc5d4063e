use crate::config::ScanConfig;
use crate::error::Result;
use crate::scanner::{DetectOptions, JdkScanner};

pub struct DetectCommand<'a> {
    config: &'a ScanConfig,
}

impl<'a> DetectCommand<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    pub fn execute(
        &self,
        force: bool,
        paths: Vec<String>,
        ignore_platform_paths: bool,
        json: bool,
    ) -> Result<()> {
        let scanner = JdkScanner::new(self.config.clone());
        let opts = DetectOptions {
            force,
            paths: paths.into(),
            ignore_platform_paths,
            observable: false,
        };

        let records = scanner.detect(&opts)?.records();

        if json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        if records.is_empty() {
            println!("No JDKs found");
            return Ok(());
        }

        println!("{}", super::render_table(&records));
        println!(
            "{} JDK{} detected",
            records.len(),
            if records.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }
}
