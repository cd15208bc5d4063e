use crate::config::ScanConfig;
use crate::error::Result;
use crate::scanner::{DetectOptions, JdkScanner};
use std::thread;

pub struct WatchCommand<'a> {
    config: &'a ScanConfig,
}

impl<'a> WatchCommand<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    /// Prints the result set on every change until the process is killed.
    pub fn execute(&self, paths: Vec<String>, ignore_platform_paths: bool) -> Result<()> {
        let scanner = JdkScanner::new(self.config.clone());
        let opts = DetectOptions {
            paths: paths.into(),
            ignore_platform_paths,
            observable: true,
            ..Default::default()
        };

        let handle = scanner.watch(&opts)?;

        let baseline = handle.collection().snapshot();
        println!("{}", super::render_table(&baseline));

        handle.on_results(|records| {
            println!("{}", super::render_table(records));
        });
        handle.on_error(|error| {
            eprintln!("Watch stopped: {error}");
            std::process::exit(1);
        });

        loop {
            thread::park();
            if handle.is_stopped() {
                return Ok(());
            }
        }
    }
}
