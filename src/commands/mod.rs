pub mod detect;
pub mod watch;

use crate::models::JdkRecord;
use comfy_table::Table;

/// Renders detection results the way `list`-style commands print tables.
pub(crate) fn render_table(records: &[JdkRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_BORDERS_ONLY);
    table.set_header(vec!["Version", "Build", "Arch", "Default", "Path"]);

    for record in records {
        table.add_row(vec![
            record
                .version
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record
                .build
                .map(|b| b.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record
                .architecture
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
            if record.is_default { "*" } else { "" }.to_string(),
            record.path.display().to_string(),
        ]);
    }

    table
}
