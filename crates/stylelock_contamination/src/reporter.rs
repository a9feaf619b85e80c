use std::io::{self, Write};

use colored::Colorize;
use log::debug;

use crate::types::FileReport;

pub fn print_clean_message<W: Write>(writer: &mut W, files_checked: usize) -> io::Result<()> {
    debug!("No contamination detected");
    writeln!(
        writer,
        "{} No contaminated selectors found in {} stylesheet modules.",
        "✓".green().bold(),
        files_checked
    )?;
    writer.flush()?;
    Ok(())
}

pub fn print_contamination_report<W: Write>(
    writer: &mut W,
    reports: &[FileReport],
) -> io::Result<()> {
    debug!("Printing contamination report for {} files", reports.len());

    let mut total = 0;
    for report in reports {
        writeln!(writer, "\n{} {}", "✗".red().bold(), report.file.bold())?;
        writeln!(
            writer,
            "  The existence of the following selectors will contaminate the common style:"
        )?;
        for selector in &report.dirty_selectors {
            writeln!(writer, "    {}", format!("`{}`", selector.trim()).yellow())?;
            total += 1;
        }
    }

    writeln!(
        writer,
        "\n{} {} contaminated selector(s) across {} file(s).",
        "●".red(),
        total.to_string().red().bold(),
        reports.len().to_string().bold()
    )?;
    writer.flush()?;
    Ok(())
}
