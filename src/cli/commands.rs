use crate::config::TabellaOptions;
use crate::dynamic::{import_report, DynamicSource, MappingFile};
use crate::error::{TabellaError, TabellaResult};
use crate::excel::{ExcelExporter, ExcelImporter};
use crate::messages::{ImportMessage, Severity};
use crate::model::{ImportResult, SheetMapping};
use crate::validation::ImportValidator;
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

fn load_mappings(path: &Path) -> TabellaResult<Vec<(String, SheetMapping)>> {
    MappingFile::load(path)?.sheet_mappings()
}

fn print_message(message: &ImportMessage) {
    let line = message.to_string();
    let line = match message.severity {
        Severity::Error => line.red(),
        Severity::Warning => line.yellow(),
        Severity::Success => line.green(),
        Severity::Info => line.normal(),
    };
    println!("   {}", line);
}

fn print_summary(result: &ImportResult, mappings: &[(String, SheetMapping)]) {
    for (sheet, mapping) in mappings {
        let status = if mapping.found_in_file {
            format!("worksheet '{}'", mapping.original_sheet_name).normal()
        } else {
            "not found".yellow()
        };
        println!(
            "   📄 {} → {} ({} rows, {})",
            sheet.bright_blue().bold(),
            mapping.entity.name().cyan(),
            result.objects(mapping.entity.name()).len(),
            status
        );
    }
    println!();

    let messages = result.sorted_messages();
    if messages.is_empty() {
        println!("{}", "✅ No diagnostics".bold().green());
        return;
    }

    println!("{}", format!("⚠️  {} diagnostic(s):", messages.len()).bold().yellow());
    for message in messages {
        print_message(message);
    }
}

/// Execute the import command
pub fn import(
    file: PathBuf,
    mapping: PathBuf,
    header_row: usize,
    output: Option<PathBuf>,
    check_duplicates: bool,
    options: &TabellaOptions,
) -> TabellaResult<()> {
    println!("{}", "📥 Tabella - Excel Import".bold().green());
    println!("   File:    {}", file.display());
    println!("   Mapping: {}\n", mapping.display());

    let mut mappings = load_mappings(&mapping)?;
    let importer = ExcelImporter::new(options);

    let reader = BufReader::new(File::open(&file)?);
    let Some(mut result) = importer.process_sheeted_file(reader, &mut mappings, header_row)? else {
        println!("{}", "⚠️  Workbook contains no worksheets".yellow());
        return Ok(());
    };

    if check_duplicates {
        let validator = ImportValidator::new(options);
        let mut found = false;
        for objects in result.processed.values() {
            found |= validator.validate_duplicates(objects, &mut result.messages);
        }
        if found {
            println!("{}", "🔁 Duplicate rows detected".yellow());
        }
    }

    print_summary(&result, &mappings);

    if let Some(output) = output {
        let report = import_report(&result, &mappings);
        fs::write(&output, serde_json::to_string_pretty(&report)?)?;
        println!("\n{}", "✅ Import Complete!".bold().green());
        println!("   Rows written to: {}\n", output.display());
    }

    Ok(())
}

/// Execute the export command
pub async fn export(
    output: PathBuf,
    mapping: PathBuf,
    data: PathBuf,
    options: &TabellaOptions,
) -> TabellaResult<()> {
    println!("{}", "📤 Tabella - Excel Export".bold().green());
    println!("   Data:    {}", data.display());
    println!("   Mapping: {}", mapping.display());
    println!("   Output:  {}\n", output.display());

    let mappings = load_mappings(&mapping)?;
    let source = DynamicSource::load(&data, &mappings)?;
    println!("   {} row(s) loaded\n", source.len());

    let (_cancel_tx, cancel) = watch::channel(false);
    let exporter = ExcelExporter::new(options);
    let mut writer = BufWriter::new(File::create(&output)?);
    let result = exporter
        .export_sheets(&mut writer, &mappings, &source, &cancel)
        .await;

    for warning in &result.warnings {
        println!("   {}", warning.yellow());
    }

    if !result.is_success {
        return Err(TabellaError::Export(format!(
            "export to '{}' did not complete",
            output.display()
        )));
    }

    println!("{}", "✅ Export Complete!".bold().green());
    println!("   Excel file: {}\n", output.display());
    Ok(())
}

/// Execute the template command
pub fn template(output: PathBuf, mapping: PathBuf, options: &TabellaOptions) -> TabellaResult<()> {
    println!("{}", "🧾 Tabella - Import Template".bold().green());
    println!("   Mapping: {}", mapping.display());

    let mappings = load_mappings(&mapping)?;
    let exporter = ExcelExporter::new(options);
    let mut writer = BufWriter::new(File::create(&output)?);
    exporter.write_template(&mut writer, &mappings)?;

    for (sheet, mapping) in &mappings {
        println!(
            "   📄 {} ({} columns)",
            sheet.bright_blue().bold(),
            mapping.columns.len()
        );
    }
    println!("\n{}", "✅ Template written!".bold().green());
    println!("   Excel file: {}\n", output.display());
    Ok(())
}
