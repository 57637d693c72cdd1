//! Table rendering for stdout.

use std::io::{self, Write};

use esma_common::Table;
use serde_json::{Map, Value};

use crate::OutputFormat;

/// Writes `table` to stdout in `format`.
pub fn print_table(table: &Table, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    write_table(&mut out, table, format)?;
    out.flush()?;
    Ok(())
}

/// Renders `table`. Text output is tab-separated with a header row; null
/// cells are empty. JSON output is an array of objects with `null` cells.
pub fn write_table(out: &mut impl Write, table: &Table, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            if table.column_count() == 0 {
                return Ok(());
            }
            let header: Vec<&str> = table.columns().collect();
            writeln!(out, "{}", header.join("\t"))?;
            for row in table.rows() {
                let cells: Vec<String> = row
                    .cells()
                    .iter()
                    .map(|cell| cell.as_deref().map(escape).unwrap_or_default())
                    .collect();
                writeln!(out, "{}", cells.join("\t"))?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            let rows: Vec<Value> = table
                .rows()
                .map(|row| {
                    let object: Map<String, Value> = table
                        .columns()
                        .zip(row.cells())
                        .map(|(name, cell)| {
                            let value = cell.clone().map(Value::String).unwrap_or(Value::Null);
                            (name.to_string(), value)
                        })
                        .collect();
                    Value::Object(object)
                })
                .collect();
            serde_json::to_writer_pretty(&mut *out, &rows)?;
            writeln!(out)
        }
    }
}

fn escape(cell: &str) -> String {
    cell.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use esma_common::FlatRecord;

    fn sample() -> Table {
        let first: FlatRecord = [("Id", Some("DE0001".to_string())), ("Mthdlgy", None)]
            .into_iter()
            .collect();
        let second: FlatRecord = [("Id", Some("DE\t0002".to_string()))].into_iter().collect();
        Table::from_records(&[first, second])
    }

    fn render(table: &Table, format: OutputFormat) -> String {
        let mut buf = Vec::new();
        write_table(&mut buf, table, format).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn text_is_tab_separated() {
        assert_eq!(
            render(&sample(), OutputFormat::Text),
            "Id\tMthdlgy\nDE0001\t\nDE 0002\t\n"
        );
    }

    #[test]
    fn json_keeps_nulls() {
        let parsed: Value = serde_json::from_str(&render(&sample(), OutputFormat::Json)).unwrap();
        assert_eq!(parsed[0]["Id"], "DE0001");
        assert_eq!(parsed[0]["Mthdlgy"], Value::Null);
        assert_eq!(parsed[1]["Id"], "DE\t0002");
    }

    #[test]
    fn empty_table_renders_nothing_or_empty_array() {
        assert_eq!(render(&Table::new(), OutputFormat::Text), "");
        assert_eq!(render(&Table::new(), OutputFormat::Json), "[]\n");
    }
}
