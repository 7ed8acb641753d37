use std::io::{self, IsTerminal, Stdout, Write};

use chrono::Local;
use jot_core::{Item, ListStats, RowDescriptor, ViewOptions};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;

#[derive(Debug)]
pub struct Renderer<W> {
    out: W,
    color: bool,
}

impl Renderer<Stdout> {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.color_enabled()? && io::stdout().is_terminal();
        Ok(Self {
            out: io::stdout(),
            color,
        })
    }
}

impl<W: Write> Renderer<W> {
    /// Renderer over an arbitrary writer. Color is never emitted.
    pub fn with_writer(out: W) -> Self {
        Self { out, color: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn line(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    #[tracing::instrument(skip(self, rows))]
    pub fn print_rows(
        &mut self,
        rows: &[RowDescriptor],
        view: ViewOptions,
        total: usize,
    ) -> anyhow::Result<()> {
        if rows.is_empty() {
            writeln!(self.out, "No items.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Done".to_string(),
            "Created".to_string(),
            "Text".to_string(),
        ];

        let mut table = Vec::with_capacity(rows.len());
        for row in rows {
            table.push(self.row_cells(row));
        }

        write_table(&mut self.out, headers, table)?;
        writeln!(
            self.out,
            "\n{} of {} item(s), filter:{} sort:{}",
            rows.len(),
            total,
            view.filter,
            view.sort
        )?;
        Ok(())
    }

    /// An item scheduled for removal, whether or not the current view shows it.
    pub fn print_removing(&mut self, item: &Item) -> anyhow::Result<()> {
        let text = self.paint(&item.text, "2;9");
        writeln!(self.out, "Removing {} {}", item.id, text)?;
        Ok(())
    }

    pub fn print_item(&mut self, item: &Item) -> anyhow::Result<()> {
        writeln!(self.out, "id         {}", item.id)?;
        writeln!(self.out, "text       {}", item.text)?;
        writeln!(
            self.out,
            "status     {}",
            if item.completed { "completed" } else { "uncompleted" }
        )?;
        writeln!(
            self.out,
            "created    {}",
            item.created_at.format("%Y-%m-%dT%H:%M:%S%.3fZ")
        )?;
        Ok(())
    }

    pub fn print_stats(&mut self, stats: ListStats) -> anyhow::Result<()> {
        writeln!(self.out, "total      {}", stats.total)?;
        writeln!(self.out, "completed  {}", stats.completed)?;
        writeln!(self.out, "remaining  {}", stats.remaining)?;
        Ok(())
    }

    pub fn print_json(&mut self, items: &[Item]) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, items)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn row_cells(&self, row: &RowDescriptor) -> Vec<String> {
        let id = self.paint(&row.id.to_string(), "33");
        let done = if row.completed { "[x]" } else { "[ ]" }.to_string();
        let created = row
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        let text = if row.removing {
            self.paint(&row.text, "2;9")
        } else if row.completed {
            self.paint(&row.text, "9")
        } else {
            row.text.clone()
        };
        vec![id, done, created, text]
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
