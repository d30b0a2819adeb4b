use colored::Colorize;
use console::Term;
use std::io::{self, Write};

/// CLIの表示ユーティリティ
///
/// パスなどシェルから使われる出力はstdoutに、それ以外のメッセージは
/// stderrに書く。
pub struct DisplayHelper {
    pub use_color: bool,
    pub terminal: Term,
}

impl DisplayHelper {
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            terminal: Term::stderr(),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "✓".green().bold(), message);
        } else {
            eprintln!("[SUCCESS] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "Error:".red().bold(), message);
        } else {
            eprintln!("Error: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "⚠".yellow().bold(), message);
        } else {
            eprintln!("[WARNING] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "::".blue().bold(), message);
        } else {
            eprintln!("[INFO] {}", message);
        }
    }

    pub fn format_repo(&self, repo: &str) -> String {
        if self.use_color {
            repo.cyan().bold().to_string()
        } else {
            repo.to_string()
        }
    }

    pub fn format_path(&self, path: &str) -> String {
        if self.use_color {
            path.cyan().to_string()
        } else {
            format!("'{}'", path)
        }
    }

    /// 表形式で出力する（stdout）
    pub fn print_table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if rows.is_empty() {
            return;
        }
        let widths = column_widths(headers, rows);

        let header_line = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let cell = format!("{:<width$}", header, width = widths[i]);
                if self.use_color {
                    cell.bold().to_string()
                } else {
                    cell
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", header_line.trim_end());

        let rule = if self.use_color { "─" } else { "-" };
        let separator = widths
            .iter()
            .map(|width| rule.repeat(*width))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", separator);

        for row in rows {
            println!("{}", format_row(row, &widths));
        }
    }

    /// Print a list with bullets
    pub fn print_list(&self, items: &[String]) {
        for item in items {
            if self.use_color {
                println!("  {} {}", "•".blue(), item);
            } else {
                println!("  - {}", item);
            }
        }
    }

    /// Prompt for confirmation
    pub fn confirm(&self, message: &str) -> io::Result<bool> {
        if !self.terminal.is_term() {
            return Ok(false);
        }
        if self.use_color {
            eprint!("{} {} [y/N]: ", "?".yellow().bold(), message);
        } else {
            eprint!("[CONFIRM] {} [y/N]: ", message);
        }
        io::stderr().flush()?;

        let input = self.terminal.read_line()?;
        let input = input.trim().to_lowercase();
        Ok(input == "y" || input == "yes")
    }
}

fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }
    widths
}

fn format_row(row: &[String], widths: &[usize]) -> String {
    row.iter()
        .enumerate()
        .map(|(i, cell)| {
            let width = widths.get(i).copied().unwrap_or(0);
            format!("{:<width$}", cell, width = width)
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
