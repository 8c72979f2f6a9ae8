//! Terminal output helpers for `cli-sync`.

use clap::builder::styling::{AnsiColor, Color as ClapColor, Style};
use clap::builder::Styles;
use crossterm::style::{Color, StyledContent, Stylize};

const SECTION_WIDTH: usize = 60;

pub fn get_styles() -> Styles {
    let bold = |color: AnsiColor| Style::new().bold().fg_color(Some(ClapColor::Ansi(color)));
    Styles::styled()
        .usage(bold(AnsiColor::Cyan).underline())
        .header(bold(AnsiColor::Cyan).underline())
        .literal(bold(AnsiColor::Green))
        .invalid(bold(AnsiColor::Red))
        .error(bold(AnsiColor::Red))
        .valid(bold(AnsiColor::Green))
        .placeholder(Style::new().fg_color(Some(ClapColor::Ansi(AnsiColor::BrightBlack))))
}

mod palette {
    use crossterm::style::Color;

    pub const ACCENT: Color = Color::Rgb { r: 0, g: 200, b: 255 };
    pub const OK: Color = Color::Rgb { r: 0, g: 230, b: 120 };
    pub const WARN: Color = Color::Rgb { r: 255, g: 165, b: 0 };
    pub const FAIL: Color = Color::Rgb { r: 255, g: 85, b: 85 };
    pub const MUTED: Color = Color::Rgb { r: 128, g: 128, b: 128 };
    pub const TEXT: Color = Color::Rgb { r: 235, g: 235, b: 235 };
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn accent(s: &str) -> StyledContent<&str> {
    s.with(palette::ACCENT)
}

pub fn print_success(message: &str) {
    println!(" {} {}", "✓".with(palette::OK).bold(), message.with(palette::OK));
}

pub fn print_error(message: &str) {
    eprintln!(" {} {}", "✗".with(palette::FAIL).bold(), message.with(palette::FAIL));
}

pub fn print_warning(message: &str) {
    println!(" {} {}", "!".with(palette::WARN).bold(), message.with(palette::WARN));
}

pub fn print_section_header(title: &str) {
    let fill = SECTION_WIDTH.saturating_sub(width(title) + 2);
    let left = fill / 2;
    println!();
    println!(
        "{}{} {} {}{}",
        accent("╭"),
        accent(&"─".repeat(left)),
        title.with(palette::ACCENT).bold(),
        accent(&"─".repeat(fill - left)),
        accent("╮"),
    );
}

pub fn print_section_footer() {
    println!("{}{}{}", accent("╰"), accent(&"─".repeat(SECTION_WIDTH)), accent("╯"));
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        "●".with(palette::ACCENT),
        format!("{}:", key).with(palette::MUTED),
        value.with(palette::TEXT)
    );
}

/// Color of a cell in a batch report. Status words get their own color.
fn cell_color(cell: &str) -> Color {
    match cell {
        "created" => palette::OK,
        "updated" => palette::ACCENT,
        "error" => palette::FAIL,
        _ => palette::TEXT,
    }
}

/// Boxed table sized to its widest cells.
pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    pub fn new(headers: Vec<&str>) -> Self {
        TableBuilder {
            headers: headers.into_iter().map(String::from).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<&str>) {
        self.rows.push(row.into_iter().map(String::from).collect());
    }

    fn column_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| width(cell))
                    .fold(width(header), usize::max)
            })
            .collect()
    }

    fn border(widths: &[usize], left: &str, junction: &str, right: &str) {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        println!("{}", accent(&format!("{}{}{}", left, segments.join(junction), right)));
    }

    pub fn print(&self) {
        if self.headers.is_empty() {
            return;
        }
        let widths = self.column_widths();

        Self::border(&widths, "╭", "┬", "╮");
        print!("{}", accent("│"));
        for (header, w) in self.headers.iter().zip(&widths) {
            let padding = " ".repeat(w - width(header));
            print!(
                " {}{} {}",
                header.as_str().with(palette::ACCENT).bold(),
                padding,
                accent("│")
            );
        }
        println!();
        Self::border(&widths, "├", "┼", "┤");

        for row in &self.rows {
            print!("{}", accent("│"));
            for (i, w) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let padding = " ".repeat(w.saturating_sub(width(cell)));
                print!(" {}{} {}", cell.with(cell_color(cell)), padding, accent("│"));
            }
            println!();
        }
        Self::border(&widths, "╰", "┴", "╯");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_widths_follow_the_widest_cell() {
        let mut table = TableBuilder::new(vec!["ID", "STATUS"]);
        table.add_row(vec!["blog-post-1", "created"]);
        table.add_row(vec!["b2"]);
        assert_eq!(table.column_widths(), vec![11, 7]);
    }
}
