/// Console output helpers for the command-line front end.
use crossterm::{
    style::{self, Stylize},
    ExecutableCommand,
};
use std::io::{self, Write};

pub fn echo(s: String) {
    let _ = io::stdout().execute(style::Print(s));
    let _ = io::stdout().flush();
}

pub fn error(s: String) {
    let _ = io::stderr().execute(style::PrintStyledContent(style::style(s).red()));
    let _ = io::stderr().flush();
}

pub fn echo_lines(s: String) {
    let mut stdout = io::stdout();
    for l in s.lines() {
        let _ = stdout.execute(style::Print(format!("{}\n", l)));
    }
    let _ = stdout.flush();
}

/// Renders rows as an ASCII grid with a header line.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut result = String::new();

    // Determine the width of each column by finding the longest string in each
    let mut column_widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, col) in row.iter().enumerate() {
            if i < column_widths.len() {
                column_widths[i] = column_widths[i].max(col.chars().count());
            }
        }
    }

    let border = |result: &mut String| {
        result.push('+');
        for width in &column_widths {
            result.push_str(&"-".repeat(*width + 2));
            result.push('+');
        }
        result.push('\n');
    };

    border(&mut result);
    if !headers.is_empty() {
        result.push('|');
        for (i, header) in headers.iter().enumerate() {
            result.push_str(&format!(" {:<width$} |", header, width = column_widths[i]));
        }
        result.push('\n');
        border(&mut result);
    }

    for row in rows {
        result.push('|');
        for (i, col) in row.iter().enumerate().take(column_widths.len()) {
            result.push_str(&format!(" {:<width$} |", col, width = column_widths[i]));
        }
        result.push('\n');
    }
    if !rows.is_empty() {
        border(&mut result);
    }

    result
}

#[macro_export]
macro_rules! echo {
    ($($arg:tt)*) => {
        $crate::console::echo(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::console::error(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! echo_lines {
    ($($arg:tt)*) => {
        $crate::console::echo_lines(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table() {
        let headers = vec!["name".to_string(), "age".to_string()];
        let rows = vec![
            vec!["Alice".to_string(), "30".to_string()],
            vec!["Bob".to_string(), "NULL".to_string()],
        ];
        let rendered = render_table(&headers, &rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "+-------+------+");
        assert_eq!(lines[1], "| name  | age  |");
        assert_eq!(lines[3], "| Alice | 30   |");
        assert_eq!(lines[4], "| Bob   | NULL |");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_render_empty_result() {
        let headers = vec!["name".to_string()];
        let rendered = render_table(&headers, &[]);
        assert_eq!(rendered.lines().count(), 3);
    }
}
