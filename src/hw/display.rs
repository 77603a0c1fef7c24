//! Text sinks: the 2 x 8 character LCD and the serial console

use std::io::Write;

use crate::hw::TextSink;
use crate::types::SinkError;
use crate::{LCD_COLUMNS, LCD_ROWS};

/// Non-Latin-1 glyphs present in the controller ROM
const EXTRA_GLYPHS: [char; 3] = ['→', '←', '°'];

fn displayable(c: char) -> bool {
    ((c as u32) <= 0xFF && !c.is_control()) || EXTRA_GLYPHS.contains(&c)
}

/// Character LCD emulation: cursor-addressed rows of fixed width
#[derive(Debug, Clone)]
pub struct CharacterLcd {
    rows: [[char; LCD_COLUMNS]; LCD_ROWS],
    cursor: (usize, usize),
    available: bool,
    mirror: bool,
}

impl Default for CharacterLcd {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterLcd {
    /// Create connected display, blank
    pub fn new() -> Self {
        Self {
            rows: [[' '; LCD_COLUMNS]; LCD_ROWS],
            cursor: (0, 0),
            available: true,
            mirror: false,
        }
    }

    /// A display that did not answer on the bus
    pub fn disconnected() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Also draw every frame on stdout
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Blank every row and home the cursor
    pub fn clear(&mut self) {
        self.rows = [[' '; LCD_COLUMNS]; LCD_ROWS];
        self.cursor = (0, 0);
    }

    /// Move the cursor; out-of-range positions are rejected
    pub fn set_cursor(&mut self, line: usize, column: usize) -> Result<(), SinkError> {
        if line >= LCD_ROWS || column >= LCD_COLUMNS {
            return Err(SinkError::CursorOutOfBounds {
                line,
                column,
                rows: LCD_ROWS,
                columns: LCD_COLUMNS,
            });
        }
        self.cursor = (line, column);
        Ok(())
    }

    /// Write at the cursor; characters past the row end are dropped
    pub fn put_str(&mut self, text: &str) {
        let (line, mut column) = self.cursor;
        for c in text.chars().filter(|&c| displayable(c)) {
            if column >= LCD_COLUMNS {
                break;
            }
            self.rows[line][column] = c;
            column += 1;
        }
        self.cursor = (line, column.min(LCD_COLUMNS - 1));
    }

    /// Current contents, one string per row
    pub fn frame(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.iter().collect()).collect()
    }

    fn draw(&self) -> Result<(), SinkError> {
        let border = "─".repeat(LCD_COLUMNS);
        let mut out = std::io::stdout().lock();
        writeln!(out, "┌{}┐", border)?;
        for row in self.frame() {
            writeln!(out, "│{}│", row)?;
        }
        writeln!(out, "└{}┘", border)?;
        Ok(())
    }
}

impl TextSink for CharacterLcd {
    /// Each `\n`-separated line goes to its own row
    fn write(&mut self, text: &str) -> Result<(), SinkError> {
        if !self.available {
            return Err(SinkError::Unavailable);
        }
        self.clear();
        for (line, content) in text.split('\n').enumerate() {
            self.set_cursor(line, 0)?;
            self.put_str(content);
        }
        if self.mirror {
            self.draw()?;
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

/// Diagnostic output on stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConsole;

impl TextSink for SerialConsole {
    fn write(&mut self, text: &str) -> Result<(), SinkError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", text)?;
        Ok(())
    }
}
