//! Conway's Game of Life on a bounded grid.
//!
//! A [`Life`] is loaded from a plain-text configuration:
//!
//! ```text
//! 3 3
//! ---
//! ***
//! ---
//! ```
//!
//! The first line holds the number of rows and columns, followed by one line
//! per row where `-` is a dead cell and `*` a live one. Cells beyond the edge
//! of the grid are always dead.

use std::fs;
use std::path::Path;
use thiserror::Error;

pub const ALIVE_SYMBOL: char = '*';
pub const DEAD_SYMBOL: char = '-';

/// Largest grid a configuration may declare
pub const MAX_CELLS: usize = 1 << 20;

const RENDER_ALIVE: &str = " * ";
const RENDER_DEAD: &str = "   ";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the configuration you specified does not exist")]
    NotFound,
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Life {
    rows: usize,
    cols: usize,
    current: Vec<bool>,
    scratch: Vec<bool>,
    generation: u64,
}

impl Life {
    /// Creates a grid of the given size with every cell dead
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            current: vec![false; rows * cols],
            scratch: vec![false; rows * cols],
            generation: 0,
        }
    }

    /// Parses a configuration in the `"ROWS COLS"` + rows format
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut lines = text.lines().map(|line| line.strip_suffix('\r').unwrap_or(line));

        let header = lines
            .next()
            .ok_or_else(|| ConfigError::Invalid("missing dimensions line".to_string()))?;
        let (rows, cols) = parse_dimensions(header)?;

        let mut life = Self::empty(rows, cols);
        let mut row_count = 0;

        for line in lines {
            if row_count == rows {
                if line.trim().is_empty() {
                    continue;
                }
                return Err(ConfigError::Invalid(format!(
                    "expected {} rows, found more",
                    rows
                )));
            }

            let width = line.chars().count();
            if width != cols {
                return Err(ConfigError::Invalid(format!(
                    "row {} has {} cells, expected {}",
                    row_count + 1,
                    width,
                    cols
                )));
            }

            for (col, symbol) in line.chars().enumerate() {
                let alive = match symbol {
                    ALIVE_SYMBOL => true,
                    DEAD_SYMBOL => false,
                    other => {
                        return Err(ConfigError::Invalid(format!(
                            "unexpected symbol {:?} in row {}",
                            other,
                            row_count + 1
                        )))
                    }
                };
                life.current[row_count * cols + col] = alive;
            }
            row_count += 1;
        }

        if row_count != rows {
            return Err(ConfigError::Invalid(format!(
                "expected {} rows, found {}",
                rows, row_count
            )));
        }

        Ok(life)
    }

    /// Loads the configuration called `name` from `dir`
    ///
    /// Names that would resolve outside `dir` are treated as missing.
    pub fn load(dir: &Path, name: &str) -> Result<Self, ConfigError> {
        if !is_plain_name(name) {
            return Err(ConfigError::NotFound);
        }

        let text = fs::read_to_string(dir.join(name)).map_err(|_| ConfigError::NotFound)?;
        Self::parse(&text)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of generations computed since the grid was loaded
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.current[row * self.cols + col]
    }

    pub fn set_alive(&mut self, row: usize, col: usize, alive: bool) {
        if row < self.rows && col < self.cols {
            self.current[row * self.cols + col] = alive;
        }
    }

    pub fn population(&self) -> usize {
        self.current.iter().filter(|alive| **alive).count()
    }

    fn live_neighbours(&self, row: usize, col: usize) -> u8 {
        let mut count = 0;
        for dr in [-1isize, 0, 1] {
            for dc in [-1isize, 0, 1] {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let r = row as isize + dr;
                let c = col as isize + dc;
                if r < 0 || c < 0 {
                    continue;
                }
                if self.is_alive(r as usize, c as usize) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Computes the next generation in place
    pub fn step(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let neighbours = self.live_neighbours(row, col);
                let alive = self.current[row * self.cols + col];
                self.scratch[row * self.cols + col] =
                    matches!((alive, neighbours), (true, 2) | (_, 3));
            }
        }
        std::mem::swap(&mut self.current, &mut self.scratch);
        self.generation += 1;
    }

    /// Renders the grid as text, one line per row
    pub fn render(&self) -> String {
        let mut board = String::with_capacity(self.rows * (self.cols * RENDER_ALIVE.len() + 1));
        for row in self.current.chunks(self.cols.max(1)).take(self.rows) {
            for alive in row {
                board.push_str(if *alive { RENDER_ALIVE } else { RENDER_DEAD });
            }
            board.push('\n');
        }
        board
    }
}

fn parse_dimensions(header: &str) -> Result<(usize, usize), ConfigError> {
    let mut parts = header.split_whitespace();
    let mut next_dimension = |label: &str| -> Result<usize, ConfigError> {
        let value = parts
            .next()
            .ok_or_else(|| ConfigError::Invalid(format!("missing {}", label)))?;
        match value.parse::<usize>() {
            Ok(0) | Err(_) => Err(ConfigError::Invalid(format!(
                "{} must be a positive integer, got {:?}",
                label, value
            ))),
            Ok(n) => Ok(n),
        }
    };

    let rows = next_dimension("row count")?;
    let cols = next_dimension("column count")?;
    if parts.next().is_some() {
        return Err(ConfigError::Invalid(
            "dimensions line has extra fields".to_string(),
        ));
    }

    match rows.checked_mul(cols) {
        Some(cells) if cells <= MAX_CELLS => Ok((rows, cols)),
        _ => Err(ConfigError::Invalid(format!(
            "grid of {} by {} exceeds {} cells",
            rows, cols, MAX_CELLS
        ))),
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !Path::new(name).is_absolute()
}
