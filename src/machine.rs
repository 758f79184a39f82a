//! Eight-symbol tape language and the machine that runs it.
//!
//! The machine carries four tapes (code, data, input, output) and three
//! cursors. Code and input extend themselves with random content whenever a
//! cursor reaches the known end, so every symbol sequence -- including the
//! empty one -- can always take another step. Execution is driven one
//! instruction at a time through `step()`, which lets the caller bound total
//! work externally; the machine itself never imposes a limit.
//!
//! Note: some accessors are kept for API completeness even if only tests
//! currently call them.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One unit of the program alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `>` move the data cursor right; growing the data tape on overflow
    Right,
    /// `<` move the data cursor left; stops at the tape origin
    Left,
    /// `-` decrement the current cell, saturating at 0
    Dec,
    /// `+` increment the current cell, saturating at 255
    Inc,
    /// `[` skip past the matching `]` when the current cell is 0
    Jump,
    /// `]` return to the matching `[` when the current cell is not 0
    Back,
    /// `.` append the current cell to the output tape
    Out,
    /// `,` copy the next input byte into the current cell
    In,
    /// `E` end of program
    End,
}

/// The eight instruction symbols, i.e. the alphabet without `End`.
///
/// This is the pool the genetic operators draw from, and the pool the code
/// tape grows from while a forward bracket scan is pending.
pub const INSTRUCTIONS: [Symbol; 8] = [
    Symbol::Right,
    Symbol::Left,
    Symbol::Dec,
    Symbol::Inc,
    Symbol::Jump,
    Symbol::Back,
    Symbol::Out,
    Symbol::In,
];

/// The full nine-symbol alphabet used for ordinary code-tape growth.
pub const ALPHABET: [Symbol; 9] = [
    Symbol::Right,
    Symbol::Left,
    Symbol::Dec,
    Symbol::Inc,
    Symbol::Jump,
    Symbol::Back,
    Symbol::Out,
    Symbol::In,
    Symbol::End,
];

impl Symbol {
    /// One-character text form, used for record files and display.
    pub fn to_char(self) -> char {
        match self {
            Symbol::Right => '>',
            Symbol::Left => '<',
            Symbol::Dec => '-',
            Symbol::Inc => '+',
            Symbol::Jump => '[',
            Symbol::Back => ']',
            Symbol::Out => '.',
            Symbol::In => ',',
            Symbol::End => 'E',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Symbol::Right),
            '<' => Some(Symbol::Left),
            '-' => Some(Symbol::Dec),
            '+' => Some(Symbol::Inc),
            '[' => Some(Symbol::Jump),
            ']' => Some(Symbol::Back),
            '.' => Some(Symbol::Out),
            ',' => Some(Symbol::In),
            'E' => Some(Symbol::End),
            _ => None,
        }
    }
}

/// Render a program in its one-character-per-symbol text form.
pub fn program_text(program: &[Symbol]) -> String {
    program.iter().map(|s| s.to_char()).collect()
}

/// Parse the text form back into a program. `None` on unknown characters.
pub fn parse_program(text: &str) -> Option<Vec<Symbol>> {
    text.chars().map(Symbol::from_char).collect()
}

/// The tape machine.
///
/// Tapes are public so callers (and tests) can seed or inspect them; the
/// cursors stay private because the machine's invariants live there: the
/// data cursor never leaves `0..data.len()`, the input cursor never rewinds,
/// and the code cursor always has a symbol under it after the growth phase
/// of a step.
pub struct Machine {
    pub code: Vec<Symbol>,
    pub data: Vec<u8>,
    pub input: Vec<u8>,
    pub output: Vec<u8>,
    code_pos: usize,
    data_pos: usize,
    input_pos: usize,
    /// Depth of an unfinished forward bracket scan; 0 when no scan is
    /// pending. Survives across steps unchanged until the scan completes.
    seek_depth: u32,
    rng: StdRng,
}

impl Machine {
    /// Build a machine over `code` and `input`; `seed` drives all future
    /// self-extension of the tapes, so a run is reproducible from it.
    pub fn new(code: Vec<Symbol>, input: Vec<u8>, seed: u64) -> Self {
        Self {
            code,
            data: vec![0],
            input,
            output: Vec::new(),
            code_pos: 0,
            data_pos: 0,
            input_pos: 0,
            seek_depth: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Execute one instruction. Returns false once the cursor rests on the
    /// end-of-program symbol; the machine makes no progress after that.
    pub fn step(&mut self) -> bool {
        // Growth phase: when the code cursor sits on the last known symbol
        // (or the tape is empty), append one random symbol so there is
        // always something ahead of the cursor. Same for exhausted input.
        if self.code_pos + 1 >= self.code.len() {
            self.extend_code();
        }
        if self.input_pos == self.input.len() {
            self.extend_input();
        }

        match self.code[self.code_pos] {
            Symbol::End => return false,
            _ if self.seek_depth > 0 => {
                let depth = self.seek_depth;
                self.seek_forward(depth);
            }
            Symbol::Right => {
                self.data_pos += 1;
                if self.data_pos == self.data.len() {
                    self.data.push(0);
                }
                self.code_pos += 1;
            }
            Symbol::Left => {
                if self.data_pos > 0 {
                    self.data_pos -= 1;
                }
                self.code_pos += 1;
            }
            Symbol::Inc => {
                self.data[self.data_pos] = self.data[self.data_pos].saturating_add(1);
                self.code_pos += 1;
            }
            Symbol::Dec => {
                self.data[self.data_pos] = self.data[self.data_pos].saturating_sub(1);
                self.code_pos += 1;
            }
            Symbol::Out => {
                self.output.push(self.data[self.data_pos]);
                self.code_pos += 1;
            }
            Symbol::In => {
                // The growth phase above makes exhaustion unreachable; if it
                // ever happened the cursor would stay put and the next step
                // would retry after growing the input tape.
                if self.input_pos < self.input.len() {
                    self.data[self.data_pos] = self.input[self.input_pos];
                    self.input_pos += 1;
                    self.code_pos += 1;
                }
            }
            Symbol::Jump => {
                if self.data[self.data_pos] == 0 {
                    self.seek_forward(1);
                } else {
                    self.code_pos += 1;
                }
            }
            Symbol::Back => {
                self.jump_back();
                self.code_pos += 1;
            }
        }
        true
    }

    /// Whether a forward bracket scan is still looking for its match.
    pub fn is_seeking(&self) -> bool {
        self.seek_depth > 0
    }

    pub fn code_pos(&self) -> usize {
        self.code_pos
    }

    pub fn data_pos(&self) -> usize {
        self.data_pos
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    /// Advance a forward bracket scan as far as the known code allows.
    ///
    /// On a match the cursor lands just past the matching `]`. Otherwise the
    /// cursor stays on the last examined symbol and the remaining depth is
    /// kept pending, so the next step grows the tape by one symbol and
    /// continues the same scan -- never a restart.
    fn seek_forward(&mut self, mut depth: u32) {
        while self.code_pos + 1 < self.code.len() {
            self.code_pos += 1;
            match self.code[self.code_pos] {
                Symbol::Jump => depth += 1,
                Symbol::Back => {
                    depth -= 1;
                    if depth == 0 {
                        self.seek_depth = 0;
                        self.code_pos += 1;
                        return;
                    }
                }
                _ => {}
            }
        }
        self.seek_depth = depth;
    }

    /// Backward bracket scan for `]` on a non-zero cell.
    ///
    /// Lands on the matching `[` when one exists. The code tape has a fixed
    /// origin, so a scan that reaches position 0 without a match is absorbed
    /// as satisfied; either way the caller advances past the landing point.
    fn jump_back(&mut self) {
        if self.data[self.data_pos] == 0 {
            return;
        }
        let mut depth = 1u32;
        while depth > 0 && self.code_pos > 0 {
            self.code_pos -= 1;
            match self.code[self.code_pos] {
                Symbol::Back => depth += 1,
                Symbol::Jump => depth -= 1,
                _ => {}
            }
        }
    }

    fn extend_code(&mut self) {
        // While a forward scan is pending the halt symbol is excluded from
        // the draw, so an unmatched `[` keeps looking instead of landing on
        // an ambiguous end-of-program.
        let pool: &[Symbol] = if self.seek_depth > 0 {
            &INSTRUCTIONS
        } else {
            &ALPHABET
        };
        let symbol = pool[self.rng.random_range(0..pool.len())];
        self.code.push(symbol);
    }

    fn extend_input(&mut self) {
        let byte: u8 = self.rng.random();
        self.input.push(byte);
    }
}
