//! Lexical analysis for command lines and search-path strings.
//!
//! Splitting is purely whitespace based: there is no quoting, escaping or
//! expansion. A token boundary occurs whenever scanning moves from a non-delimiter
//! character to a delimiter or to the end of input, so runs of delimiters collapse
//! and no empty tokens are produced.

use std::fmt;
use std::ops::Index;

/// An ordered, owned sequence of tokens produced from one line.
///
/// The sequence exclusively owns each of its strings. The only in-place mutation
/// is [`Tokens::replace_first`], used by path resolution to swap the command name
/// for its qualified path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    items: Vec<String>,
}

impl Tokens {
    /// Creates a sequence from already split tokens.
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the token at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    /// The command name, if the line had any token at all.
    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    /// Installs `replacement` as the first token and hands back the old one.
    ///
    /// Returns `None` and leaves the sequence untouched when it is empty.
    pub fn replace_first(&mut self, replacement: String) -> Option<String> {
        let slot = self.items.first_mut()?;
        Some(std::mem::replace(slot, replacement))
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

impl Index<usize> for Tokens {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.items[index]
    }
}

impl fmt::Display for Tokens {
    /// Echoes the tokens one per line as `<index>: <token>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.items.iter().enumerate() {
            writeln!(f, "{}: {}", i, token)?;
        }
        Ok(())
    }
}

/// Splits `input` into maximal runs of characters for which `is_delim` is false.
fn split_on(input: &str, is_delim: impl Fn(char) -> bool) -> Tokens {
    let mut items = Vec::new();
    let mut start = None;

    for (pos, ch) in input.char_indices() {
        match (start, is_delim(ch)) {
            (None, false) => start = Some(pos),
            (Some(begin), true) => {
                items.push(input[begin..pos].to_owned());
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        items.push(input[begin..].to_owned());
    }

    Tokens::new(items)
}

/// Tokenizes one command line on whitespace.
///
/// An empty or all-whitespace line yields an empty sequence.
pub fn tokenize(line: &str) -> Tokens {
    split_on(line, char::is_whitespace)
}

/// Tokenizes a search-path configuration string into directory names.
///
/// Both `:` and whitespace separate entries, so `"/bin:/usr/bin"` and
/// `"/bin /usr/bin"` produce the same list.
pub fn tokenize_path(paths: &str) -> Tokens {
    split_on(paths, |c| c == ':' || c.is_whitespace())
}
