/*
 * Created on Mon Sep 27 2021
 *
 * This file is a part of Treebase
 * Treebase (formerly known as ConcurrentDB) is a free and open-source
 * concurrent key/value database written by Sayan Nandan ("the Author") with
 * the vision to provide a heavily concurrent storage core without
 * compromising on correctness or simplicity.
 *
 * Copyright (c) 2021, Sayan Nandan <ohsayan@outlook.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! The wire protocol: one whitespace-tokenized command per line, one
//! response line back

pub mod responses;

/// The most bytes a single token may carry. A longer run of non-whitespace
/// bytes is not an error: the surplus simply begins the next token
pub const MAX_TOKEN: usize = 255;

/// An iterator over the tokens of a command tail
pub struct Tokens<'a> {
    buf: &'a str,
}

impl<'a> Tokens<'a> {
    pub const fn new(buf: &'a str) -> Self {
        Tokens { buf }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;
    fn next(&mut self) -> Option<&'a str> {
        let rest = self.buf.trim_start();
        if rest.is_empty() {
            self.buf = rest;
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let mut cut = end.min(MAX_TOKEN);
        // never cut through the middle of a multibyte character
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (token, tail) = rest.split_at(cut);
        self.buf = tail;
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::{Tokens, MAX_TOKEN};

    #[test]
    fn test_simple_split() {
        let tokens: Vec<&str> = Tokens::new(" apple  red\t").collect();
        assert_eq!(tokens, ["apple", "red"]);
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(Tokens::new("").next(), None);
        assert_eq!(Tokens::new("   \t ").next(), None);
    }

    #[test]
    fn test_long_run_continues_as_next_token() {
        let run = "k".repeat(MAX_TOKEN + 45);
        let line = format!("{} value", run);
        let tokens: Vec<&str> = Tokens::new(&line).collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].len(), MAX_TOKEN);
        assert_eq!(tokens[1].len(), 45);
        assert_eq!(tokens[2], "value");
    }

    #[test]
    fn test_exactly_max_token() {
        let run = "k".repeat(MAX_TOKEN);
        let tokens: Vec<&str> = Tokens::new(&run).collect();
        assert_eq!(tokens, [run.as_str()]);
    }

    #[test]
    fn test_multibyte_runs_cut_on_boundaries() {
        // 2-byte characters: an odd cap would otherwise split one in half
        let run = "é".repeat(200);
        let tokens: Vec<String> = Tokens::new(&run).map(str::to_owned).collect();
        assert_eq!(tokens.concat(), run);
        assert!(tokens[0].len() <= MAX_TOKEN);
    }
}
