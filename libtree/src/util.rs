/*
 * Created on Wed Sep 15 2021
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

pub mod terminal {
    //! Status lines the server paints onto its own terminal, next to the
    //! operator's prompt. Colors are only emitted when stdout is one
    use std::fmt::Display;
    use std::io::{self, Write};
    use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

    fn paint(item: &dyn Display, color: Color) -> io::Result<()> {
        let mut stdout = StandardStream::stdout(ColorChoice::Auto);
        stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(stdout, "{}", item)?;
        stdout.reset()?;
        stdout.flush()
    }

    /// An informational banner line, like the goodbye on shutdown
    pub fn write_info(item: impl Display) -> io::Result<()> {
        paint(&item, Color::Cyan)
    }
}
