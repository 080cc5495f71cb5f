//! Menu listing of the blocks a dex file knows about.

use std::io::{self, Write};

/// A node that can be listed in the menu.
pub trait MenuEntry {
    /// Name used to select the entry
    fn name(&self) -> &str;

    /// One-line description
    fn desc(&self) -> &str;

    /// Nested entries, listed beneath this one
    fn children(&self) -> &[Self]
    where
        Self: Sized;
}

/// Write one line per entry, children indented four spaces per level.
pub fn display_menu<W, E>(w: &mut W, entries: &[E], indent: usize) -> io::Result<()>
where
    W: Write + ?Sized,
    E: MenuEntry,
{
    for entry in entries {
        writeln!(w, "{}{:<24}: {}", " ".repeat(indent * 4), entry.name(), entry.desc())?;

        if !entry.children().is_empty() {
            display_menu(w, entry.children(), indent + 1)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry {
        name: &'static str,
        desc: &'static str,
        children: Vec<Entry>,
    }

    impl MenuEntry for Entry {
        fn name(&self) -> &str {
            self.name
        }

        fn desc(&self) -> &str {
            self.desc
        }

        fn children(&self) -> &[Self] {
            &self.children
        }
    }

    #[test]
    fn test_nested_menu() {
        let entries = vec![Entry {
            name: "hello",
            desc: "this is a command description",
            children: vec![
                Entry { name: "start", desc: "start the server", children: vec![] },
                Entry { name: "stop", desc: "stop the server", children: vec![] },
            ],
        }];

        let mut out = Vec::new();
        display_menu(&mut out, &entries, 0).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "hello                   : this is a command description\n    \
             start                   : start the server\n    \
             stop                    : stop the server\n"
        );
    }
}
