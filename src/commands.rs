//! This module defines the `Command` enum and its associated methods for parsing
//! user input in the FAT32 navigator.
//!
//! A line is split on whitespace into a command name followed by positional arguments.

/// Represents a user command in the FAT32 navigator.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Open a FAT32 image, encapsulating the file path.
    Open(String),
    /// Close the open image.
    Close,
    /// Print the volume geometry.
    Info,
    /// Print the attributes and starting cluster of an entry.
    Stat(String),
    /// Extract a file into the working directory.
    Get(String),
    /// Print `length` bytes of a file starting at `position`.
    Read {
        name: String,
        position: i64,
        length: i64,
    },
    /// Change the current directory.
    Cd(String),
    /// List the current directory, or its parent with `..`.
    Ls(Option<String>),
    /// Print the volume label.
    Volume,
    /// Quit the program.
    Exit,
    /// Command for an unknown input, encapsulating the command name.
    Unknown(String),
    /// Command for invalid arguments, encapsulating an error message.
    Invalid(String),
    /// Command for an empty input.
    Empty,
}

impl Command {
    /// Parses a line of user input into a `Command`.
    ///
    /// # Returns
    /// - The matching command if the name is known and its arguments are valid
    /// - `Command::Invalid` if a required argument is missing or malformed
    /// - `Command::Unknown` if the input does not match any known command
    /// - `Command::Empty` if the input is empty or contains only whitespace
    pub fn from_string(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        let name = match parts.next() {
            Some(name) => name,
            None => return Command::Empty,
        };

        macro_rules! required {
            ($what:expr) => {
                match parts.next() {
                    Some(arg) => arg.to_string(),
                    None => {
                        return Command::Invalid(format!("Missing arg: '{name}' expects {}.", $what))
                    }
                }
            };
        }

        match name {
            "open" => Command::Open(required!("the path to a FAT32 image")),
            "close" => Command::Close,
            "info" => Command::Info,
            "stat" => Command::Stat(required!("a file or directory name")),
            "get" => Command::Get(required!("a file name")),
            "read" => {
                let file = required!("a file name, a position and a length");
                let position = required!("a position and a length");
                let length = required!("a length");
                match (position.parse::<i64>(), length.parse::<i64>()) {
                    (Ok(position), Ok(length)) => Command::Read {
                        name: file,
                        position,
                        length,
                    },
                    _ => Command::Invalid(String::from(
                        "Arg parsing error: 'read' expects an integer position and length.",
                    )),
                }
            }
            "cd" => Command::Cd(required!("a directory name")),
            "ls" => Command::Ls(parts.next().map(str::to_string)),
            "volume" => Command::Volume,
            "exit" | "quit" => Command::Exit,
            other => Command::Unknown(other.to_string()),
        }
    }
}
