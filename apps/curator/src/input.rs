//! Line-oriented command language of the terminal front end.

use std::path::PathBuf;

use client_core::{navigation::Direction, Command, Key};
use shared::domain::AccountName;
use thiserror::Error;

pub const HELP: &str = "\
connect HOST          connect to a backend (API on the port base, media one above)
account NAME | -      open an account, or close the current one
new NAME              create an account and open it
delete-account        delete the open account
left right up down    move the selected item (h l k j also work)
esc                   clear the selection or leave the editor
click N               select item N
lock N                move the lock boundary to item N
edit N                open item N in the editor
caption TEXT          set the caption of the edited item
promote K             make gallery member K the cover of the edited item
remove                delete the edited item
close                 leave the editor
gallery on|off        upload several files as one gallery
upload PATH...        upload files
download              download the selected item, or the next one and lock it
dismiss N             dismiss status message N
show                  print the grid
help                  print this help
quit                  save and exit";

#[derive(Debug)]
pub enum Input {
    Command(Command),
    Upload(Vec<PathBuf>),
    Show,
    Help,
    Quit,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("'{command}' needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error("'{value}' is not a valid {what}")]
    Invalid { value: String, what: &'static str },
}

pub fn parse_line(line: &str) -> Result<Input, InputError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(Input::Nothing),
        "show" | "ls" => return Ok(Input::Show),
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" | "q" => return Ok(Input::Quit),
        "upload" => {
            let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
            if paths.is_empty() {
                return Err(InputError::MissingArgument {
                    command: "upload",
                    what: "at least one file",
                });
            }
            return Ok(Input::Upload(paths));
        }
        "connect" => Command::Connect {
            host: required(rest, "connect", "a host")?.to_string(),
        },
        "account" => match required(rest, "account", "a name or '-'")? {
            "-" => Command::SelectAccount(None),
            name => Command::SelectAccount(Some(AccountName::new(name))),
        },
        "new" => Command::CreateAccount(required(rest, "new", "a name")?.to_string()),
        "delete-account" => Command::DeleteAccount,
        "left" | "h" => Command::Key(Key::Arrow(Direction::Left)),
        "right" | "l" => Command::Key(Key::Arrow(Direction::Right)),
        "up" | "k" => Command::Key(Key::Arrow(Direction::Up)),
        "down" | "j" => Command::Key(Key::Arrow(Direction::Down)),
        "esc" | "escape" => Command::Key(Key::Escape),
        "click" => Command::ClickItem(index(rest, "click")?),
        "lock" => Command::ClickLock(index(rest, "lock")?),
        "edit" => Command::BeginEdit(index(rest, "edit")?),
        "caption" => Command::SaveCaption(rest.to_string()),
        "promote" => Command::PromoteGalleryItem(index(rest, "promote")?),
        "remove" => Command::DeleteEditedItem,
        "close" => Command::CloseEditor,
        "gallery" => match rest.to_ascii_lowercase().as_str() {
            "on" => Command::SetGalleryMode(true),
            "off" => Command::SetGalleryMode(false),
            "" => {
                return Err(InputError::MissingArgument {
                    command: "gallery",
                    what: "'on' or 'off'",
                })
            }
            other => {
                return Err(InputError::Invalid {
                    value: other.to_string(),
                    what: "gallery mode",
                })
            }
        },
        "download" => Command::Download,
        "dismiss" => Command::DismissStatus(index(rest, "dismiss")?),
        other => return Err(InputError::Unknown(other.to_string())),
    };
    Ok(Input::Command(command))
}

fn required<'a>(rest: &'a str, command: &'static str, what: &'static str) -> Result<&'a str, InputError> {
    if rest.is_empty() {
        Err(InputError::MissingArgument { command, what })
    } else {
        Ok(rest)
    }
}

fn index(rest: &str, command: &'static str) -> Result<usize, InputError> {
    let raw = required(rest, command, "a number")?;
    raw.parse().map_err(|_| InputError::Invalid {
        value: raw.to_string(),
        what: "number",
    })
}

#[cfg(test)]
#[path = "tests/input_tests.rs"]
mod tests;
