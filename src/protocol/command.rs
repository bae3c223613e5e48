// Command protocol - the closed set of picker operations and their replies
//
// A command is its opcode followed by its arguments. Each opcode has a fixed
// argument list and a fixed response kind; the reader on either side relies on
// that table alone to know what to decode next.

use super::codec::{WireValue, consume_separator, read_token};
use super::error::ProtocolError;
use std::fmt;
use std::io::{self, BufRead, Write};

/// A single request from the host to the helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetTitle(String),
    SetWinId(u64),
    Execute,
    SetMultiSelectionMode(bool),
    SetDefaultName(String),
    SetDisplayDirectory(String),
    GetDisplayDirectory,
    GetSelectedFiles,
    AppendFilter { title: String, pattern: String },
    SetCurrentFilter(String),
    GetCurrentFilter,
    SetValue { control: i16, action: i16, value: bool },
    GetValue { control: i16, action: i16 },
    EnableControl { control: i16, enable: bool },
    SetLabel { control: i16, label: String },
    GetLabel(i16),
    AddCheckBox { control: i16, hidden: bool, label: String },
    Initialize { save_dialog: bool },
    Quit,
}

/// The shape of the reply a command provokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    None,
    Bool,
    Text,
    TextList,
}

/// A decoded reply from the helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    None,
    Bool(bool),
    Text(String),
    TextList(Vec<String>),
}

impl Command {
    /// Wire opcode of this command
    pub fn opcode(&self) -> u16 {
        match self {
            Command::SetTitle(_) => 0,
            Command::SetWinId(_) => 1,
            Command::Execute => 2,
            Command::SetMultiSelectionMode(_) => 3,
            Command::SetDefaultName(_) => 4,
            Command::SetDisplayDirectory(_) => 5,
            Command::GetDisplayDirectory => 6,
            Command::GetSelectedFiles => 7,
            Command::AppendFilter { .. } => 8,
            Command::SetCurrentFilter(_) => 9,
            Command::GetCurrentFilter => 10,
            Command::SetValue { .. } => 11,
            Command::GetValue { .. } => 12,
            Command::EnableControl { .. } => 13,
            Command::SetLabel { .. } => 14,
            Command::GetLabel(_) => 15,
            Command::AddCheckBox { .. } => 16,
            Command::Initialize { .. } => 17,
            Command::Quit => 18,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::SetTitle(_) => "SetTitle",
            Command::SetWinId(_) => "SetWinId",
            Command::Execute => "Execute",
            Command::SetMultiSelectionMode(_) => "SetMultiSelectionMode",
            Command::SetDefaultName(_) => "SetDefaultName",
            Command::SetDisplayDirectory(_) => "SetDisplayDirectory",
            Command::GetDisplayDirectory => "GetDisplayDirectory",
            Command::GetSelectedFiles => "GetSelectedFiles",
            Command::AppendFilter { .. } => "AppendFilter",
            Command::SetCurrentFilter(_) => "SetCurrentFilter",
            Command::GetCurrentFilter => "GetCurrentFilter",
            Command::SetValue { .. } => "SetValue",
            Command::GetValue { .. } => "GetValue",
            Command::EnableControl { .. } => "EnableControl",
            Command::SetLabel { .. } => "SetLabel",
            Command::GetLabel(_) => "GetLabel",
            Command::AddCheckBox { .. } => "AddCheckBox",
            Command::Initialize { .. } => "Initialize",
            Command::Quit => "Quit",
        }
    }

    /// The reply the helper owes for this command
    pub fn response_kind(&self) -> ResponseKind {
        match self {
            Command::Execute | Command::GetValue { .. } => ResponseKind::Bool,
            Command::GetDisplayDirectory | Command::GetCurrentFilter | Command::GetLabel(_) => {
                ResponseKind::Text
            }
            Command::GetSelectedFiles => ResponseKind::TextList,
            _ => ResponseKind::None,
        }
    }

    /// Write the opcode and arguments. The caller flushes.
    pub fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        self.opcode().encode(writer)?;
        match self {
            Command::SetTitle(text)
            | Command::SetDefaultName(text)
            | Command::SetDisplayDirectory(text)
            | Command::SetCurrentFilter(text) => text.encode(writer),
            Command::SetWinId(handle) => handle.encode(writer),
            Command::SetMultiSelectionMode(flag) => flag.encode(writer),
            Command::AppendFilter { title, pattern } => {
                title.encode(writer)?;
                pattern.encode(writer)
            }
            Command::SetValue {
                control,
                action,
                value,
            } => {
                control.encode(writer)?;
                action.encode(writer)?;
                value.encode(writer)
            }
            Command::GetValue { control, action } => {
                control.encode(writer)?;
                action.encode(writer)
            }
            Command::EnableControl { control, enable } => {
                control.encode(writer)?;
                enable.encode(writer)
            }
            Command::SetLabel { control, label } => {
                control.encode(writer)?;
                label.encode(writer)
            }
            Command::GetLabel(control) => control.encode(writer),
            Command::AddCheckBox {
                control,
                hidden,
                label,
            } => {
                control.encode(writer)?;
                hidden.encode(writer)?;
                label.encode(writer)
            }
            Command::Initialize { save_dialog } => save_dialog.encode(writer),
            Command::Execute
            | Command::GetDisplayDirectory
            | Command::GetSelectedFiles
            | Command::GetCurrentFilter
            | Command::Quit => Ok(()),
        }
    }

    /// Read the next command.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between commands.
    pub fn decode<R: BufRead + ?Sized>(reader: &mut R) -> Result<Option<Self>, ProtocolError> {
        let Some(token) = read_token(reader)? else {
            return Ok(None);
        };
        let opcode: u16 = token
            .parse()
            .map_err(|_| ProtocolError::Desync(format!("expected opcode, found {:?}", token)))?;
        consume_separator(reader)?;

        let command = match opcode {
            0 => Command::SetTitle(String::decode(reader)?),
            1 => Command::SetWinId(u64::decode(reader)?),
            2 => Command::Execute,
            3 => Command::SetMultiSelectionMode(bool::decode(reader)?),
            4 => Command::SetDefaultName(String::decode(reader)?),
            5 => Command::SetDisplayDirectory(String::decode(reader)?),
            6 => Command::GetDisplayDirectory,
            7 => Command::GetSelectedFiles,
            8 => Command::AppendFilter {
                title: String::decode(reader)?,
                pattern: String::decode(reader)?,
            },
            9 => Command::SetCurrentFilter(String::decode(reader)?),
            10 => Command::GetCurrentFilter,
            11 => Command::SetValue {
                control: i16::decode(reader)?,
                action: i16::decode(reader)?,
                value: bool::decode(reader)?,
            },
            12 => Command::GetValue {
                control: i16::decode(reader)?,
                action: i16::decode(reader)?,
            },
            13 => Command::EnableControl {
                control: i16::decode(reader)?,
                enable: bool::decode(reader)?,
            },
            14 => Command::SetLabel {
                control: i16::decode(reader)?,
                label: String::decode(reader)?,
            },
            15 => Command::GetLabel(i16::decode(reader)?),
            16 => Command::AddCheckBox {
                control: i16::decode(reader)?,
                hidden: bool::decode(reader)?,
                label: String::decode(reader)?,
            },
            17 => Command::Initialize {
                save_dialog: bool::decode(reader)?,
            },
            18 => Command::Quit,
            other => {
                return Err(ProtocolError::Desync(format!("unknown opcode {}", other)));
            }
        };

        Ok(Some(command))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Response {
    pub fn kind(&self) -> ResponseKind {
        match self {
            Response::None => ResponseKind::None,
            Response::Bool(_) => ResponseKind::Bool,
            Response::Text(_) => ResponseKind::Text,
            Response::TextList(_) => ResponseKind::TextList,
        }
    }

    pub fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Response::None => Ok(()),
            Response::Bool(value) => value.encode(writer),
            Response::Text(value) => value.encode(writer),
            Response::TextList(values) => values.encode(writer),
        }
    }

    /// Read a reply of the given kind
    pub fn decode_as<R: BufRead + ?Sized>(
        kind: ResponseKind,
        reader: &mut R,
    ) -> Result<Self, ProtocolError> {
        Ok(match kind {
            ResponseKind::None => Response::None,
            ResponseKind::Bool => Response::Bool(bool::decode(reader)?),
            ResponseKind::Text => Response::Text(String::decode(reader)?),
            ResponseKind::TextList => Response::TextList(Vec::<String>::decode(reader)?),
        })
    }

    pub fn into_bool(self) -> Result<bool, ProtocolError> {
        match self {
            Response::Bool(value) => Ok(value),
            other => Err(mismatch(ResponseKind::Bool, &other)),
        }
    }

    pub fn into_text(self) -> Result<String, ProtocolError> {
        match self {
            Response::Text(value) => Ok(value),
            other => Err(mismatch(ResponseKind::Text, &other)),
        }
    }

    pub fn into_text_list(self) -> Result<Vec<String>, ProtocolError> {
        match self {
            Response::TextList(values) => Ok(values),
            other => Err(mismatch(ResponseKind::TextList, &other)),
        }
    }
}

fn mismatch(expected: ResponseKind, got: &Response) -> ProtocolError {
    ProtocolError::Desync(format!(
        "expected {:?} response, got {:?}",
        expected,
        got.kind()
    ))
}
