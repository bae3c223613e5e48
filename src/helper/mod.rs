//! Helper-side command server.
//!
//! The `fpicker-helper` binary reads [`Command`]s from its stdin, applies each
//! to a [`DialogBackend`], and writes exactly the reply the command declares
//! to its stdout. Nothing else may ever be written to stdout.

pub mod headless;
pub mod model;
pub mod native;

pub use headless::HeadlessBackend;
pub use model::{CustomControl, DialogModel, Filter};
pub use native::NativeBackend;

use crate::protocol::{Command, ProtocolError, Response};
use std::io::{BufRead, Write};

/// A dialog implementation: the model the host configures, and a way to run it
pub trait DialogBackend {
    fn model(&self) -> &DialogModel;

    fn model_mut(&mut self) -> &mut DialogModel;

    /// Show the dialog and block until the user is done.
    ///
    /// Returns true when accepted. The selection is left in the model.
    fn run_modal(&mut self) -> bool;
}

impl<B: DialogBackend + ?Sized> DialogBackend for Box<B> {
    fn model(&self) -> &DialogModel {
        (**self).model()
    }

    fn model_mut(&mut self) -> &mut DialogModel {
        (**self).model_mut()
    }

    fn run_modal(&mut self) -> bool {
        (**self).run_modal()
    }
}

/// Why the command loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeExit {
    /// The host sent Quit
    Quit,
    /// The host closed the pipe between commands
    Disconnected,
}

/// Apply one command to the backend and produce its reply
pub fn dispatch<B: DialogBackend + ?Sized>(backend: &mut B, command: Command) -> Response {
    if command == Command::Execute {
        return Response::Bool(backend.run_modal());
    }

    let model = backend.model_mut();
    match command {
        Command::SetTitle(title) => model.title = title,
        Command::SetWinId(handle) => model.parent_window = Some(handle),
        Command::SetMultiSelectionMode(enabled) => model.multi_selection = enabled,
        Command::SetDefaultName(name) => model.default_name = name,
        Command::SetDisplayDirectory(url) => model.display_directory = url,
        Command::GetDisplayDirectory => return Response::Text(model.display_directory.clone()),
        Command::GetSelectedFiles => return Response::TextList(model.selected_files.clone()),
        Command::AppendFilter { title, pattern } => model.append_filter(&title, &pattern),
        Command::SetCurrentFilter(title) => model.set_current_filter(&title),
        Command::GetCurrentFilter => return Response::Text(model.current_filter()),
        Command::SetValue {
            control,
            action,
            value,
        } => model.set_value(control, action, value),
        Command::GetValue { control, action } => {
            return Response::Bool(model.value(control, action));
        }
        Command::EnableControl { control, enable } => model.enable_control(control, enable),
        Command::SetLabel { control, label } => model.set_label(control, &label),
        Command::GetLabel(control) => return Response::Text(model.label(control)),
        Command::AddCheckBox {
            control,
            hidden,
            label,
        } => model.add_check_box(control, hidden, &label),
        Command::Initialize { save_dialog } => model.initialize(save_dialog),
        Command::Execute | Command::Quit => {}
    }
    Response::None
}

/// Serve commands until Quit or until the host goes away.
///
/// Every reply is flushed before the next command is read. When `journal` is
/// given, each command's name is appended to it on its own line.
pub fn serve<R, W, B>(
    reader: &mut R,
    writer: &mut W,
    backend: &mut B,
    mut journal: Option<&mut dyn Write>,
) -> Result<ServeExit, ProtocolError>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
    B: DialogBackend + ?Sized,
{
    loop {
        let Some(command) = Command::decode(reader)? else {
            tracing::info!("Host closed the command pipe");
            return Ok(ServeExit::Disconnected);
        };
        tracing::debug!("<- {}", command);

        if let Some(journal) = journal.as_mut() {
            if let Err(e) = writeln!(journal, "{}", command.name()).and_then(|_| journal.flush()) {
                tracing::warn!("Failed to write command journal: {}", e);
            }
        }

        if command == Command::Quit {
            tracing::info!("Quit received");
            return Ok(ServeExit::Quit);
        }

        let expected = command.response_kind();
        let response = dispatch(backend, command);
        debug_assert_eq!(response.kind(), expected);

        response.encode(writer)?;
        writer.flush()?;
    }
}
