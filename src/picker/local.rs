use super::template::{TemplateId, setup_commands};
use super::{FilePicker, FilePickerListener, ListenerSlot, PickerError};
use crate::helper::{DialogBackend, dispatch};
use crate::models::{ControlId, ControlValue, DialogResult, InitArgument};
use crate::protocol::{Command, Response};
use crate::ui::{HostWindow, SyncCallBridge, UiLock, WindowBlock};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

/// Work run on the dialog thread
type Job = Box<dyn FnOnce(&mut dyn DialogBackend) + Send>;

/// A picker whose dialog runs on a dedicated thread of this process.
///
/// The dialog thread owns the backend. Each call is sent to it as a job and
/// the caller waits for the reply through the [`SyncCallBridge`], so the host
/// event pump keeps running exactly as with the out-of-process picker.
pub struct LocalFilePicker {
    jobs: Option<mpsc::UnboundedSender<Job>>,
    thread: Option<JoinHandle<()>>,
    bridge: SyncCallBridge,
    parent: Option<Arc<dyn HostWindow>>,
    ui_lock: UiLock,
    block_parent_window: bool,
    listener: ListenerSlot,
}

impl LocalFilePicker {
    /// Start the dialog thread with `backend`
    pub fn spawn(
        backend: Box<dyn DialogBackend + Send>,
        bridge: SyncCallBridge,
        ui_lock: UiLock,
    ) -> Result<Self, PickerError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let thread = std::thread::Builder::new()
            .name("fpicker-dialog".to_string())
            .spawn(move || {
                let mut backend = backend;
                while let Some(job) = rx.blocking_recv() {
                    job(backend.as_mut());
                }
                tracing::debug!("Dialog thread finished");
            })
            .map_err(|source| PickerError::Startup {
                program: "fpicker-dialog thread".to_string(),
                source,
            })?;

        Ok(Self {
            jobs: Some(tx),
            thread: Some(thread),
            bridge,
            parent: None,
            ui_lock,
            block_parent_window: true,
            listener: ListenerSlot::default(),
        })
    }

    pub fn set_block_parent_window(&mut self, block: bool) {
        self.block_parent_window = block;
    }

    /// Run `work` on the dialog thread and wait for its result
    fn call<T, F>(&self, work: F) -> Result<T, PickerError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn DialogBackend) -> T + Send + 'static,
    {
        let jobs = self.jobs.as_ref().ok_or(PickerError::SessionClosed)?;
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |backend| {
            let _ = tx.send(work(backend));
        });
        jobs.send(job).map_err(|_| {
            tracing::warn!("Dialog thread is gone");
            PickerError::SessionClosed
        })?;

        Ok(self.bridge.wait_on(rx)?)
    }

    fn run(&self, command: Command) -> Result<Response, PickerError> {
        self.bridge.metrics().record_command_sent();
        let response = self.call(move |backend| dispatch(backend, command))?;
        Ok(response)
    }

    fn send(&self, command: Command) -> Result<(), PickerError> {
        self.run(command).map(|_| ())
    }
}

impl FilePicker for LocalFilePicker {
    fn set_title(&mut self, title: &str) -> Result<(), PickerError> {
        self.send(Command::SetTitle(title.to_string()))
    }

    fn execute(&mut self) -> DialogResult {
        let parent = if self.block_parent_window {
            self.parent.clone()
        } else {
            None
        };
        let handle = parent.as_ref().and_then(|window| window.native_handle());
        let block = parent.map(|window| WindowBlock::engage(window, self.ui_lock.clone()));

        let outcome = handle
            .map_or(Ok(()), |handle| self.send(Command::SetWinId(handle)))
            .and_then(|_| Ok(self.run(Command::Execute)?.into_bool()?));
        drop(block);

        let metrics = self.bridge.metrics();
        match outcome {
            Ok(accepted) => {
                metrics.record_dialog(accepted);
                if accepted {
                    self.listener.selection_changed();
                    DialogResult::Ok
                } else {
                    DialogResult::Cancel
                }
            }
            Err(e) => {
                metrics.record_dialog(false);
                tracing::warn!("Dialog failed, treating as cancelled: {}", e);
                DialogResult::Cancel
            }
        }
    }

    fn set_multi_selection_mode(&mut self, enabled: bool) -> Result<(), PickerError> {
        self.send(Command::SetMultiSelectionMode(enabled))
    }

    fn set_default_name(&mut self, name: &str) -> Result<(), PickerError> {
        self.send(Command::SetDefaultName(name.to_string()))
    }

    fn set_display_directory(&mut self, url: &str) -> Result<(), PickerError> {
        self.send(Command::SetDisplayDirectory(url.to_string()))
    }

    fn display_directory(&mut self) -> Result<String, PickerError> {
        Ok(self.run(Command::GetDisplayDirectory)?.into_text()?)
    }

    fn selected_files(&mut self) -> Result<Vec<String>, PickerError> {
        Ok(self.run(Command::GetSelectedFiles)?.into_text_list()?)
    }

    fn append_filter(&mut self, title: &str, pattern: &str) -> Result<(), PickerError> {
        self.send(Command::AppendFilter {
            title: title.to_string(),
            pattern: pattern.to_string(),
        })
    }

    fn set_current_filter(&mut self, title: &str) -> Result<(), PickerError> {
        self.send(Command::SetCurrentFilter(title.to_string()))?;
        self.listener.filter_changed();
        Ok(())
    }

    fn current_filter(&mut self) -> Result<String, PickerError> {
        Ok(self.run(Command::GetCurrentFilter)?.into_text()?)
    }

    fn set_value(
        &mut self,
        control: ControlId,
        action: i16,
        value: &ControlValue,
    ) -> Result<(), PickerError> {
        match value {
            ControlValue::Bool(value) => self.send(Command::SetValue {
                control: control.0,
                action,
                value: *value,
            }),
            other => {
                tracing::debug!("Ignoring non-boolean value {:?} for control {}", other, control);
                Ok(())
            }
        }
    }

    fn value(&mut self, control: ControlId, action: i16) -> Result<bool, PickerError> {
        if control == ControlId::CHECKBOX_AUTOEXTENSION {
            return Ok(false);
        }
        Ok(self
            .run(Command::GetValue {
                control: control.0,
                action,
            })?
            .into_bool()?)
    }

    fn enable_control(&mut self, control: ControlId, enable: bool) -> Result<(), PickerError> {
        self.send(Command::EnableControl {
            control: control.0,
            enable,
        })
    }

    fn set_label(&mut self, control: ControlId, label: &str) -> Result<(), PickerError> {
        self.send(Command::SetLabel {
            control: control.0,
            label: label.to_string(),
        })
    }

    fn label(&mut self, control: ControlId) -> Result<String, PickerError> {
        Ok(self.run(Command::GetLabel(control.0))?.into_text()?)
    }

    fn initialize(&mut self, args: &[InitArgument]) -> Result<(), PickerError> {
        let template = TemplateId::from_arguments(args)?;
        tracing::debug!("Initializing in-process picker with template {:?}", template);

        for command in setup_commands(template) {
            self.send(command)?;
        }
        Ok(())
    }

    fn add_listener(&mut self, listener: Arc<dyn FilePickerListener>) {
        self.listener.set(listener);
    }

    fn remove_listener(&mut self) {
        self.listener.clear();
    }

    fn set_parent_window(&mut self, window: Option<Arc<dyn HostWindow>>) {
        self.parent = window;
    }

    fn implementation_name(&self) -> &'static str {
        "fpicker.LocalFilePicker"
    }
}

impl Drop for LocalFilePicker {
    fn drop(&mut self) {
        // Closing the channel ends the dialog thread's loop
        self.jobs = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Dialog thread panicked");
            }
        }
    }
}
