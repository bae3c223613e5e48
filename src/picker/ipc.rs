use super::template::{TemplateId, setup_commands};
use super::{FilePicker, FilePickerListener, ListenerSlot, PickerError};
use crate::models::{ControlId, ControlValue, DialogResult, InitArgument, PickerConfig};
use crate::protocol::{Command, Response, ResponseKind};
use crate::services::supervisor::{HelperProcess, discover_helper};
use crate::ui::{HostWindow, SyncCallBridge, UiLock, WindowBlock};
use std::sync::Arc;
use std::time::Duration;

/// A picker whose dialog runs in the helper process.
///
/// Each call is one command on the helper's stdin, followed by a read of its
/// reply (if the command has one) through the [`SyncCallBridge`]. A failed
/// exchange breaks the session; from then on every call fails with
/// [`PickerError::SessionClosed`] and `execute` reports `Cancel`.
pub struct IpcFilePicker {
    process: HelperProcess,
    bridge: SyncCallBridge,
    parent: Option<Arc<dyn HostWindow>>,
    ui_lock: UiLock,
    block_parent_window: bool,
    listener: ListenerSlot,
}

impl IpcFilePicker {
    /// Find the helper, start it, and connect to it
    pub fn launch(
        config: &PickerConfig,
        bridge: SyncCallBridge,
        ui_lock: UiLock,
    ) -> Result<Self, PickerError> {
        let program = discover_helper(&config.helper.name, config.helper.path.as_deref())?;

        let mut args = vec![
            "--backend".to_string(),
            config.dialog_backend.as_arg().to_string(),
        ];
        if config.debug_mode {
            args.push("--debug".to_string());
        }
        args.extend(config.helper.args.iter().cloned());

        let process = HelperProcess::spawn(
            &program,
            &args,
            Duration::from_millis(config.quit_grace_ms),
            bridge.metrics().clone(),
        )?;

        Ok(Self::with_process(
            process,
            bridge,
            ui_lock,
            config.block_parent_window,
        ))
    }

    /// Wrap an already running helper
    pub fn with_process(
        process: HelperProcess,
        bridge: SyncCallBridge,
        ui_lock: UiLock,
        block_parent_window: bool,
    ) -> Self {
        Self {
            process,
            bridge,
            parent: None,
            ui_lock,
            block_parent_window,
            listener: ListenerSlot::default(),
        }
    }

    pub fn process(&self) -> &HelperProcess {
        &self.process
    }

    /// Send a command that has no reply
    fn send(&mut self, command: Command) -> Result<(), PickerError> {
        debug_assert_eq!(command.response_kind(), ResponseKind::None);
        self.process.send(&command)
    }

    /// Send a command and wait for its reply, pumping the host meanwhile
    fn request(&mut self, command: Command) -> Result<Response, PickerError> {
        let kind = command.response_kind();
        self.process.send(&command)?;

        let reader = self.process.take_reader()?;
        match self
            .bridge
            .call(reader, move |r| Response::decode_as(kind, r))
        {
            Ok((reader, response)) => {
                self.process.restore_reader(reader);
                tracing::trace!("<- {} reply {:?}", command, response.kind());
                Ok(response)
            }
            Err(err) => {
                tracing::error!("No valid reply to {}: {}", command, err);
                self.process.fail(&err);
                Err(err.into())
            }
        }
    }

    fn run_dialog(&mut self, handle: Option<u64>) -> Result<bool, PickerError> {
        if let Some(handle) = handle {
            self.send(Command::SetWinId(handle))?;
        }
        Ok(self.request(Command::Execute)?.into_bool()?)
    }
}

impl FilePicker for IpcFilePicker {
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

        let outcome = self.run_dialog(handle);
        drop(block);

        let metrics = self.bridge.metrics();
        match outcome {
            Ok(accepted) => {
                metrics.record_dialog(accepted);
                tracing::info!("Picker dialog {}", if accepted { "accepted" } else { "cancelled" });
                if accepted {
                    self.listener.selection_changed();
                    DialogResult::Ok
                } else {
                    DialogResult::Cancel
                }
            }
            Err(e) => {
                metrics.record_dialog(false);
                tracing::warn!("Picker dialog failed, treating as cancelled: {}", e);
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
        Ok(self.request(Command::GetDisplayDirectory)?.into_text()?)
    }

    fn selected_files(&mut self) -> Result<Vec<String>, PickerError> {
        Ok(self.request(Command::GetSelectedFiles)?.into_text_list()?)
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
        Ok(self.request(Command::GetCurrentFilter)?.into_text()?)
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
        // The dialog applies extensions itself; the host must never add one
        if control == ControlId::CHECKBOX_AUTOEXTENSION {
            return Ok(false);
        }
        Ok(self
            .request(Command::GetValue {
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
        Ok(self.request(Command::GetLabel(control.0))?.into_text()?)
    }

    fn initialize(&mut self, args: &[InitArgument]) -> Result<(), PickerError> {
        let template = TemplateId::from_arguments(args)?;
        tracing::debug!("Initializing picker with template {:?}", template);

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
        "fpicker.IpcFilePicker"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::picker::listener::MockFilePickerListener;
    use crate::services::supervisor::ProcessState;
    use crate::ui::host::MockHostWindow;
    use crate::ui::{NoopPump, new_ui_lock};
    use mockall::Sequence;
    use mockall::predicate::eq;
    use std::sync::atomic::Ordering;

    /// Picker connected to a shell script standing in for the helper
    fn scripted_picker(rt: &tokio::runtime::Runtime, script: &str) -> IpcFilePicker {
        let metrics = Arc::new(Metrics::new());
        let sh = discover_helper("sh", None).unwrap();
        let process = HelperProcess::spawn(
            &sh,
            &["-c".to_string(), script.to_string()],
            Duration::from_millis(100),
            metrics.clone(),
        )
        .unwrap();
        let bridge = SyncCallBridge::new(
            rt.handle().clone(),
            Box::new(NoopPump),
            Duration::from_millis(1),
            metrics,
        );
        IpcFilePicker::with_process(process, bridge, new_ui_lock(), true)
    }

    fn blocking_window(handle: Option<u64>) -> MockHostWindow {
        let mut seq = Sequence::new();
        let mut window = MockHostWindow::new();
        window.expect_native_handle().return_const(handle);
        window
            .expect_set_input_enabled()
            .with(eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        window
            .expect_set_close_blocked()
            .with(eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        window
            .expect_set_input_enabled()
            .with(eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        window
            .expect_set_close_blocked()
            .with(eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        window
    }

    #[test]
    fn test_execute_accepted_blocks_and_restores_parent() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut picker = scripted_picker(&rt, "printf '1 '; exec cat >/dev/null");
        picker.set_parent_window(Some(Arc::new(blocking_window(Some(42)))));

        assert_eq!(picker.execute(), DialogResult::Ok);
        // SetWinId and Execute
        assert_eq!(picker.bridge.metrics().commands_sent.load(Ordering::Relaxed), 2);
        assert_eq!(picker.bridge.metrics().dialogs_accepted.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_crashed_helper_is_cancel_and_parent_restored() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut picker = scripted_picker(&rt, "exit 0");
        picker.set_parent_window(Some(Arc::new(blocking_window(None))));

        assert_eq!(picker.execute(), DialogResult::Cancel);
        assert!(matches!(
            picker.set_title("again"),
            Err(PickerError::SessionClosed)
        ));
    }

    #[test]
    fn test_listener_sees_filter_and_accepted_selection() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        // First dialog accepted, second cancelled
        let mut picker = scripted_picker(&rt, "printf '1 0 '; exec cat >/dev/null");

        let mut listener = MockFilePickerListener::new();
        listener
            .expect_control_state_changed()
            .with(eq(ControlId::LISTBOX_FILTER))
            .times(1)
            .return_const(());
        listener.expect_file_selection_changed().times(1).return_const(());
        picker.add_listener(Arc::new(listener));

        picker.set_current_filter("Text").unwrap();
        assert_eq!(picker.execute(), DialogResult::Ok);
        assert_eq!(picker.execute(), DialogResult::Cancel);

        // Nothing reaches a removed listener
        picker.remove_listener();
        picker.set_current_filter("All").unwrap();
    }

    #[test]
    fn test_failed_calls_do_not_notify_listener() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut picker = scripted_picker(&rt, "exit 0");

        let mut listener = MockFilePickerListener::new();
        listener.expect_control_state_changed().never();
        listener.expect_file_selection_changed().never();
        picker.add_listener(Arc::new(listener));

        assert_eq!(picker.execute(), DialogResult::Cancel);
        assert!(matches!(
            picker.set_current_filter("Text"),
            Err(PickerError::SessionClosed)
        ));
    }

    #[test]
    fn test_desync_terminates_helper() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut picker = scripted_picker(&rt, "printf 'x '; exec cat >/dev/null");

        assert_eq!(picker.execute(), DialogResult::Cancel);
        assert_eq!(picker.process().state(), ProcessState::Exited);
        assert_eq!(picker.bridge.metrics().desyncs.load(Ordering::Relaxed), 1);
        assert!(matches!(
            picker.display_directory(),
            Err(PickerError::SessionClosed)
        ));
    }

    #[test]
    fn test_auto_extension_value_has_no_wire_traffic() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut picker = scripted_picker(&rt, "exit 0");

        let value = picker
            .value(ControlId::CHECKBOX_AUTOEXTENSION, 0)
            .unwrap();
        assert!(!value);
        assert_eq!(picker.bridge.metrics().commands_sent.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_text_reply_is_returned() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut picker = scripted_picker(
            &rt,
            "printf '15 file:///tmp/doc 2 9 file:///a 9 file:///b '; exec cat >/dev/null",
        );

        assert_eq!(picker.display_directory().unwrap(), "file:///tmp/doc");
        assert_eq!(picker.files().unwrap(), vec!["file:///a".to_string()]);
    }

    #[test]
    fn test_non_boolean_values_are_not_sent() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut picker = scripted_picker(&rt, "exec cat >/dev/null");

        picker
            .set_value(
                ControlId::CHECKBOX_PASSWORD,
                0,
                &ControlValue::Text("yes".to_string()),
            )
            .unwrap();
        assert_eq!(picker.bridge.metrics().commands_sent.load(Ordering::Relaxed), 0);

        picker
            .set_value(ControlId::CHECKBOX_PASSWORD, 0, &ControlValue::Bool(true))
            .unwrap();
        assert_eq!(picker.bridge.metrics().commands_sent.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_initialize_rejects_bad_arguments_without_sending() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut picker = scripted_picker(&rt, "exec cat >/dev/null");

        assert!(matches!(
            picker.initialize(&[]),
            Err(PickerError::InvalidArgument(_))
        ));
        assert!(matches!(
            picker.initialize(&[InitArgument::Bool(true)]),
            Err(PickerError::InvalidArgument(_))
        ));
        assert_eq!(picker.bridge.metrics().commands_sent.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_service_metadata() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let picker = scripted_picker(&rt, "exec cat >/dev/null");
        assert!(picker.supports_service("fpicker.FilePicker"));
        assert!(!picker.supports_service("fpicker.FolderPicker"));
        assert_eq!(picker.implementation_name(), "fpicker.IpcFilePicker");
    }
}
