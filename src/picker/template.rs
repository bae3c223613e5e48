//! Dialog templates and the custom controls each one brings along.

use super::PickerError;
use crate::models::{ControlId, ControlKind, InitArgument};
use crate::protocol::Command;

/// Dialog variant selected by the host when initializing a picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum TemplateId {
    FileOpenSimple = 0,
    FileSaveSimple = 1,
    FileSaveAutoExtensionPassword = 2,
    FileSaveAutoExtensionPasswordFilterOptions = 3,
    FileSaveAutoExtensionSelection = 4,
    FileSaveAutoExtensionTemplate = 5,
    FileOpenLinkPreviewImageTemplate = 6,
    FileOpenPlay = 7,
    FileOpenReadOnlyVersion = 8,
    FileOpenLinkPreview = 9,
    FileSaveAutoExtension = 10,
}

impl TemplateId {
    pub fn from_raw(raw: i16) -> Option<Self> {
        Some(match raw {
            0 => TemplateId::FileOpenSimple,
            1 => TemplateId::FileSaveSimple,
            2 => TemplateId::FileSaveAutoExtensionPassword,
            3 => TemplateId::FileSaveAutoExtensionPasswordFilterOptions,
            4 => TemplateId::FileSaveAutoExtensionSelection,
            5 => TemplateId::FileSaveAutoExtensionTemplate,
            6 => TemplateId::FileOpenLinkPreviewImageTemplate,
            7 => TemplateId::FileOpenPlay,
            8 => TemplateId::FileOpenReadOnlyVersion,
            9 => TemplateId::FileOpenLinkPreview,
            10 => TemplateId::FileSaveAutoExtension,
            _ => return None,
        })
    }

    /// Read the template from `initialize` arguments.
    ///
    /// Only the first argument matters and it must be a small integer.
    pub fn from_arguments(args: &[InitArgument]) -> Result<Self, PickerError> {
        let raw = match args.first() {
            None => return Err(PickerError::InvalidArgument("no arguments".to_string())),
            Some(InitArgument::Int16(value)) => *value,
            Some(InitArgument::Int8(value)) => i16::from(*value),
            Some(_) => {
                return Err(PickerError::InvalidArgument(
                    "invalid argument type".to_string(),
                ));
            }
        };

        Self::from_raw(raw).ok_or_else(|| {
            tracing::warn!("Unknown picker template {}", raw);
            PickerError::InvalidArgument(format!("unknown template {}", raw))
        })
    }

    pub fn is_save_dialog(self) -> bool {
        matches!(
            self,
            TemplateId::FileSaveSimple
                | TemplateId::FileSaveAutoExtension
                | TemplateId::FileSaveAutoExtensionPassword
                | TemplateId::FileSaveAutoExtensionPasswordFilterOptions
                | TemplateId::FileSaveAutoExtensionSelection
                | TemplateId::FileSaveAutoExtensionTemplate
        )
    }

    /// Custom controls the template asks for, in layout order
    pub fn custom_controls(self) -> &'static [ControlId] {
        match self {
            TemplateId::FileOpenSimple | TemplateId::FileSaveSimple => &[],
            TemplateId::FileSaveAutoExtension => &[ControlId::CHECKBOX_AUTOEXTENSION],
            TemplateId::FileSaveAutoExtensionPassword => &[ControlId::CHECKBOX_PASSWORD],
            TemplateId::FileSaveAutoExtensionPasswordFilterOptions => &[
                ControlId::CHECKBOX_AUTOEXTENSION,
                ControlId::CHECKBOX_PASSWORD,
                ControlId::CHECKBOX_FILTEROPTIONS,
            ],
            TemplateId::FileSaveAutoExtensionSelection => &[
                ControlId::CHECKBOX_AUTOEXTENSION,
                ControlId::CHECKBOX_SELECTION,
            ],
            TemplateId::FileSaveAutoExtensionTemplate => &[
                ControlId::CHECKBOX_AUTOEXTENSION,
                ControlId::LISTBOX_TEMPLATE,
            ],
            TemplateId::FileOpenLinkPreviewImageTemplate => &[
                ControlId::CHECKBOX_LINK,
                ControlId::CHECKBOX_PREVIEW,
                ControlId::LISTBOX_IMAGE_TEMPLATE,
            ],
            TemplateId::FileOpenPlay => &[ControlId::PUSHBUTTON_PLAY],
            TemplateId::FileOpenReadOnlyVersion => {
                &[ControlId::CHECKBOX_READONLY, ControlId::LISTBOX_VERSION]
            }
            TemplateId::FileOpenLinkPreview => {
                &[ControlId::CHECKBOX_LINK, ControlId::CHECKBOX_PREVIEW]
            }
        }
    }

    /// Dialog title for the template's mode
    pub fn title(self) -> &'static str {
        if self.is_save_dialog() { "Save" } else { "Open" }
    }
}

/// A checkbox to create in the dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckBoxSpec {
    pub control: ControlId,
    pub hidden: bool,
    pub label: String,
}

/// The checkbox to create for `control`, if it is one.
///
/// Only checkboxes are realised in the dialog. The auto-extension box is still
/// created so ids stay consistent, but hidden: the dialog applies extensions
/// on its own.
pub fn check_box_for(control: ControlId) -> Option<CheckBoxSpec> {
    if control.kind() != Some(ControlKind::CheckBox) {
        tracing::debug!("Custom control {} is not realised by the picker", control);
        return None;
    }
    Some(CheckBoxSpec {
        control,
        hidden: control == ControlId::CHECKBOX_AUTOEXTENSION,
        label: control.default_label().unwrap_or_default().to_string(),
    })
}

/// Commands that build the dialog for `template`, in the order they must run:
/// custom controls, then the title, then the switch into open or save mode.
pub fn setup_commands(template: TemplateId) -> Vec<Command> {
    let mut commands: Vec<Command> = template
        .custom_controls()
        .iter()
        .filter_map(|control| check_box_for(*control))
        .map(|check_box| Command::AddCheckBox {
            control: check_box.control.0,
            hidden: check_box.hidden,
            label: check_box.label,
        })
        .collect();
    commands.push(Command::SetTitle(template.title().to_string()));
    commands.push(Command::Initialize {
        save_dialog: template.is_save_dialog(),
    });
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_arguments_rejected() {
        let err = TemplateId::from_arguments(&[]).unwrap_err();
        assert!(matches!(err, PickerError::InvalidArgument(msg) if msg == "no arguments"));
    }

    #[test]
    fn test_wrong_argument_type_rejected() {
        let err = TemplateId::from_arguments(&[InitArgument::Text("1".to_string())]).unwrap_err();
        assert!(matches!(err, PickerError::InvalidArgument(msg) if msg == "invalid argument type"));
    }

    #[test]
    fn test_unknown_template_rejected() {
        let err = TemplateId::from_arguments(&[InitArgument::Int16(13)]).unwrap_err();
        assert!(matches!(err, PickerError::InvalidArgument(_)));
    }

    #[test]
    fn test_int8_template_accepted() {
        let template = TemplateId::from_arguments(&[InitArgument::Int8(10)]).unwrap();
        assert_eq!(template, TemplateId::FileSaveAutoExtension);
        assert!(template.is_save_dialog());
        assert_eq!(template.title(), "Save");
    }

    #[test]
    fn test_auto_extension_template_has_one_control() {
        assert_eq!(
            TemplateId::FileSaveAutoExtension.custom_controls(),
            &[ControlId::CHECKBOX_AUTOEXTENSION]
        );
    }

    #[test]
    fn test_auto_extension_checkbox_is_hidden() {
        let spec = check_box_for(ControlId::CHECKBOX_AUTOEXTENSION).unwrap();
        assert!(spec.hidden);
        assert_eq!(spec.label, "~Automatic file name extension");

        let spec = check_box_for(ControlId::CHECKBOX_PASSWORD).unwrap();
        assert!(!spec.hidden);
    }

    #[test]
    fn test_list_boxes_are_not_realised() {
        assert!(check_box_for(ControlId::LISTBOX_VERSION).is_none());
        assert!(check_box_for(ControlId::PUSHBUTTON_PLAY).is_none());
    }

    #[test]
    fn test_setup_commands_for_auto_extension_save() {
        let commands = setup_commands(TemplateId::FileSaveAutoExtension);
        assert_eq!(
            commands,
            vec![
                Command::AddCheckBox {
                    control: 100,
                    hidden: true,
                    label: "~Automatic file name extension".to_string(),
                },
                Command::SetTitle("Save".to_string()),
                Command::Initialize { save_dialog: true },
            ]
        );
    }

    #[test]
    fn test_setup_commands_skip_list_boxes() {
        let commands = setup_commands(TemplateId::FileOpenReadOnlyVersion);
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], Command::AddCheckBox { control: 103, .. }));
    }

    #[test]
    fn test_open_templates() {
        assert!(!TemplateId::FileOpenReadOnlyVersion.is_save_dialog());
        assert_eq!(TemplateId::FileOpenSimple.title(), "Open");
    }
}
