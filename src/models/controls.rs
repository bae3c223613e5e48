use std::fmt;

/// Identifier of a picker control, as used by the host's dialog interface.
///
/// The host only ever refers to controls by id; the widgets themselves live in
/// whichever process presents the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub i16);

impl ControlId {
    pub const LISTBOX_FILTER: ControlId = ControlId(3);

    pub const CHECKBOX_AUTOEXTENSION: ControlId = ControlId(100);
    pub const CHECKBOX_PASSWORD: ControlId = ControlId(101);
    pub const CHECKBOX_FILTEROPTIONS: ControlId = ControlId(102);
    pub const CHECKBOX_READONLY: ControlId = ControlId(103);
    pub const CHECKBOX_LINK: ControlId = ControlId(104);
    pub const CHECKBOX_PREVIEW: ControlId = ControlId(105);
    pub const PUSHBUTTON_PLAY: ControlId = ControlId(106);
    pub const LISTBOX_VERSION: ControlId = ControlId(107);
    pub const LISTBOX_TEMPLATE: ControlId = ControlId(108);
    pub const LISTBOX_IMAGE_TEMPLATE: ControlId = ControlId(109);
    pub const CHECKBOX_SELECTION: ControlId = ControlId(110);

    pub const LISTBOX_VERSION_LABEL: ControlId = ControlId(207);
    pub const LISTBOX_TEMPLATE_LABEL: ControlId = ControlId(208);
    pub const LISTBOX_IMAGE_TEMPLATE_LABEL: ControlId = ControlId(209);
    pub const LISTBOX_FILTER_SELECTOR: ControlId = ControlId(210);

    /// The kind of widget this id stands for, if it is a known custom control
    pub fn kind(self) -> Option<ControlKind> {
        match self {
            ControlId::CHECKBOX_AUTOEXTENSION
            | ControlId::CHECKBOX_PASSWORD
            | ControlId::CHECKBOX_FILTEROPTIONS
            | ControlId::CHECKBOX_READONLY
            | ControlId::CHECKBOX_LINK
            | ControlId::CHECKBOX_PREVIEW
            | ControlId::CHECKBOX_SELECTION => Some(ControlKind::CheckBox),
            ControlId::PUSHBUTTON_PLAY => Some(ControlKind::PushButton),
            ControlId::LISTBOX_VERSION
            | ControlId::LISTBOX_TEMPLATE
            | ControlId::LISTBOX_IMAGE_TEMPLATE
            | ControlId::LISTBOX_FILTER_SELECTOR => Some(ControlKind::ListBox),
            ControlId::LISTBOX_VERSION_LABEL
            | ControlId::LISTBOX_TEMPLATE_LABEL
            | ControlId::LISTBOX_IMAGE_TEMPLATE_LABEL => Some(ControlKind::Label),
            _ => None,
        }
    }

    /// Built-in English label for a custom control
    pub fn default_label(self) -> Option<&'static str> {
        match self {
            ControlId::CHECKBOX_AUTOEXTENSION => Some("~Automatic file name extension"),
            ControlId::CHECKBOX_PASSWORD => Some("Save with pass~word"),
            ControlId::CHECKBOX_FILTEROPTIONS => Some("~Edit filter settings"),
            ControlId::CHECKBOX_READONLY => Some("~Read-only"),
            ControlId::CHECKBOX_LINK => Some("~Link"),
            ControlId::CHECKBOX_PREVIEW => Some("Pr~eview"),
            ControlId::CHECKBOX_SELECTION => Some("~Selection"),
            ControlId::PUSHBUTTON_PLAY => Some("~Play"),
            ControlId::LISTBOX_VERSION => Some("~Version:"),
            ControlId::LISTBOX_TEMPLATE => Some("~Templates:"),
            ControlId::LISTBOX_IMAGE_TEMPLATE => Some("Frame Style:"),
            _ => None,
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    CheckBox,
    PushButton,
    ListBox,
    Label,
}

/// Control action selector passed through with get/set value calls
pub mod control_action {
    pub const SET_SELECT_ITEM: i16 = 0;
    pub const ADD_ITEM: i16 = 1;
    pub const ADD_ITEMS: i16 = 2;
    pub const DELETE_ITEM: i16 = 3;
    pub const DELETE_ITEMS: i16 = 4;
    pub const GET_ITEMS: i16 = 5;
    pub const GET_SELECTED_ITEM: i16 = 6;
    pub const GET_SELECTED_ITEM_INDEX: i16 = 7;
    pub const SET_HELP_URL: i16 = 100;
    pub const GET_HELP_URL: i16 = 101;
}

/// A value handed to `set_value`; only booleans reach the dialog
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Bool(bool),
    Text(String),
    Int(i32),
}

/// An `initialize` argument as supplied by the host
#[derive(Debug, Clone, PartialEq)]
pub enum InitArgument {
    Int8(i8),
    Int16(i16),
    Bool(bool),
    Text(String),
}

/// Outcome of running the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum DialogResult {
    Cancel = 0,
    Ok = 1,
}

impl DialogResult {
    pub fn is_accepted(self) -> bool {
        self == DialogResult::Ok
    }
}
