use crate::patients::dto::PatientForm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

/// The add/edit dialog. Closing drops the form, discarding unsaved input.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PatientModal {
    #[default]
    Closed,
    Open { mode: FormMode, form: PatientForm },
}

impl PatientModal {
    pub fn create() -> Self {
        Self::Open {
            mode: FormMode::Create,
            form: PatientForm::default(),
        }
    }

    pub fn edit(form: PatientForm) -> Self {
        Self::Open {
            mode: FormMode::Edit(form.id.clone()),
            form,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Open {
                mode: FormMode::Edit(_),
                ..
            } => "Editar Paciente",
            _ => "Agregar Paciente",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn form(&self) -> Option<&PatientForm> {
        match self {
            Self::Open { form, .. } => Some(form),
            Self::Closed => None,
        }
    }
}

/// Two-step deletion. The name is captured when the dialog opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeleteDialog {
    #[default]
    Closed,
    Confirming { id: String, name: String },
}

impl DeleteDialog {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Confirming { .. })
    }
}
