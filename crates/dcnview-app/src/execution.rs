//! Execution surface and argument form state
//!
//! One surface exists per triggered command. It moves through
//! `CollectingArguments → Calling → Response | Error` and is torn down when
//! hidden.

use std::sync::atomic::{AtomicU64, Ordering};

use dcnview_core::{ArgumentMap, CommandRecord, FieldSpec, Schema, Value, ValueType};

use crate::coordinator::ResponseLine;
use crate::prompt::PromptHandle;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Matches late responses to the surface that asked for them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn next() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Form
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentField {
    pub name: String,
    pub spec: FieldSpec,
    pub text: String,
    /// Disabled optional fields are left out of the call entirely
    pub enabled: bool,
    pub error: Option<String>,
}

impl ArgumentField {
    fn new(name: &str, spec: FieldSpec) -> Self {
        let text = match spec.value_type {
            ValueType::Bool => Value::Bool(false).to_string(),
            _ => String::new(),
        };
        Self {
            name: name.to_string(),
            spec,
            text,
            enabled: !spec.optional,
            error: None,
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.spec.value_type
    }

    fn toggle_bool(&mut self) {
        let current = matches!(Value::parse(ValueType::Bool, &self.text), Ok(Value::Bool(true)));
        self.text = Value::Bool(!current).to_string();
    }
}

/// Typed entry fields for a command's argument schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentForm {
    fields: Vec<ArgumentField>,
    focus: usize,
}

impl ArgumentForm {
    pub fn new(schema: &Schema) -> Self {
        Self {
            fields: schema
                .iter()
                .map(|(name, spec)| ArgumentField::new(name, *spec))
                .collect(),
            focus: 0,
        }
    }

    pub fn fields(&self) -> &[ArgumentField] {
        &self.fields
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Type a character into the focused field.
    ///
    /// Characters the field's type cannot contain are rejected. Space
    /// toggles a boolean. Editing an optional field enables it.
    pub fn input_char(&mut self, c: char) -> bool {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return false;
        };
        if field.value_type() == ValueType::Bool {
            if c != ' ' {
                return false;
            }
            field.toggle_bool();
        } else if field.value_type().accepts_char(c) {
            field.text.push(c);
        } else {
            return false;
        }
        field.enabled = true;
        field.error = None;
        true
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if field.value_type() != ValueType::Bool && field.text.pop().is_some() {
                field.enabled = true;
                field.error = None;
            }
        }
    }

    /// Enable or disable the focused optional field
    pub fn toggle_enabled(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if field.spec.optional {
                field.enabled = !field.enabled;
                field.error = None;
            }
        }
    }

    /// Build the argument map.
    ///
    /// Every enabled field must parse. On failure the offending fields get an
    /// error, focus moves to the first one and `None` is returned.
    pub fn collect(&mut self) -> Option<ArgumentMap> {
        let mut args = ArgumentMap::new();
        let mut first_error = None;

        for (index, field) in self.fields.iter_mut().enumerate() {
            field.error = None;
            if !field.enabled {
                continue;
            }
            match Value::parse(field.value_type(), &field.text) {
                Ok(value) => {
                    args.insert(field.name.clone(), value);
                }
                Err(e) => {
                    field.error = Some(e.to_string());
                    first_error.get_or_insert(index);
                }
            }
        }

        match first_error {
            Some(index) => {
                self.focus = index;
                None
            }
            None => Some(args),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Execution Surface
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionPhase {
    CollectingArguments,
    /// Waiting on the transport
    Calling,
    Response(Vec<ResponseLine>),
    Error(String),
}

#[derive(Debug)]
pub struct ExecutionSurface {
    pub id: SurfaceId,
    pub command: CommandRecord,
    pub form: ArgumentForm,
    pub phase: ExecutionPhase,
    prompt: Option<PromptHandle>,
}

impl ExecutionSurface {
    /// Surface that collects arguments before calling
    pub fn with_prompt(command: CommandRecord, prompt: PromptHandle) -> Self {
        Self {
            id: SurfaceId::next(),
            form: ArgumentForm::new(&command.arguments),
            command,
            phase: ExecutionPhase::CollectingArguments,
            prompt: Some(prompt),
        }
    }

    /// Surface for a command without arguments; the call starts at once
    pub fn calling(command: CommandRecord) -> Self {
        Self {
            id: SurfaceId::next(),
            form: ArgumentForm::default(),
            command,
            phase: ExecutionPhase::Calling,
            prompt: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.command.entity.name
    }

    /// Validate the form and resume the coordinator.
    ///
    /// Returns false and stays in place if a field fails to parse.
    pub fn submit(&mut self) -> bool {
        if self.phase != ExecutionPhase::CollectingArguments {
            return false;
        }
        let Some(args) = self.form.collect() else {
            return false;
        };
        let resumed = self
            .prompt
            .take()
            .is_some_and(|prompt| prompt.submit(args));
        if resumed {
            self.phase = ExecutionPhase::Calling;
        } else {
            self.phase = ExecutionPhase::Error("invocation is no longer waiting".into());
        }
        resumed
    }

    /// Drop the prompt so a suspended coordinator resumes as cancelled
    pub fn cancel_prompt(&mut self) {
        if let Some(prompt) = self.prompt.take() {
            prompt.cancel();
        }
    }

    pub fn is_waiting_for_arguments(&self) -> bool {
        self.prompt.as_ref().is_some_and(PromptHandle::is_waiting)
    }
}
