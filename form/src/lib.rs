pub mod coerce;
pub mod raw;

use std::sync::Arc;

use dashlink_client::{ActionClient, InvokeError, SchemaRegistry};
use dashlink_core::{ActionRequest, ActionSchema, ArgMap, ClientMessage};
use serde_json::Value;

/// Local, pre-dispatch failure or a wrapped invocation failure. Local
/// kinds never reach the transport.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Action name not present in the registry.
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    /// Required arguments left empty.
    #[error("missing required arguments: {}", .0.join(", "))]
    MissingArgs(Vec<String>),
    /// Request body did not parse.
    #[error("invalid request body: {0}")]
    InvalidBody(#[source] serde_json::Error),
    #[error(transparent)]
    Invoke(#[from] InvokeError),
}

/// Where the form is in its lifecycle, with argument validity folded in
/// once a schema has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Empty,
    NameEntered,
    ArgsValid,
    ArgsInvalid,
    Executing,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Empty,
    NameEntered,
    SchemaResolved,
    Executing,
    Succeeded,
    Failed,
}

/// Validation outcome for the current argument values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid { missing: Vec<String> },
}

/// One editable argument field materialized from the schema.
#[derive(Debug, Clone)]
pub struct ArgField {
    pub name: String,
    pub value: String,
    pub required: bool,
    pub type_hint: Option<String>,
    pub doc: Option<String>,
}

/// Schema-driven editor state for invoking one hub action.
///
/// Drives the usual flow: enter a name (with progressive autocomplete),
/// resolve it against the registry, fill the generated fields, execute.
/// The equivalent raw request text is available at any time, whether or
/// not execution has happened.
pub struct ActionForm {
    name: String,
    schema: Option<Arc<ActionSchema>>,
    fields: Vec<ArgField>,
    extra: Vec<(String, String)>,
    phase: Phase,
    last_output: Option<Value>,
    last_error: Option<String>,
}

impl ActionForm {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            schema: None,
            fields: Vec::new(),
            extra: Vec::new(),
            phase: Phase::Empty,
            last_output: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> FormState {
        match self.phase {
            Phase::Empty => FormState::Empty,
            Phase::NameEntered => FormState::NameEntered,
            Phase::SchemaResolved => match self.validation() {
                Validation::Valid => FormState::ArgsValid,
                Validation::Invalid { .. } => FormState::ArgsInvalid,
            },
            Phase::Executing => FormState::Executing,
            Phase::Succeeded => FormState::Succeeded,
            Phase::Failed => FormState::Failed,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Option<&ActionSchema> {
        self.schema.as_deref()
    }

    pub fn fields(&self) -> &[ArgField] {
        &self.fields
    }

    pub fn extra_args(&self) -> &[(String, String)] {
        &self.extra
    }

    pub fn supports_extra_args(&self) -> bool {
        self.schema
            .as_ref()
            .is_some_and(|schema| schema.supports_extra_args)
    }

    pub fn last_output(&self) -> Option<&Value> {
        self.last_output.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Enter a (possibly partial) action name. Any previously resolved
    /// schema and fields are discarded.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.schema = None;
        self.fields.clear();
        self.extra.clear();
        self.phase = if self.name.is_empty() {
            Phase::Empty
        } else {
            Phase::NameEntered
        };
    }

    /// Progressive autocomplete for the current partial name: namespaces
    /// first, then action names once a known namespace is typed.
    pub fn suggestions(&self, registry: &SchemaRegistry) -> Vec<String> {
        let partial = self.name.as_str();

        if let Some((namespace, _)) = partial.rsplit_once('.') {
            let actions = registry.actions_in(namespace);
            if !actions.is_empty() {
                return actions
                    .iter()
                    .map(|action| action.to_string())
                    .filter(|action| action.starts_with(partial))
                    .collect();
            }
        }

        registry
            .namespaces()
            .into_iter()
            .filter(|namespace| namespace.starts_with(partial))
            .map(|namespace| format!("{namespace}."))
            .collect()
    }

    /// Resolve the entered name against the registry and materialize one
    /// editable field per declared argument, pre-filled with its default.
    pub fn resolve(&mut self, registry: &SchemaRegistry) -> Result<(), FormError> {
        let schema = registry
            .lookup(&self.name)
            .ok_or_else(|| FormError::UnknownAction(self.name.clone()))?;

        self.fields = schema
            .args
            .iter()
            .map(|(name, spec)| ArgField {
                name: name.clone(),
                value: spec.default.as_ref().map(coerce::display).unwrap_or_default(),
                required: spec.required,
                type_hint: spec.type_hint.clone(),
                doc: spec.doc.clone(),
            })
            .collect();
        self.extra.clear();
        self.schema = Some(schema);
        self.phase = Phase::SchemaResolved;
        Ok(())
    }

    /// Set a declared argument's text. Returns false for unknown names.
    pub fn set_arg(&mut self, name: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => {
                field.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Add or update a free-form extra argument.
    pub fn set_extra_arg(&mut self, name: &str, value: &str) {
        match self.extra.iter_mut().find(|(extra, _)| extra == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.extra.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_extra_arg(&mut self, name: &str) {
        self.extra.retain(|(extra, _)| extra != name);
    }

    /// Valid when every required argument has a non-empty value.
    pub fn validation(&self) -> Validation {
        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|field| field.required && field.value.trim().is_empty())
            .map(|field| field.name.clone())
            .collect();

        if missing.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid { missing }
        }
    }

    /// Build the request for the current name and arguments.
    ///
    /// The args map carries exactly the declared fields with non-empty
    /// values, coerced to typed literals, plus any extra arguments, and
    /// nothing else.
    pub fn build_request(&self) -> Result<ActionRequest, FormError> {
        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| FormError::UnknownAction(self.name.clone()))?;

        if let Validation::Invalid { missing } = self.validation() {
            return Err(FormError::MissingArgs(missing));
        }

        let mut args = ArgMap::new();
        for field in &self.fields {
            if field.value.trim().is_empty() {
                continue;
            }
            args.insert(field.name.clone(), coerce::literal(&field.value));
        }
        for (name, value) in &self.extra {
            if name.trim().is_empty() {
                continue;
            }
            args.insert(name.clone(), coerce::literal(value));
        }

        Ok(ActionRequest::new(schema.name.clone(), args))
    }

    /// Equivalent raw request text for copy/paste or external replay,
    /// derived purely from the current name and arguments.
    pub fn request_json(&self) -> Result<String, FormError> {
        let request = self.build_request()?;
        serde_json::to_string_pretty(&ClientMessage::Request(request))
            .map_err(FormError::InvalidBody)
    }

    /// Execute the current form through the client.
    pub async fn execute(&mut self, client: &ActionClient) -> Result<Value, FormError> {
        let request = self.build_request()?;
        self.phase = Phase::Executing;

        match client.send(request).await {
            Ok(output) => {
                self.phase = Phase::Succeeded;
                self.last_output = Some(output.clone());
                self.last_error = None;
                Ok(output)
            }
            Err(error) => {
                self.phase = Phase::Failed;
                let error = FormError::from(error);
                self.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }
}

impl Default for ActionForm {
    fn default() -> Self {
        Self::new()
    }
}
