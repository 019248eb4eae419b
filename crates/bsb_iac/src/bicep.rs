//! Structured Bicep document model.
//!
//! Generators build documents out of typed declarations and only turn them
//! into text in [`GeneratedDocument::render`]. Tests and callers can inspect
//! the structure (which parameters exist, what a resource body binds) without
//! matching on rendered substrings.

use std::fmt;

use serde_json::{json, Map, Value};

use bsb_core::{TargetScope, DEPLOYMENT_PARAMETERS_SCHEMA};

const INDENT: &str = "  ";

/// Primitive Bicep parameter and output types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BicepType {
    String,
    Int,
    Bool,
    Array,
    Object,
}

impl BicepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BicepType::String => "string",
            BicepType::Int => "int",
            BicepType::Bool => "bool",
            BicepType::Array => "array",
            BicepType::Object => "object",
        }
    }

    /// Map a JSON Schema `type` keyword to a Bicep type. Anything unknown,
    /// including a missing keyword, is a string.
    pub fn from_json_schema(schema: &Value) -> Self {
        match schema.get("type").and_then(Value::as_str) {
            Some("integer") | Some("number") => BicepType::Int,
            Some("boolean") => BicepType::Bool,
            Some("array") => BicepType::Array,
            Some("object") => BicepType::Object,
            _ => BicepType::String,
        }
    }
}

impl fmt::Display for BicepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A Bicep expression.
#[derive(Debug, Clone, PartialEq)]
pub enum BicepValue {
    /// A literal string. `${` is escaped so it never interpolates.
    Str(String),
    /// A string literal whose `${...}` segments interpolate.
    Interp(String),
    /// Raw expression text such as `resourceGroup().location` or `vnet.id`.
    Expr(String),
    Bool(bool),
    Int(i64),
    Null,
    Array(Vec<BicepValue>),
    Object(Body),
    Call {
        function: String,
        args: Vec<BicepValue>,
    },
    For {
        binding: String,
        source: String,
        body: Box<BicepValue>,
    },
    Conditional {
        condition: String,
        then: Box<BicepValue>,
        otherwise: Box<BicepValue>,
    },
}

impl BicepValue {
    pub fn str(value: impl Into<String>) -> Self {
        BicepValue::Str(value.into())
    }

    pub fn interp(value: impl Into<String>) -> Self {
        BicepValue::Interp(value.into())
    }

    pub fn expr(value: impl Into<String>) -> Self {
        BicepValue::Expr(value.into())
    }

    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BicepValue::Array(values.into_iter().map(|v| BicepValue::Str(v.into())).collect())
    }

    pub fn call(function: impl Into<String>, args: Vec<BicepValue>) -> Self {
        BicepValue::Call {
            function: function.into(),
            args,
        }
    }

    pub fn for_each(binding: impl Into<String>, source: impl Into<String>, body: BicepValue) -> Self {
        BicepValue::For {
            binding: binding.into(),
            source: source.into(),
            body: Box::new(body),
        }
    }

    pub fn conditional(condition: impl Into<String>, then: BicepValue, otherwise: BicepValue) -> Self {
        BicepValue::Conditional {
            condition: condition.into(),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Convert a JSON value into a Bicep literal.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => BicepValue::Null,
            Value::Bool(b) => BicepValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BicepValue::Int(i),
                None => BicepValue::Expr(n.to_string()),
            },
            Value::String(s) => BicepValue::Str(s.clone()),
            Value::Array(items) => BicepValue::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => {
                let mut body = Body::new();
                for (key, value) in map {
                    body = body.prop(key.clone(), Self::from_json(value));
                }
                BicepValue::Object(body)
            }
        }
    }

    /// The JSON form of a literal value; `None` when the value depends on
    /// an expression only known at deployment time.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            BicepValue::Str(s) => Some(Value::String(s.clone())),
            BicepValue::Interp(s) if !s.contains("${") => Some(Value::String(s.clone())),
            BicepValue::Bool(b) => Some(Value::Bool(*b)),
            BicepValue::Int(i) => Some(json!(i)),
            BicepValue::Null => Some(Value::Null),
            BicepValue::Array(items) => items
                .iter()
                .map(BicepValue::to_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            BicepValue::Object(body) => {
                let mut map = Map::new();
                for (key, value) in body.properties() {
                    map.insert(key.to_string(), value.to_json()?);
                }
                Some(Value::Object(map))
            }
            _ => None,
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(
            self,
            BicepValue::Str(_)
                | BicepValue::Interp(_)
                | BicepValue::Expr(_)
                | BicepValue::Bool(_)
                | BicepValue::Int(_)
                | BicepValue::Null
        )
    }

    fn render(&self, depth: usize, out: &mut String) {
        match self {
            BicepValue::Str(s) => {
                out.push('\'');
                out.push_str(&escape(s).replace("${", "\\${"));
                out.push('\'');
            }
            BicepValue::Interp(s) => {
                out.push('\'');
                out.push_str(&escape(s));
                out.push('\'');
            }
            BicepValue::Expr(e) => out.push_str(e),
            BicepValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            BicepValue::Int(i) => out.push_str(&i.to_string()),
            BicepValue::Null => out.push_str("null"),
            BicepValue::Array(items) => render_array(items, depth, out),
            BicepValue::Object(body) => body.render(depth, out),
            BicepValue::Call { function, args } => {
                out.push_str(function);
                out.push('(');
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    arg.render(depth, out);
                }
                out.push(')');
            }
            BicepValue::For { binding, source, body } => {
                out.push_str(&format!("[for {} in {}: ", binding, source));
                body.render(depth, out);
                out.push(']');
            }
            BicepValue::Conditional {
                condition,
                then,
                otherwise,
            } => {
                out.push_str(condition);
                out.push_str(" ? ");
                then.render(depth, out);
                out.push_str(" : ");
                otherwise.render(depth, out);
            }
        }
    }

    /// Render as standalone text at the top indentation level.
    pub fn to_bicep(&self) -> String {
        let mut out = String::new();
        self.render(0, &mut out);
        out
    }
}

impl From<bool> for BicepValue {
    fn from(value: bool) -> Self {
        BicepValue::Bool(value)
    }
}

impl From<i64> for BicepValue {
    fn from(value: i64) -> Self {
        BicepValue::Int(value)
    }
}

impl From<Body> for BicepValue {
    fn from(body: Body) -> Self {
        BicepValue::Object(body)
    }
}

fn render_array(items: &[BicepValue], depth: usize, out: &mut String) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    if items.iter().all(BicepValue::is_scalar) {
        out.push('[');
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            item.render(depth, out);
        }
        out.push(']');
        return;
    }

    out.push_str("[\n");
    for item in items {
        push_indent(depth + 1, out);
        item.render(depth + 1, out);
        out.push('\n');
    }
    push_indent(depth, out);
    out.push(']');
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One line of an object body.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Property { key: String, value: BicepValue },
    Comment(String),
}

/// Ordered entries of a Bicep object: resource bodies, module bodies and
/// object literals alike.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body(Vec<Entry>);

impl Body {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<BicepValue>) -> Self {
        self.0.push(Entry::Property {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Add a property only when `condition` holds.
    pub fn prop_if(self, condition: bool, key: impl Into<String>, value: impl Into<BicepValue>) -> Self {
        if condition {
            self.prop(key, value)
        } else {
            self
        }
    }

    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.0.push(Entry::Comment(text.into()));
        self
    }

    pub fn push(&mut self, entry: Entry) {
        self.0.push(entry);
    }

    pub fn get(&self, key: &str) -> Option<&BicepValue> {
        self.properties().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &BicepValue)> {
        self.0.iter().filter_map(|entry| match entry {
            Entry::Property { key, value } => Some((key.as_str(), value)),
            Entry::Comment(_) => None,
        })
    }

    pub fn keys(&self) -> Vec<&str> {
        self.properties().map(|(k, _)| k).collect()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn render(&self, depth: usize, out: &mut String) {
        if self.0.is_empty() {
            out.push_str("{}");
            return;
        }
        out.push_str("{\n");
        for entry in &self.0 {
            push_indent(depth + 1, out);
            match entry {
                Entry::Property { key, value } => {
                    if is_identifier(key) {
                        out.push_str(key);
                    } else {
                        out.push('\'');
                        out.push_str(&escape(key));
                        out.push('\'');
                    }
                    out.push_str(": ");
                    value.render(depth + 1, out);
                }
                Entry::Comment(text) => {
                    out.push_str("// ");
                    out.push_str(text);
                }
            }
            out.push('\n');
        }
        push_indent(depth, out);
        out.push('}');
    }
}

/// Parameter decorators, rendered in the order they were added.
#[derive(Debug, Clone, PartialEq)]
pub enum Decorator {
    Description(String),
    MinLength(u64),
    MaxLength(u64),
    MinValue(i64),
    MaxValue(i64),
    Allowed(Vec<BicepValue>),
    Secure,
    /// A comment line among the decorators.
    Note(String),
}

impl Decorator {
    fn render(&self) -> String {
        match self {
            Decorator::Description(text) => {
                format!("@description({})", BicepValue::str(text.clone()).to_bicep())
            }
            Decorator::MinLength(n) => format!("@minLength({})", n),
            Decorator::MaxLength(n) => format!("@maxLength({})", n),
            Decorator::MinValue(n) => format!("@minValue({})", n),
            Decorator::MaxValue(n) => format!("@maxValue({})", n),
            Decorator::Allowed(values) => {
                format!("@allowed({})", BicepValue::Array(values.clone()).to_bicep())
            }
            Decorator::Secure => "@secure()".to_string(),
            Decorator::Note(text) => format!("// {}", text),
        }
    }
}

/// A `param` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: BicepType,
    pub decorators: Vec<Decorator>,
    pub default: Option<BicepValue>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: BicepType) -> Self {
        Self {
            name: name.into(),
            ty,
            decorators: Vec::new(),
            default: None,
        }
    }

    pub fn describe(self, text: impl Into<String>) -> Self {
        self.decorate(Decorator::Description(text.into()))
    }

    pub fn decorate(mut self, decorator: Decorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn allowed<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decorate(Decorator::Allowed(
            values.into_iter().map(|v| BicepValue::Str(v.into())).collect(),
        ))
    }

    pub fn secure(self) -> Self {
        self.decorate(Decorator::Secure)
    }

    pub fn default_value(mut self, value: impl Into<BicepValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn is_secure(&self) -> bool {
        self.decorators.contains(&Decorator::Secure)
    }

    pub fn description(&self) -> Option<&str> {
        self.decorators.iter().find_map(|d| match d {
            Decorator::Description(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn allowed_values(&self) -> Option<&[BicepValue]> {
        self.decorators.iter().find_map(|d| match d {
            Decorator::Allowed(values) => Some(values.as_slice()),
            _ => None,
        })
    }

    fn render(&self, out: &mut String) {
        for decorator in &self.decorators {
            out.push_str(&decorator.render());
            out.push('\n');
        }
        out.push_str(&format!("param {} {}", self.name, self.ty));
        if let Some(default) = &self.default {
            out.push_str(" = ");
            default.render(0, out);
        }
        out.push('\n');
    }
}

/// A `var` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: BicepValue,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<BicepValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    fn render(&self, out: &mut String) {
        out.push_str(&format!("var {} = ", self.name));
        self.value.render(0, out);
        out.push('\n');
    }
}

/// A `resource` declaration, either new or `existing`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDecl {
    pub symbol: String,
    pub resource_type: String,
    pub api_version: String,
    pub existing: bool,
    pub comment: Option<String>,
    pub body: Body,
}

impl ResourceDecl {
    pub fn new(symbol: impl Into<String>, resource_type: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            resource_type: resource_type.into(),
            api_version: api_version.into(),
            existing: false,
            comment: None,
            body: Body::new(),
        }
    }

    pub fn existing(mut self) -> Self {
        self.existing = true;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// `Type@apiVersion` reference string.
    pub fn type_reference(&self) -> String {
        format!("{}@{}", self.resource_type, self.api_version)
    }

    fn render(&self, out: &mut String) {
        if let Some(comment) = &self.comment {
            out.push_str(&format!("// {}\n", comment));
        }
        out.push_str(&format!("resource {} '{}'", self.symbol, self.type_reference()));
        if self.existing {
            out.push_str(" existing");
        }
        out.push_str(" = ");
        self.body.render(0, out);
        out.push('\n');
    }
}

/// A `module` declaration referencing another Bicep file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDecl {
    pub symbol: String,
    pub path: String,
    pub body: Body,
}

impl ModuleDecl {
    pub fn new(symbol: impl Into<String>, path: impl Into<String>, body: Body) -> Self {
        Self {
            symbol: symbol.into(),
            path: path.into(),
            body,
        }
    }

    fn render(&self, out: &mut String) {
        out.push_str(&format!("module {} '{}' = ", self.symbol, self.path));
        self.body.render(0, out);
        out.push('\n');
    }
}

/// Anything placed in the resources section.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Resource(ResourceDecl),
    Module(ModuleDecl),
}

impl Declaration {
    pub fn symbol(&self) -> &str {
        match self {
            Declaration::Resource(r) => &r.symbol,
            Declaration::Module(m) => &m.symbol,
        }
    }

    pub fn body(&self) -> &Body {
        match self {
            Declaration::Resource(r) => &r.body,
            Declaration::Module(m) => &m.body,
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Declaration::Resource(r) => r.render(out),
            Declaration::Module(m) => m.render(out),
        }
    }
}

/// An `output` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub name: String,
    pub ty: BicepType,
    pub value: BicepValue,
    pub description: Option<String>,
}

impl Output {
    pub fn new(name: impl Into<String>, ty: BicepType, value: impl Into<BicepValue>) -> Self {
        Self {
            name: name.into(),
            ty,
            value: value.into(),
            description: None,
        }
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    fn render(&self, out: &mut String) {
        if let Some(description) = &self.description {
            out.push_str(&Decorator::Description(description.clone()).render());
            out.push('\n');
        }
        out.push_str(&format!("output {} {} = ", self.name, self.ty));
        self.value.render(0, out);
        out.push('\n');
    }
}

/// The named sections of a generated document, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Parameters,
    Variables,
    Resources,
    Outputs,
}

impl SectionKind {
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Parameters => "PARAMETERS",
            SectionKind::Variables => "VARIABLES",
            SectionKind::Resources => "RESOURCES",
            SectionKind::Outputs => "OUTPUTS",
        }
    }
}

/// One rendered section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub text: String,
}

/// A complete Bicep document. Built once through [`DocumentBuilder`] and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDocument {
    header: Vec<String>,
    target_scope: TargetScope,
    metadata: Vec<(String, String)>,
    notes_title: Option<String>,
    notes: Vec<String>,
    parameters: Vec<Param>,
    variables: Vec<Variable>,
    declarations: Vec<Declaration>,
    outputs: Vec<Output>,
}

impl GeneratedDocument {
    pub fn builder(target_scope: TargetScope) -> DocumentBuilder {
        DocumentBuilder {
            doc: GeneratedDocument {
                header: Vec::new(),
                target_scope,
                metadata: Vec::new(),
                notes_title: None,
                notes: Vec::new(),
                parameters: Vec::new(),
                variables: Vec::new(),
                declarations: Vec::new(),
                outputs: Vec::new(),
            },
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn target_scope(&self) -> TargetScope {
        self.target_scope
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn parameters(&self) -> &[Param] {
        &self.parameters
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.param(name).is_some()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Resource(r) => Some(r),
            Declaration::Module(_) => None,
        })
    }

    pub fn resource(&self, symbol: &str) -> Option<&ResourceDecl> {
        self.resources().find(|r| r.symbol == symbol)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Module(m) => Some(m),
            Declaration::Resource(_) => None,
        })
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// Non-empty sections in document order.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();

        if !self.parameters.is_empty() {
            let mut text = String::new();
            for param in &self.parameters {
                param.render(&mut text);
                text.push('\n');
            }
            sections.push(section(SectionKind::Parameters, text));
        }

        if !self.variables.is_empty() {
            let mut text = String::new();
            for variable in &self.variables {
                let mut rendered = String::new();
                variable.render(&mut rendered);
                let multiline = rendered.trim_end().contains('\n');
                text.push_str(&rendered);
                if multiline {
                    text.push('\n');
                }
            }
            sections.push(section(SectionKind::Variables, text));
        }

        if !self.declarations.is_empty() {
            let mut text = String::new();
            for declaration in &self.declarations {
                declaration.render(&mut text);
                text.push('\n');
            }
            sections.push(section(SectionKind::Resources, text));
        }

        if !self.outputs.is_empty() {
            let mut text = String::new();
            for output in &self.outputs {
                output.render(&mut text);
                text.push('\n');
            }
            sections.push(section(SectionKind::Outputs, text));
        }

        sections
    }

    /// Render the complete document text.
    pub fn render(&self) -> String {
        let mut out = String::new();

        for line in &self.header {
            out.push_str(&format!("// {}\n", line));
        }
        if !self.header.is_empty() {
            out.push('\n');
        }

        out.push_str(&format!("targetScope = '{}'\n\n", self.target_scope));

        if !self.metadata.is_empty() {
            for (key, value) in &self.metadata {
                out.push_str(&format!("metadata {} = {}\n", key, BicepValue::str(value.clone()).to_bicep()));
            }
            out.push('\n');
        }

        if !self.notes.is_empty() {
            if let Some(title) = &self.notes_title {
                out.push_str(&format!("// {}\n", title));
            }
            for note in &self.notes {
                out.push_str(&format!("// {}\n", note));
            }
            out.push('\n');
        }

        for section in self.sections() {
            out.push_str(&format!("// === {} ===\n\n", section.kind.title()));
            out.push_str(&section.text);
        }

        let mut text = out.trim_end().to_string();
        text.push('\n');
        text
    }

    /// Companion deployment parameters document listing every parameter
    /// with a literal default value.
    pub fn parameters_file(&self) -> Value {
        let mut parameters = Map::new();
        for param in &self.parameters {
            if let Some(value) = param.default.as_ref().and_then(BicepValue::to_json) {
                parameters.insert(param.name.clone(), json!({ "value": value }));
            }
        }

        json!({
            "$schema": DEPLOYMENT_PARAMETERS_SCHEMA,
            "contentVersion": "1.0.0.0",
            "parameters": Value::Object(parameters),
        })
    }
}

fn section(kind: SectionKind, text: String) -> Section {
    Section { kind, text }
}

/// Builder for [`GeneratedDocument`].
#[derive(Debug)]
pub struct DocumentBuilder {
    doc: GeneratedDocument,
}

impl DocumentBuilder {
    pub fn header_line(mut self, line: impl Into<String>) -> Self {
        self.doc.header.push(line.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.doc.metadata.push((key.into(), value.into()));
        self
    }

    /// Comment block rendered ahead of the sections.
    pub fn notes(mut self, title: impl Into<String>, notes: Vec<String>) -> Self {
        self.doc.notes_title = Some(title.into());
        self.doc.notes = notes;
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.doc.parameters.push(param);
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.doc.parameters.extend(params);
        self
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.doc.has_param(name)
    }

    pub fn variable(mut self, variable: Variable) -> Self {
        self.doc.variables.push(variable);
        self
    }

    pub fn variables(mut self, variables: impl IntoIterator<Item = Variable>) -> Self {
        self.doc.variables.extend(variables);
        self
    }

    pub fn resource(mut self, resource: ResourceDecl) -> Self {
        self.doc.declarations.push(Declaration::Resource(resource));
        self
    }

    pub fn module(mut self, module: ModuleDecl) -> Self {
        self.doc.declarations.push(Declaration::Module(module));
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.doc.outputs.push(output);
        self
    }

    pub fn outputs(mut self, outputs: impl IntoIterator<Item = Output>) -> Self {
        self.doc.outputs.extend(outputs);
        self
    }

    pub fn build(self) -> GeneratedDocument {
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_escaping() {
        assert_eq!(BicepValue::str("it's").to_bicep(), r"'it\'s'");
        assert_eq!(BicepValue::str("${x}").to_bicep(), r"'\${x}'");
        assert_eq!(BicepValue::interp("${x}-nic").to_bicep(), "'${x}-nic'");
    }

    #[test]
    fn test_object_rendering() {
        let value = BicepValue::from(
            Body::new()
                .prop("name", BicepValue::str("default"))
                .prop("$schema", BicepValue::str("x"))
                .prop("inner", Body::new().prop("enabled", true))
                .comment("configure later"),
        );
        assert_eq!(
            value.to_bicep(),
            "{\n  name: 'default'\n  '$schema': 'x'\n  inner: {\n    enabled: true\n  }\n  // configure later\n}"
        );
    }

    #[test]
    fn test_array_rendering() {
        assert_eq!(BicepValue::strings(["a", "b"]).to_bicep(), "['a', 'b']");
        assert_eq!(BicepValue::Array(Vec::new()).to_bicep(), "[]");

        let nested = BicepValue::Array(vec![Body::new().prop("id", BicepValue::expr("nic.id")).into()]);
        assert_eq!(nested.to_bicep(), "[\n  {\n    id: nic.id\n  }\n]");
    }

    #[test]
    fn test_param_rendering() {
        let param = Param::new("environment", BicepType::String)
            .describe("Environment name")
            .allowed(["dev", "prod"])
            .default_value(BicepValue::str("dev"));

        let mut out = String::new();
        param.render(&mut out);
        assert_eq!(
            out,
            "@description('Environment name')\n@allowed(['dev', 'prod'])\nparam environment string = 'dev'\n"
        );
    }

    #[test]
    fn test_to_json_skips_expressions() {
        assert_eq!(BicepValue::expr("resourceGroup().location").to_json(), None);
        assert_eq!(BicepValue::interp("${a}").to_json(), None);
        assert_eq!(
            BicepValue::from_json(&json!({ "a": [1, "x"] })).to_json(),
            Some(json!({ "a": [1, "x"] }))
        );
    }

    #[test]
    fn test_document_sections_and_parameters_file() {
        let doc = GeneratedDocument::builder(TargetScope::ResourceGroup)
            .header_line("Test")
            .param(Param::new("location", BicepType::String).default_value(BicepValue::expr("resourceGroup().location")))
            .param(Param::new("environment", BicepType::String).default_value(BicepValue::str("dev")))
            .resource(ResourceDecl::new("site", "Microsoft.Web/sites", "2022-03-01"))
            .build();

        let kinds: Vec<_> = doc.sections().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SectionKind::Parameters, SectionKind::Resources]);

        let text = doc.render();
        assert!(text.starts_with("// Test\n\ntargetScope = 'resourceGroup'\n"));
        assert!(text.contains("resource site 'Microsoft.Web/sites@2022-03-01' = {}"));
        assert!(text.ends_with("{}\n"));

        let params = doc.parameters_file();
        assert_eq!(params["parameters"]["environment"]["value"], "dev");
        assert!(params["parameters"].get("location").is_none());
    }
}
