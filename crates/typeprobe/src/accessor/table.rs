//! Member tables
//!
//! A type opts into the accessor by describing the members it is willing to
//! expose: a name, a visibility, and closures that get/set a field or run a
//! method. Nothing outside the table is reachable.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::ProbeResult;
use crate::value::{FromValue, Value, ValueKind, ValueMismatch};

/// Declared visibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Reachable through the type's normal API; ignored by the accessor
    Public,
    /// Visible to the type and its descendants
    Protected,
    /// Visible to the type only
    Private,
}

impl Visibility {
    /// Check if this is `Public`
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

type Getter<T> = Box<dyn Fn(&T) -> Value>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<(), ValueMismatch>>;
type MethodBody<T> = Box<dyn Fn(&mut T, Vec<Value>) -> ProbeResult<Value>>;

/// A field exposed through the table
pub struct FieldEntry<T> {
    /// Declared visibility
    pub visibility: Visibility,
    /// Declared value kind
    pub kind: ValueKind,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> FieldEntry<T> {
    /// Read the field from `target`
    pub fn get(&self, target: &T) -> Value {
        (self.get)(target)
    }

    /// Write `value` into `target`
    pub fn set(&self, target: &mut T, value: Value) -> Result<(), ValueMismatch> {
        (self.set)(target, value)
    }
}

impl<T> fmt::Debug for FieldEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldEntry")
            .field("visibility", &self.visibility)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A method exposed through the table
pub struct MethodEntry<T> {
    /// Method name
    pub name: String,
    /// Declared visibility
    pub visibility: Visibility,
    /// Declared parameter kinds, in order
    pub params: Vec<ValueKind>,
    body: MethodBody<T>,
}

impl<T> MethodEntry<T> {
    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Check if every argument's runtime kind equals the declared parameter kind
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(kind, arg)| *kind == arg.kind())
    }

    /// Run the method body
    pub fn call(&self, target: &mut T, args: Vec<Value>) -> ProbeResult<Value> {
        (self.body)(target, args)
    }
}

impl<T> fmt::Debug for MethodEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("params", &self.params)
            .finish()
    }
}

/// Name-keyed table of a type's exposed members
pub struct MemberTable<T> {
    type_name: String,
    fields: FxHashMap<String, FieldEntry<T>>,
    /// Methods in declaration order; overloads share a name
    methods: Vec<MethodEntry<T>>,
}

impl<T: 'static> MemberTable<T> {
    /// Create an empty table for the named type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: FxHashMap::default(),
            methods: Vec::new(),
        }
    }

    /// Add a private field
    pub fn field<V>(
        self,
        name: &str,
        get: impl Fn(&T) -> V + 'static,
        set: impl Fn(&mut T, V) + 'static,
    ) -> Self
    where
        V: FromValue + Into<Value>,
    {
        self.field_with(Visibility::Private, name, get, set)
    }

    /// Add a field with explicit visibility
    pub fn field_with<V>(
        mut self,
        visibility: Visibility,
        name: &str,
        get: impl Fn(&T) -> V + 'static,
        set: impl Fn(&mut T, V) + 'static,
    ) -> Self
    where
        V: FromValue + Into<Value>,
    {
        let entry = FieldEntry {
            visibility,
            kind: V::KIND,
            get: Box::new(move |target| get(target).into()),
            set: Box::new(move |target, value| {
                set(target, V::from_value(value)?);
                Ok(())
            }),
        };
        self.fields.insert(name.to_string(), entry);
        self
    }

    /// Add a private method
    pub fn method(
        self,
        name: &str,
        params: &[ValueKind],
        body: impl Fn(&mut T, Vec<Value>) -> ProbeResult<Value> + 'static,
    ) -> Self {
        self.method_with(Visibility::Private, name, params, body)
    }

    /// Add a method with explicit visibility
    pub fn method_with(
        mut self,
        visibility: Visibility,
        name: &str,
        params: &[ValueKind],
        body: impl Fn(&mut T, Vec<Value>) -> ProbeResult<Value> + 'static,
    ) -> Self {
        self.methods.push(MethodEntry {
            name: name.to_string(),
            visibility,
            params: params.to_vec(),
            body: Box::new(body),
        });
        self
    }
}

impl<T> MemberTable<T> {
    /// Name of the described type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Non-public field by name
    pub fn hidden_field(&self, name: &str) -> Option<&FieldEntry<T>> {
        self.fields.get(name).filter(|f| !f.visibility.is_public())
    }

    /// Non-public methods with the given name, in declaration order
    pub fn hidden_methods<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodEntry<T>> + 'a {
        self.methods
            .iter()
            .filter(move |m| m.name == name && !m.visibility.is_public())
    }

    /// Number of fields (any visibility)
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of methods (any visibility)
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

impl<T> fmt::Debug for MemberTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberTable")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gauge {
        level: i64,
        label: String,
    }

    fn table() -> MemberTable<Gauge> {
        MemberTable::<Gauge>::new("Gauge")
            .field("_level", |g| g.level, |g, v| g.level = v)
            .field_with(
                Visibility::Public,
                "label",
                |g| g.label.clone(),
                |g, v| g.label = v,
            )
            .method("Bump", &[ValueKind::Int], |g, args| {
                let by: i64 = args.into_iter().next().unwrap_or_default().extract()?;
                g.level += by;
                Ok(Value::Int(g.level))
            })
    }

    #[test]
    fn test_hidden_field_lookup() {
        let table = table();
        assert_eq!(table.type_name(), "Gauge");
        assert_eq!(table.field_count(), 2);
        assert!(table.hidden_field("_level").is_some());
        // Public members are not reachable through the table lookups
        assert!(table.hidden_field("label").is_none());
        assert!(table.hidden_field("missing").is_none());
    }

    #[test]
    fn test_field_get_set() {
        let table = table();
        let mut gauge = Gauge {
            level: 1,
            label: "g".to_string(),
        };
        let field = table.hidden_field("_level").unwrap();
        assert_eq!(field.kind, ValueKind::Int);
        field.set(&mut gauge, Value::Int(9)).unwrap();
        assert_eq!(field.get(&gauge), Value::Int(9));

        let err = field.set(&mut gauge, Value::from("nine")).unwrap_err();
        assert_eq!(err.got, ValueKind::Str);
        assert_eq!(gauge.level, 9);
    }

    #[test]
    fn test_method_accepts() {
        let table = table();
        let bump = table.hidden_methods("Bump").next().unwrap();
        assert_eq!(bump.arity(), 1);
        assert!(bump.accepts(&[Value::Int(1)]));
        assert!(!bump.accepts(&[Value::from("1")]));
        assert!(!bump.accepts(&[]));
    }
}
