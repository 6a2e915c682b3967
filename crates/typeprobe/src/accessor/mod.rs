//! Member accessor
//!
//! Reads and writes non-public fields and invokes non-public methods on live
//! instances. Instances are reachable only through the [`MemberTable`] their
//! type publishes via [`Inspectable`]; every operation is gated by an
//! [`AccessPolicy`].
//!
//! Two invocation contracts exist side by side:
//!
//! - [`MemberAccessor::invoke_method`] binds by name and arity and reports a
//!   missing or unbindable method as `MemberNotFound`.
//! - [`MemberAccessor::try_invoke_method`] binds by name, arity and exact
//!   argument kinds, and does nothing when no overload matches.

pub mod policy;
pub mod table;

pub use policy::{AccessPermission, AccessPolicy, InvalidPermission, TypeRule};
pub use table::{FieldEntry, MemberTable, MethodEntry, Visibility};

use crate::error::{ProbeError, ProbeResult};
use crate::value::Value;

/// A type whose non-public members can be reached by the accessor
pub trait Inspectable: Sized + 'static {
    /// Describe the members this type exposes
    fn members() -> MemberTable<Self>;
}

/// Policy-gated access to non-public members
#[derive(Debug, Clone, Default)]
pub struct MemberAccessor {
    policy: AccessPolicy,
}

impl MemberAccessor {
    /// Create an accessor governed by `policy`
    pub fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }

    /// Policy in effect
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    fn authorize(
        &self,
        type_name: &str,
        member: &str,
        required: AccessPermission,
        operation: &'static str,
    ) -> ProbeResult<()> {
        if self.policy.allows(type_name, required) {
            return Ok(());
        }
        tracing::warn!(type_name, member, operation, "member access denied by policy");
        Err(ProbeError::AccessDenied {
            type_name: type_name.to_string(),
            member: member.to_string(),
            operation,
        })
    }

    /// Read a non-public field
    pub fn read_field<T: Inspectable>(&self, target: &T, name: &str) -> ProbeResult<Value> {
        let table = T::members();
        let field = table
            .hidden_field(name)
            .ok_or_else(|| ProbeError::member_not_found(table.type_name(), name))?;
        self.authorize(table.type_name(), name, AccessPermission::READ_PRIVATE, "read")?;
        tracing::debug!(type_name = table.type_name(), field = name, "reading field");
        Ok(field.get(target))
    }

    /// Write a non-public field in place
    pub fn write_field<T: Inspectable>(
        &self,
        target: &mut T,
        name: &str,
        value: impl Into<Value>,
    ) -> ProbeResult<()> {
        let table = T::members();
        let field = table
            .hidden_field(name)
            .ok_or_else(|| ProbeError::member_not_found(table.type_name(), name))?;
        self.authorize(table.type_name(), name, AccessPermission::WRITE_PRIVATE, "write")?;
        tracing::debug!(type_name = table.type_name(), field = name, "writing field");
        field
            .set(target, value.into())
            .map_err(|mismatch| ProbeError::ValueKindMismatch {
                type_name: table.type_name().to_string(),
                member: name.to_string(),
                expected: mismatch.expected,
                actual: mismatch.got,
            })
    }

    /// Invoke a non-public method, failing loudly.
    ///
    /// Binds the first non-public method named `name` whose parameter count
    /// equals `args.len()`. If there is none, or the arguments do not have
    /// the declared parameter kinds, fails with `MemberNotFound`. Errors
    /// raised by the method body are returned unchanged.
    ///
    /// The first arity match is final: later overloads with the same arity
    /// are never tried, so `MemberNotFound` can be reported while a
    /// same-named overload with matching kinds exists. Use
    /// [`MemberAccessor::try_invoke_method`] to select overloads by kind.
    pub fn invoke_method<T: Inspectable>(
        &self,
        target: &mut T,
        name: &str,
        args: Vec<Value>,
    ) -> ProbeResult<Value> {
        let table = T::members();
        let method = table
            .hidden_methods(name)
            .find(|m| m.arity() == args.len())
            .filter(|m| m.accepts(&args))
            .ok_or_else(|| ProbeError::member_not_found(table.type_name(), name))?;
        self.authorize(table.type_name(), name, AccessPermission::INVOKE_PRIVATE, "invoke")?;
        tracing::debug!(
            type_name = table.type_name(),
            method = name,
            arity = args.len(),
            "invoking method"
        );
        method.call(target, args)
    }

    /// Invoke a non-public method if one matches exactly; otherwise do nothing.
    ///
    /// An overload matches when its parameter count and every parameter kind
    /// equal those of `args`. A missing overload or a policy denial returns
    /// `Ok(())` without touching `target`; only errors raised by the method
    /// body are reported.
    pub fn try_invoke_method<T: Inspectable>(
        &self,
        target: &mut T,
        name: &str,
        args: Vec<Value>,
    ) -> ProbeResult<()> {
        let table = T::members();
        let Some(method) = table.hidden_methods(name).find(|m| m.accepts(&args)) else {
            tracing::debug!(type_name = table.type_name(), method = name, "no matching overload, skipped");
            return Ok(());
        };
        if self
            .authorize(table.type_name(), name, AccessPermission::INVOKE_PRIVATE, "invoke")
            .is_err()
        {
            return Ok(());
        }
        tracing::debug!(type_name = table.type_name(), method = name, "invoking method");
        method.call(target, args).map(|_| ())
    }
}

/// [`MemberAccessor::read_field`] under the permissive policy
pub fn read_field<T: Inspectable>(target: &T, name: &str) -> ProbeResult<Value> {
    MemberAccessor::default().read_field(target, name)
}

/// [`MemberAccessor::write_field`] under the permissive policy
pub fn write_field<T: Inspectable>(target: &mut T, name: &str, value: impl Into<Value>) -> ProbeResult<()> {
    MemberAccessor::default().write_field(target, name, value)
}

/// [`MemberAccessor::invoke_method`] under the permissive policy
pub fn invoke_method<T: Inspectable>(target: &mut T, name: &str, args: Vec<Value>) -> ProbeResult<Value> {
    MemberAccessor::default().invoke_method(target, name, args)
}

/// [`MemberAccessor::try_invoke_method`] under the permissive policy
pub fn try_invoke_method<T: Inspectable>(target: &mut T, name: &str, args: Vec<Value>) -> ProbeResult<()> {
    MemberAccessor::default().try_invoke_method(target, name, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    #[derive(Default)]
    struct Counter {
        count: i64,
        handled: Vec<i64>,
        pub label: String,
    }

    impl Inspectable for Counter {
        fn members() -> MemberTable<Self> {
            MemberTable::new("Lib::Counter")
                .field("_count", |c: &Counter| c.count, |c: &mut Counter, v| c.count = v)
                .field_with(
                    Visibility::Public,
                    "label",
                    |c: &Counter| c.label.clone(),
                    |c: &mut Counter, v| c.label = v,
                )
                .method("Handle", &[ValueKind::Int], |c, args| {
                    let n: i64 = args.into_iter().next().unwrap_or_default().extract()?;
                    c.handled.push(n);
                    Ok(Value::Null)
                })
                .method("Add", &[ValueKind::Int, ValueKind::Int], |_, args| {
                    let sum = args.iter().filter_map(Value::as_int).sum::<i64>();
                    Ok(Value::Int(sum))
                })
                .method("Fail", &[], |_, _| Err(anyhow::anyhow!("boom").into()))
        }
    }

    //==========================================================================
    // Fields
    //==========================================================================

    #[test]
    fn test_field_round_trip() {
        let mut obj = Counter::default();
        write_field(&mut obj, "_count", 5).unwrap();
        assert_eq!(read_field(&obj, "_count").unwrap(), Value::Int(5));
        assert_eq!(obj.count, 5);
    }

    #[test]
    fn test_missing_field() {
        let obj = Counter::default();
        let err = read_field(&obj, "_missing").unwrap_err();
        assert!(err.is_member_not_found());
        assert!(err.to_string().contains("Lib::Counter"));
        assert!(err.to_string().contains("_missing"));
    }

    #[test]
    fn test_public_field_is_not_reachable() {
        let mut obj = Counter::default();
        assert!(read_field(&obj, "label").unwrap_err().is_member_not_found());
        assert!(write_field(&mut obj, "label", "x").unwrap_err().is_member_not_found());
    }

    #[test]
    fn test_write_wrong_kind() {
        let mut obj = Counter::default();
        let err = write_field(&mut obj, "_count", "five").unwrap_err();
        match err {
            ProbeError::ValueKindMismatch { expected, actual, .. } => {
                assert_eq!(expected, ValueKind::Int);
                assert_eq!(actual, ValueKind::Str);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(obj.count, 0);
    }

    //==========================================================================
    // Methods
    //==========================================================================

    #[test]
    fn test_strict_invoke() {
        let mut obj = Counter::default();
        let sum = invoke_method(&mut obj, "Add", vec![Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(sum, Value::Int(5));

        invoke_method(&mut obj, "Handle", vec![Value::Int(7)]).unwrap();
        assert_eq!(obj.handled, vec![7]);
    }

    #[test]
    fn test_mismatched_argument_kind() {
        let mut obj = Counter::default();

        // Best-effort: no failure, no effect
        try_invoke_method(&mut obj, "Handle", vec![Value::from("x")]).unwrap();
        assert!(obj.handled.is_empty());

        // Strict: reported as a missing member
        let err = invoke_method(&mut obj, "Handle", vec![Value::from("x")]).unwrap_err();
        assert!(err.is_member_not_found());
        assert!(obj.handled.is_empty());
    }

    #[test]
    fn test_arity_mismatch() {
        let mut obj = Counter::default();
        assert!(invoke_method(&mut obj, "Add", vec![Value::Int(1)])
            .unwrap_err()
            .is_member_not_found());
        try_invoke_method(&mut obj, "Add", vec![Value::Int(1)]).unwrap();
        try_invoke_method(&mut obj, "Nope", vec![]).unwrap();
    }

    #[test]
    fn test_best_effort_runs_on_exact_match() {
        let mut obj = Counter::default();
        try_invoke_method(&mut obj, "Handle", vec![Value::Int(3)]).unwrap();
        assert_eq!(obj.handled, vec![3]);
    }

    #[test]
    fn test_raised_errors_pass_through() {
        let mut obj = Counter::default();
        let err = invoke_method(&mut obj, "Fail", vec![]).unwrap_err();
        assert!(matches!(err, ProbeError::Raised(_)));
        assert_eq!(err.to_string(), "boom");

        let err = try_invoke_method(&mut obj, "Fail", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    //==========================================================================
    // Policy
    //==========================================================================

    #[test]
    fn test_policy_denies_write() {
        let mut policy = AccessPolicy::permissive();
        policy.set_type("Lib::*", AccessPermission::READ_PRIVATE);
        let accessor = MemberAccessor::new(policy);

        let mut obj = Counter::default();
        assert_eq!(accessor.read_field(&obj, "_count").unwrap(), Value::Int(0));
        let err = accessor.write_field(&mut obj, "_count", 1).unwrap_err();
        assert!(matches!(err, ProbeError::AccessDenied { operation: "write", .. }));
        assert_eq!(obj.count, 0);
    }

    #[test]
    fn test_policy_denies_invoke() {
        let accessor = MemberAccessor::new(AccessPolicy::deny_all());
        let mut obj = Counter::default();

        let err = accessor
            .invoke_method(&mut obj, "Handle", vec![Value::Int(1)])
            .unwrap_err();
        assert!(matches!(err, ProbeError::AccessDenied { operation: "invoke", .. }));

        accessor
            .try_invoke_method(&mut obj, "Handle", vec![Value::Int(1)])
            .unwrap();
        assert!(obj.handled.is_empty());
    }

    #[test]
    fn test_lookup_precedes_policy() {
        let accessor = MemberAccessor::new(AccessPolicy::deny_all());
        let obj = Counter::default();
        assert!(accessor.read_field(&obj, "_missing").unwrap_err().is_member_not_found());
    }
}
