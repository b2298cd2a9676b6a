//! Runtime error taxonomy
//!
//! Every fallible core operation returns `Result<Value, Error>`. The error
//! carries its category, a human-readable message, and (for argument
//! decoding failures) the offending argument position. Thrown user
//! exceptions travel as a `Value` payload inside the error rather than
//! through a global slot, so `try/catch` in the evaluator can match on
//! them without the runtime keeping ambient state.

use crate::value::Value;
use thiserror::Error;

/// Category of a runtime error.
///
/// These are semantic kinds, not host exception classes. The evaluator
/// maps them onto its surface condition system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operand had the wrong type
    Type,
    /// Operand had the right type but an unusable value
    Value,
    /// Wrong number of arguments
    Arity,
    /// Divide by zero, overflow under exact arithmetic
    Arithmetic,
    /// Index out of bounds
    Index,
    /// Invariant violation inside the runtime itself
    Internal,
    /// A user exception (`throw`, validator rejection)
    User,
}

impl ErrorKind {
    /// Keyword-style name used when reifying an error as data.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Type => "type-error",
            ErrorKind::Value => "value-error",
            ErrorKind::Arity => "arity-error",
            ErrorKind::Arithmetic => "arithmetic-error",
            ErrorKind::Index => "index-error",
            ErrorKind::Internal => "internal-error",
            ErrorKind::User => "user-error",
        }
    }
}

/// A structured runtime error.
///
/// `arg_position` is the zero-based argument index for type/value errors
/// raised while decoding builtin arguments. `thrown` holds the exception
/// value for user exceptions (an info-carrying map); `cause` chains a
/// prior error where one exists (agent handler failures, wrapped thunk
/// errors).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub arg_position: Option<usize>,
    pub thrown: Option<Value>,
    pub cause: Option<Box<Error>>,
}

impl Error {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            arg_position: None,
            thrown: None,
            cause: None,
        }
    }

    pub fn type_err(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Type, message)
    }

    pub fn value_err(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Value, message)
    }

    pub fn arithmetic(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Arithmetic, message)
    }

    pub fn index(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Index, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Internal, message)
    }

    /// The Clojure arity idiom: "Wrong number of args (N) passed to NAME".
    pub fn arity(count: usize, name: &str) -> Self {
        Error::new(
            ErrorKind::Arity,
            format!("Wrong number of args ({count}) passed to {name}"),
        )
    }

    /// "Cannot cast X to number" with the argument position attached.
    pub fn cast(type_name: &str, target: &str, pos: usize) -> Self {
        Error::new(
            ErrorKind::Type,
            format!("Cannot cast {type_name} to {target}"),
        )
        .at_arg(pos)
    }

    /// A user exception carrying a thrown value (ex-info style map).
    pub fn user(message: impl Into<String>, thrown: Value) -> Self {
        let mut e = Error::new(ErrorKind::User, message);
        e.thrown = Some(thrown);
        e
    }

    /// Attach the zero-based argument position.
    pub fn at_arg(mut self, pos: usize) -> Self {
        self.arg_position = Some(pos);
        self
    }

    /// Chain a causing error.
    pub fn caused_by(mut self, cause: Error) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Reify this error as a value the language can catch and inspect.
    ///
    /// User exceptions surface their original thrown payload; other kinds
    /// build an info map with `:type` and `:message` entries.
    pub fn to_value(&self) -> Value {
        if let Some(thrown) = &self.thrown {
            return thrown.clone();
        }
        Value::array_map(vec![
            (Value::keyword(None, "type"), Value::keyword(None, self.kind.name())),
            (Value::keyword(None, "message"), Value::string(&self.message)),
        ])
    }
}

/// Format a panic payload into an error message.
///
/// Worker threads catch panics from user code and store them as errors;
/// this extracts the conventional `&str`/`String` payloads.
pub fn format_panic_payload(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message() {
        let e = Error::arity(3, "first");
        assert_eq!(e.kind, ErrorKind::Arity);
        assert_eq!(e.message, "Wrong number of args (3) passed to first");
    }

    #[test]
    fn test_cast_message_and_position() {
        let e = Error::cast("string", "number", 1);
        assert_eq!(e.message, "Cannot cast string to number");
        assert_eq!(e.arg_position, Some(1));
    }

    #[test]
    fn test_user_error_reifies_thrown_value() {
        let payload = Value::string("boom");
        let e = Error::user("boom", payload.clone());
        assert_eq!(e.to_value(), payload);
    }

    #[test]
    fn test_non_user_error_reifies_as_info_map() {
        let e = Error::arithmetic("Divide by zero");
        let v = e.to_value();
        let msg = crate::coll::get(&v, &Value::keyword(None, "message"), &Value::Nil).unwrap();
        assert_eq!(msg, Value::string("Divide by zero"));
    }

    #[test]
    fn test_format_panic_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("panic message");
        assert_eq!(format_panic_payload(&payload), "panic message");

        let payload: Box<dyn std::any::Any + Send> = Box::new("owned panic".to_string());
        assert_eq!(format_panic_payload(&payload), "owned panic");
    }
}
