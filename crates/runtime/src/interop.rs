//! Java-interop static field shims
//!
//! A table of platform constants interned under mangled names
//! (`Integer/MAX_VALUE` becomes `__Integer-MAX_VALUE`) so compiled code
//! can resolve host-class field references without a reflection layer.

use crate::namespace::{Environment, CORE_NS};
use clove_core::value::Value;

fn constants() -> Vec<(&'static str, Value)> {
    vec![
        ("__Integer-MAX_VALUE", Value::Int(i32::MAX as i64)),
        ("__Integer-MIN_VALUE", Value::Int(i32::MIN as i64)),
        ("__Long-MAX_VALUE", Value::Int(i64::MAX)),
        ("__Long-MIN_VALUE", Value::Int(i64::MIN)),
        ("__Short-MAX_VALUE", Value::Int(i16::MAX as i64)),
        ("__Short-MIN_VALUE", Value::Int(i16::MIN as i64)),
        ("__Byte-MAX_VALUE", Value::Int(i8::MAX as i64)),
        ("__Byte-MIN_VALUE", Value::Int(i8::MIN as i64)),
        ("__Character-MAX_VALUE", Value::Int(0xffff)),
        ("__Character-MIN_VALUE", Value::Int(0)),
        ("__Double-MAX_VALUE", Value::Float(f64::MAX)),
        ("__Double-MIN_VALUE", Value::Float(f64::from_bits(1))),
        ("__Double-POSITIVE_INFINITY", Value::Float(f64::INFINITY)),
        ("__Double-NEGATIVE_INFINITY", Value::Float(f64::NEG_INFINITY)),
        ("__Double-NaN", Value::Float(f64::NAN)),
        ("__Float-MAX_VALUE", Value::Float(f32::MAX as f64)),
        ("__Float-MIN_VALUE", Value::Float(f32::from_bits(1) as f64)),
        ("__Math-PI", Value::Float(std::f64::consts::PI)),
        ("__Math-E", Value::Float(std::f64::consts::E)),
    ]
}

/// Intern every shim into the core namespace.
pub fn install(env: &Environment) {
    let core = env.find_or_create_namespace(CORE_NS);
    for (name, value) in constants() {
        core.intern(name).set_root(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shims_installed_under_mangled_names() {
        let env = Environment::new();
        install(&env);
        let core = env.find_namespace(CORE_NS).unwrap();
        assert_eq!(
            core.find("__Integer-MAX_VALUE").unwrap().root(),
            Value::Int(2_147_483_647)
        );
        assert_eq!(
            core.find("__Long-MIN_VALUE").unwrap().root(),
            Value::Int(i64::MIN)
        );
        match core.find("__Double-NaN").unwrap().root() {
            Value::Float(f) => assert!(f.is_nan()),
            other => panic!("expected float, got {:?}", other),
        }
    }
}
