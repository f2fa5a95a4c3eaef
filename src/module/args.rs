//! Positional argument checks for builtins.

use crate::error::{OsError, Result};
use crate::value::Value;

/// Reject calls with fewer than `min` or more than `max` arguments.
pub fn check_arity(args: &[Value], min: usize, max: usize) -> Result<()> {
    if args.len() < min {
        return Err(OsError::Type(format!(
            "function missing {} required positional arguments",
            min - args.len()
        )));
    }
    if args.len() > max {
        return Err(OsError::Type(if min == max {
            format!("function takes {} positional arguments but {} were given", max, args.len())
        } else {
            format!(
                "function expected at most {} arguments, got {}",
                max,
                args.len()
            )
        }));
    }
    Ok(())
}

pub fn arg_str(args: &[Value], index: usize) -> Result<&str> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s),
        Some(other) => Err(OsError::Type(format!(
            "can't convert '{}' object to str implicitly",
            other.type_name()
        ))),
        None => Err(OsError::Type("function missing required positional argument".to_string())),
    }
}

/// Optional path argument; `None` and absent both mean the cwd.
pub fn arg_opt_str(args: &[Value], index: usize) -> Result<Option<&str>> {
    match args.get(index) {
        None | Some(Value::None) => Ok(None),
        Some(_) => arg_str(args, index).map(Some),
    }
}

pub fn arg_int(args: &[Value], index: usize) -> Result<i64> {
    match args.get(index) {
        Some(value) => value.as_int().ok_or_else(|| {
            OsError::Type(format!("can't convert {} to int", value.type_name()))
        }),
        None => Err(OsError::Type("function missing required positional argument".to_string())),
    }
}

/// Truthiness of an optional flag argument.
pub fn arg_flag(args: &[Value], index: usize) -> bool {
    match args.get(index) {
        None | Some(Value::None) | Some(Value::Bool(false)) | Some(Value::Int(0)) => false,
        Some(Value::Str(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_arity() {
        assert!(check_arity(&[], 0, 1).is_ok());
        assert_eq!(
            check_arity(&[], 1, 1),
            Err(OsError::Type("function missing 1 required positional arguments".to_string()))
        );
        assert_eq!(
            check_arity(&[Value::None, Value::None], 1, 1),
            Err(OsError::Type(
                "function takes 1 positional arguments but 2 were given".to_string()
            ))
        );
        assert!(check_arity(&[Value::None, Value::None], 0, 1).is_err());
    }

    #[test]
    fn test_arg_conversions() {
        let args = vec![Value::from("/flash"), Value::Int(4), Value::None, Value::Bool(true)];
        assert_eq!(arg_str(&args, 0).unwrap(), "/flash");
        assert_eq!(arg_int(&args, 1).unwrap(), 4);
        assert_eq!(arg_int(&args, 3).unwrap(), 1);
        assert_eq!(arg_opt_str(&args, 2).unwrap(), None);
        assert_eq!(arg_opt_str(&args, 9).unwrap(), None);
        assert!(arg_flag(&args, 3));
        assert!(!arg_flag(&args, 2));

        assert_eq!(
            arg_str(&args, 1),
            Err(OsError::Type("can't convert 'int' object to str implicitly".to_string()))
        );
        assert_eq!(
            arg_int(&args, 0),
            Err(OsError::Type("can't convert str to int".to_string()))
        );
    }
}
