//! Script Session
//!
//! Drives the `uos` module from line-oriented scripts. Each line is a call:
//!
//! ```text
//! # comments and blank lines are skipped
//! mkdir /flash/lib
//! vol = VfsFat 64 2
//! mount $vol /sd
//! getfree "/sd"
//! ```
//!
//! Arguments are integers, `None`, `True`, `False`, quoted strings, `$name`
//! references to earlier results, or bare words taken as strings. A failing
//! line reports to stderr and the script carries on. While a dupterm target
//! is set, every stdout and stderr line is copied to it as well.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::OsConfig;
use crate::error::{OsError, Result};
use crate::module::{create_uos_module, ModuleRegistry};
use crate::os::OsContext;
use crate::term::Uart;
use crate::value::Value;

/// Outcome of running a script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Value of every successful call, in order
    pub results: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
}

/// Split a line into words, honouring single and double quotes.
fn tokenize(line: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '\'' || c == '"' {
            let quote = c;
            chars.next();
            let mut s = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some(other) => s.push(other),
                        None => break,
                    },
                    c if c == quote => {
                        closed = true;
                        break;
                    }
                    c => s.push(c),
                }
            }
            if !closed {
                return Err("unterminated string".to_string());
            }
            tokens.push(Token::Quoted(s));
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }
    Ok(tokens)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Convert a `Value` to JSON for `--json` output.
pub fn to_json(value: &Value) -> serde_json::Value {
    use serde_json::json;
    match value {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::Int(n) => json!(n),
        Value::Str(s) => json!(s),
        Value::Bytes(b) => json!(b),
        Value::Tuple(items) | Value::List(items) => {
            serde_json::Value::Array(items.iter().map(to_json).collect())
        }
        Value::AttrTuple(fields) => serde_json::Value::Object(
            fields.iter().map(|(k, v)| (k.clone(), to_json(v))).collect(),
        ),
        Value::Object(obj) => json!(format!("<{}>", obj.type_name())),
    }
}

pub struct Session {
    pub ctx: OsContext,
    module: ModuleRegistry,
    vars: HashMap<String, Value>,
}

impl Session {
    pub fn new(ctx: OsContext) -> Self {
        Self {
            ctx,
            module: create_uos_module(),
            vars: HashMap::new(),
        }
    }

    /// Session over a freshly booted context.
    pub async fn from_config(config: &OsConfig) -> Result<Self> {
        Ok(Self::new(OsContext::from_config(config).await?))
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    fn argument(&self, token: Token) -> Result<Value> {
        let word = match token {
            Token::Quoted(s) => return Ok(Value::Str(s)),
            Token::Word(word) => word,
        };
        if let Some(name) = word.strip_prefix('$') {
            return self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| OsError::Type(format!("name '{}' isn't defined", name)));
        }
        Ok(match word.as_str() {
            "None" => Value::None,
            "True" => Value::Bool(true),
            "False" => Value::Bool(false),
            _ => match word.parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => Value::Str(word),
            },
        })
    }

    /// Host-side constructors that live outside `uos`.
    fn call_host(&self, name: &str, args: &[Value]) -> Option<Result<Value>> {
        match name {
            "UART" => Some(
                match args.first().and_then(Value::as_int).map(u8::try_from) {
                    Some(Ok(id)) => Ok(Value::Object(Arc::new(Uart::new(id)))),
                    Some(Err(_)) => Err(OsError::Value("UART id out of range".to_string())),
                    None => Err(OsError::Type("UART needs an integer id".to_string())),
                },
            ),
            _ => None,
        }
    }

    /// Run one line. Returns `None` for blank lines and comments.
    pub async fn exec_line(&mut self, line: &str) -> Option<Result<Value>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let mut tokens = match tokenize(line) {
            Ok(tokens) => tokens,
            Err(e) => return Some(Err(OsError::Value(e))),
        };

        let mut target = None;
        if let [Token::Word(name), Token::Word(eq), ..] = tokens.as_slice() {
            if eq == "=" && is_identifier(name) {
                target = Some(name.clone());
                tokens.drain(..2);
            }
        }

        let mut tokens = tokens.into_iter();
        let name = match tokens.next() {
            Some(Token::Word(name)) => name,
            _ => return Some(Err(OsError::Value("expected a function name".to_string()))),
        };
        let args: Result<Vec<Value>> = tokens.map(|t| self.argument(t)).collect();
        let args = match args {
            Ok(args) => args,
            Err(e) => return Some(Err(e)),
        };

        log::debug!("call {} with {} args", name, args.len());
        let result = match self.call_host(&name, &args) {
            Some(result) => result,
            None => self.module.call(&mut self.ctx, &name, args).await,
        };

        if let (Some(target), Ok(value)) = (target, &result) {
            self.vars.insert(target, value.clone());
        }
        Some(result)
    }

    /// Run a whole script, one call per line.
    pub async fn exec(&mut self, script: &str) -> ExecResult {
        let mut out = ExecResult::default();
        for (lineno, line) in script.lines().enumerate() {
            match self.exec_line(line).await {
                None => {}
                Some(Ok(value)) => {
                    let text = format!("{}\n", value);
                    self.mirror(&text);
                    out.stdout.push_str(&text);
                    out.results.push(value);
                }
                Some(Err(e)) => {
                    let text = format!("line {}: {}\n", lineno + 1, e);
                    self.mirror(&text);
                    out.stderr.push_str(&text);
                    out.exit_code = 1;
                }
            }
        }
        out
    }

    /// Copy console text to the dupterm target, if one is set.
    fn mirror(&self, text: &str) {
        if let Err(e) = self.ctx.dupterm.write(text.as_bytes()) {
            log::warn!("dupterm write failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errno::Errno;

    async fn session() -> Session {
        Session::from_config(&OsConfig::default()).await.unwrap()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize(r#"rename 'a b' "c\"d" 3"#).unwrap(),
            vec![
                Token::Word("rename".to_string()),
                Token::Quoted("a b".to_string()),
                Token::Quoted("c\"d".to_string()),
                Token::Word("3".to_string()),
            ]
        );
        assert!(tokenize("mkdir 'oops").is_err());
    }

    #[tokio::test]
    async fn test_argument_kinds() {
        let mut s = session().await;
        assert_eq!(s.exec_line("# comment").await, None);
        assert_eq!(s.exec_line("   ").await, None);
        assert_eq!(s.exec_line("getcwd").await, Some(Ok(Value::from("/flash"))));
        assert_eq!(
            s.exec_line("urandom True").await.map(|r| r.map(|v| v.as_bytes().map(|b| b.len()))),
            Some(Ok(Some(1)))
        );
        assert_eq!(
            s.exec_line("getfree '1'").await,
            Some(Err(OsError::Os(Errno::ENOENT)))
        );
    }

    #[tokio::test]
    async fn test_variables() {
        let mut s = session().await;
        s.exec_line("vol = VfsFat 64 2").await.unwrap().unwrap();
        assert_eq!(s.var("vol").map(|v| v.type_name()), Some("VfsFat".to_string()));
        s.exec_line("mount $vol /sd").await.unwrap().unwrap();
        assert_eq!(s.exec_line("getfree /sd").await, Some(Ok(Value::Int(32))));
        assert!(matches!(
            s.exec_line("mount $nothing /x").await,
            Some(Err(OsError::Type(_)))
        ));
    }

    #[tokio::test]
    async fn test_dupterm_uart() {
        let mut s = session().await;
        s.exec_line("u = UART 1").await.unwrap().unwrap();
        s.exec_line("dupterm $u").await.unwrap().unwrap();
        let current = s.exec_line("dupterm").await.unwrap().unwrap();
        assert_eq!(Some(&current), s.var("u"));
    }

    #[tokio::test]
    async fn test_exec_continues_after_error() {
        let mut s = session().await;
        let result = s.exec("mkdir lib\nrmdir nope\nlistdir\n").await;
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stdout, "None\n['lib']\n");
        assert_eq!(result.stderr, "line 2: OSError: [Errno 2] ENOENT\n");
        assert_eq!(result.results.len(), 2);
    }

    #[test]
    fn test_to_json() {
        let v = Value::Tuple(vec![Value::None, Value::Int(3), Value::from("x")]);
        assert_eq!(to_json(&v), serde_json::json!([null, 3, "x"]));
        let t = Value::AttrTuple(vec![("sysname".to_string(), Value::from("esp32"))]);
        assert_eq!(to_json(&t), serde_json::json!({"sysname": "esp32"}));
    }

    #[tokio::test]
    async fn test_console_mirrored_to_dupterm() {
        let mut s = session().await;
        let uart = Arc::new(Uart::new(1));
        s.vars.insert("u".to_string(), Value::Object(uart.clone()));

        let result = s.exec("getcwd\ndupterm $u\ngetcwd\nrmdir nope\n").await;
        assert_eq!(result.stdout, "'/flash'\nNone\n'/flash'\n");
        assert_eq!(
            uart.take_output(),
            b"None\n'/flash'\nline 4: OSError: [Errno 2] ENOENT\n"
        );

        s.exec("dupterm None\ngetcwd\n").await;
        assert!(uart.take_output().is_empty());
    }
}
