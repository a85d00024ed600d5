//! Just enough GLSL checking to tell well-formed stages from broken ones.
//!
//! This is no compiler: it strips comments, checks delimiters, requires a `main` entry point and
//! collects top-level interface declarations. Declared names are considered active.

use offscreen::shader::StageType;

/// Interface of a compiled stage.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Interface {
  /// Vertex inputs, in declaration order.
  pub(crate) attributes: Vec<String>,
  pub(crate) uniforms: Vec<String>,
  /// Vertex outputs or fragment inputs.
  pub(crate) varyings: Vec<String>,
}

/// Check a stage source, returning its interface or a driver-like log.
pub(crate) fn check(ty: StageType, src: &str) -> Result<Interface, String> {
  let src = strip_comments(src);

  check_delimiters(&src)?;

  if !has_main(&src) {
    return Err("0:0: error: missing entry point 'void main()'".to_owned());
  }

  if let Some(line) = find_empty_expression(&src) {
    return Err(format!("0:{}: error: expression expected", line));
  }

  collect_interface(ty, &src)
}

fn strip_comments(src: &str) -> String {
  let mut out = String::with_capacity(src.len());
  let mut chars = src.chars().peekable();

  while let Some(c) = chars.next() {
    match (c, chars.peek()) {
      ('/', Some('/')) => {
        // keep the newline so that line numbers stay right
        for c in chars.by_ref() {
          if c == '\n' {
            out.push('\n');
            break;
          }
        }
      }

      ('/', Some('*')) => {
        chars.next();
        let mut prev = '\0';

        for c in chars.by_ref() {
          if c == '\n' {
            out.push('\n');
          }

          if prev == '*' && c == '/' {
            break;
          }

          prev = c;
        }

        out.push(' ');
      }

      _ => out.push(c),
    }
  }

  out
}

fn check_delimiters(src: &str) -> Result<(), String> {
  let mut stack: Vec<(char, usize)> = Vec::new();
  let mut line = 1;

  for c in src.chars() {
    match c {
      '\n' => line += 1,
      '(' | '[' | '{' => stack.push((c, line)),
      ')' | ']' | '}' => {
        let expected = match c {
          ')' => '(',
          ']' => '[',
          _ => '{',
        };

        match stack.pop() {
          Some((open, _)) if open == expected => (),
          _ => return Err(format!("0:{}: error: unexpected '{}'", line, c)),
        }
      }
      _ => (),
    }
  }

  match stack.pop() {
    Some((open, line)) => Err(format!("0:{}: error: unbalanced '{}'", line, open)),
    None => Ok(()),
  }
}

fn has_main(src: &str) -> bool {
  let tokens = src
    .split(|c: char| !(c.is_alphanumeric() || c == '_'))
    .filter(|t| !t.is_empty())
    .collect::<Vec<_>>();

  tokens.windows(2).any(|w| w == ["void", "main"])
}

/// Line of the first `= ;` or `( ;`-like hole, if any.
fn find_empty_expression(src: &str) -> Option<usize> {
  let mut line = 1;
  let mut last = None;

  for c in src.chars() {
    if c == '\n' {
      line += 1;
      continue;
    }

    if c.is_whitespace() {
      continue;
    }

    if c == ';' && matches!(last, Some('=') | Some('(') | Some(',')) {
      return Some(line);
    }

    last = Some(c);
  }

  None
}

fn collect_interface(ty: StageType, src: &str) -> Result<Interface, String> {
  let mut interface = Interface::default();
  let mut depth = 0usize;
  let mut line = 1;
  let mut statement = String::new();
  let mut statement_line = 1;

  for c in src.chars() {
    match c {
      '{' => {
        depth += 1;
        statement.clear();
      }

      '}' => {
        depth = depth.saturating_sub(1);
        statement.clear();
      }

      ';' if depth == 0 => {
        declare(ty, &statement, statement_line, &mut interface)?;
        statement.clear();
      }

      _ if depth == 0 => {
        if statement.trim().is_empty() {
          statement_line = line;
        }

        statement.push(c);
      }

      _ => (),
    }

    if c == '\n' {
      line += 1;
    }
  }

  Ok(interface)
}

fn declare(ty: StageType, statement: &str, line: usize, interface: &mut Interface) -> Result<(), String> {
  let tokens = statement.split_whitespace().collect::<Vec<_>>();

  let (qualifier, rest) = match tokens.split_first() {
    Some((q, rest)) => (*q, rest),
    None => return Ok(()),
  };

  // skip precision qualifiers in front of the type
  let rest = rest
    .iter()
    .copied()
    .filter(|t| !matches!(*t, "lowp" | "mediump" | "highp"))
    .collect::<Vec<_>>();

  let name = match rest.get(1) {
    Some(name) => name.split('[').next().unwrap_or(name).to_owned(),
    None => return Ok(()),
  };

  match (qualifier, ty) {
    ("attribute", StageType::VertexShader) | ("in", StageType::VertexShader) => {
      interface.attributes.push(name)
    }

    ("attribute", StageType::FragmentShader) => {
      return Err(format!(
        "0:{}: error: 'attribute' is not allowed in a fragment shader",
        line
      ));
    }

    ("uniform", _) => interface.uniforms.push(name),

    ("varying", _) | ("out", StageType::VertexShader) | ("in", StageType::FragmentShader) => {
      interface.varyings.push(name)
    }

    _ => (),
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const VS: &str = "
    attribute vec4 position;
    attribute vec2 texCoord;
    varying vec2 vTexCoord;
    void main() {
        gl_Position = position; // pass through
        vTexCoord = texCoord;
    }
  ";

  const FS: &str = "
    precision mediump float;
    varying vec2 vTexCoord;
    uniform sampler2D texture;
    /* sample the checker */
    void main() {
        gl_FragColor = texture2D(texture, vTexCoord);
    }
  ";

  #[test]
  fn vertex_interface() {
    let interface = check(StageType::VertexShader, VS).unwrap();

    assert_eq!(interface.attributes, vec!["position", "texCoord"]);
    assert_eq!(interface.varyings, vec!["vTexCoord"]);
    assert!(interface.uniforms.is_empty());
  }

  #[test]
  fn fragment_interface() {
    let interface = check(StageType::FragmentShader, FS).unwrap();

    assert!(interface.attributes.is_empty());
    assert_eq!(interface.varyings, vec!["vTexCoord"]);
    assert_eq!(interface.uniforms, vec!["texture"]);
  }

  #[test]
  fn unbalanced_braces_are_reported_with_their_line() {
    let log = check(StageType::VertexShader, "void main() {\n  gl_Position = vec4(0.);\n").unwrap_err();
    assert_eq!(log, "0:1: error: unbalanced '{'");
  }

  #[test]
  fn main_is_required() {
    let log = check(StageType::FragmentShader, "void notmain() {}").unwrap_err();
    assert!(log.contains("main"));
  }

  #[test]
  fn empty_expressions_are_rejected() {
    let log = check(StageType::VertexShader, "void main() {\n  gl_Position = ;\n}").unwrap_err();
    assert_eq!(log, "0:2: error: expression expected");
  }

  #[test]
  fn attributes_in_fragment_stage_are_rejected() {
    assert!(check(StageType::FragmentShader, "attribute vec2 uv;\nvoid main() {}").is_err());
  }

  #[test]
  fn comments_do_not_count() {
    let src = "// void main() {\nvoid main() { /* ( */ }";
    assert!(check(StageType::VertexShader, src).is_ok());
  }
}
