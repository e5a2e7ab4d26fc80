use crate::errors;
use std::collections::VecDeque;

/// Splits a command into tokens, respecting spaces inside parentheses and quotes.
/// `=` and `,` outside quotes are tokens of their own.
///
/// # Arguments
/// * `command` - The raw command string to split.
///
/// # Returns
/// A `Result` containing a `VecDeque<String>` of tokens or an `errors::Error` if syntax is invalid.
pub fn tokenize(command: &str) -> Result<VecDeque<String>, errors::Error> {
    let mut result = VecDeque::new();
    let mut current = String::new();
    let mut inside_parens = false;
    let mut inside_text = false;

    for c in command.chars() {
        match c {
            '\'' => {
                inside_text = !inside_text;
                current.push(c);
            }
            ')' => {
                if !inside_text {
                    if !inside_parens {
                        return Err(errors::Error::Syntax(
                            "Unmatched closing parenthesis.".to_owned(),
                        ));
                    }
                    inside_parens = false;
                }
                current.push(c);
            }
            '(' => {
                if !inside_text {
                    if inside_parens {
                        return Err(errors::Error::Syntax(
                            "Nested opening parenthesis.".to_owned(),
                        ));
                    }
                    inside_parens = true;
                }
                current.push(c);
            }
            '=' | ',' if !inside_parens && !inside_text => {
                if !current.is_empty() {
                    result.push_back(std::mem::take(&mut current));
                }
                result.push_back(c.to_string());
            }
            c if c.is_whitespace() && !inside_parens && !inside_text => {
                if !current.is_empty() {
                    result.push_back(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        result.push_back(current);
    }
    if inside_parens {
        return Err(errors::Error::Syntax(
            "Missing closing parenthesis.".to_owned(),
        ));
    }
    if inside_text {
        return Err(errors::Error::Syntax("Unclosed text literal.".to_owned()));
    }

    Ok(result)
}
