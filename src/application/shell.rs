use crate::transport::TransportClient;
use crate::types::ContentItem;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum ShellParseError {
    #[error("empty command")]
    Empty,
    #[error("parameters must be in the form name=value")]
    BareArguments,
    #[error("unterminated quote in command")]
    UnterminatedQuote,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShellCommand {
    pub tool: String,
    pub arguments: Map<String, Value>,
}

/// Parse one interactive command: `<toolName> [name=value ...]`. Values
/// may be double-quoted. Tools in the `echo` category also accept a bare
/// form where the remaining tokens are joined into the single `message`
/// parameter. All values stay strings; the server-side coercion layer
/// converts them against the tool's schema.
pub fn parse_command(input: &str) -> Result<ShellCommand, ShellParseError> {
    let tokens = tokenize(input)?;
    let mut parts = tokens.into_iter();
    let tool = parts.next().ok_or(ShellParseError::Empty)?;
    let rest: Vec<String> = parts.collect();

    let mut arguments = Map::new();
    if rest.is_empty() {
        return Ok(ShellCommand { tool, arguments });
    }

    let has_named = rest.iter().any(|part| part.contains('='));
    if !has_named {
        if tool.starts_with("echo.") {
            arguments.insert("message".to_string(), Value::String(rest.join(" ")));
            return Ok(ShellCommand { tool, arguments });
        }
        return Err(ShellParseError::BareArguments);
    }

    for part in rest {
        match part.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                arguments.insert(name.to_string(), Value::String(value.to_string()));
            }
            _ => return Err(ShellParseError::BareArguments),
        }
    }
    Ok(ShellCommand { tool, arguments })
}

/// Whitespace-splitting tokenizer that keeps double-quoted spans together
/// and drops the quotes, so `title="Buy milk"` is one token.
fn tokenize(input: &str) -> Result<Vec<String>, ShellParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(ShellParseError::UnterminatedQuote);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Interactive loop: list the catalog, then read commands until `exit`.
/// Transport failures are printed, never fatal.
pub async fn run(client: &mut dyn TransportClient) -> std::io::Result<()> {
    let mut stdout = io::stdout();
    let tools = match client.list_tools().await {
        Ok(tools) => tools,
        Err(err) => {
            write_all(&mut stdout, format!("error: {err}\n")).await?;
            return Ok(());
        }
    };

    write_all(&mut stdout, "Available tools:\n".to_string()).await?;
    for tool in &tools {
        write_all(&mut stdout, format!("- {}: {}\n", tool.name, tool.description)).await?;
    }
    write_all(
        &mut stdout,
        "\nEnter commands as: <tool-name> <param=value> ... ('exit' to quit)\n".to_string(),
    )
    .await?;

    let stdin = BufReader::new(io::stdin());
    let mut lines = stdin.lines();

    loop {
        write_all(&mut stdout, "> ".to_string()).await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        let command = match parse_command(trimmed) {
            Ok(command) => command,
            Err(err) => {
                write_all(&mut stdout, format!("error: {err}\n")).await?;
                continue;
            }
        };

        debug!(tool = command.tool.as_str(), "Invoking tool from shell");
        match client.invoke_tool(&command.tool, command.arguments).await {
            Ok(items) => {
                if items.is_empty() {
                    write_all(&mut stdout, "(empty result)\n".to_string()).await?;
                }
                for item in items {
                    write_all(&mut stdout, format!("{}\n", render(&item))).await?;
                }
            }
            Err(err) => {
                write_all(&mut stdout, format!("error: {err}\n")).await?;
            }
        }
    }

    Ok(())
}

fn render(item: &ContentItem) -> String {
    match item {
        ContentItem::Text { text } => text.clone(),
        ContentItem::Data { data } => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
        }
    }
}

async fn write_all(stdout: &mut io::Stdout, text: String) -> std::io::Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_named_parameters() {
        let command = parse_command("todo.update id=2 isCompleted=true").expect("parses");
        assert_eq!(command.tool, "todo.update");
        assert_eq!(command.arguments.get("id"), Some(&json!("2")));
        assert_eq!(command.arguments.get("isCompleted"), Some(&json!("true")));
    }

    #[test]
    fn quoted_values_keep_their_spaces() {
        let command = parse_command(r#"todo.create title="Buy milk and eggs""#).expect("parses");
        assert_eq!(
            command.arguments.get("title"),
            Some(&json!("Buy milk and eggs"))
        );
    }

    #[test]
    fn tool_without_parameters_parses() {
        let command = parse_command("todo.list").expect("parses");
        assert_eq!(command.tool, "todo.list");
        assert!(command.arguments.is_empty());
    }

    #[test]
    fn bare_arguments_join_for_echo_tools() {
        let command = parse_command("echo.say hello there world").expect("parses");
        assert_eq!(command.tool, "echo.say");
        assert_eq!(
            command.arguments.get("message"),
            Some(&json!("hello there world"))
        );
    }

    #[test]
    fn bare_arguments_are_rejected_for_other_tools() {
        let error = parse_command("todo.create hello").expect_err("needs name=value");
        assert_eq!(error, ShellParseError::BareArguments);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(parse_command("   "), Err(ShellParseError::Empty));
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert_eq!(
            parse_command(r#"todo.create title="Buy milk"#),
            Err(ShellParseError::UnterminatedQuote)
        );
    }

    #[test]
    fn value_with_equals_sign_splits_on_first_equals() {
        let command = parse_command("echo.say message=a=b").expect("parses");
        assert_eq!(command.arguments.get("message"), Some(&json!("a=b")));
    }
}
