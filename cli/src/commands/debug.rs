use anyhow::Context;
use clap::{arg, ArgMatches, Command};
use regexercise::{compile_pattern, parse, CharClass, Pattern};

pub fn ast() -> Command {
    super::command("ast")
        .about("Print the tree for a regular expression")
        .arg(arg!(<PATTERN>).help("Regular expression"))
}

pub fn code() -> Command {
    super::command("code")
        .about("Print the VM code for a regular expression")
        .arg(arg!(<PATTERN>).help("Regular expression"))
}

pub fn debug() -> Command {
    super::command("debug")
        .about("Debug utilities")
        .arg_required_else_help(true)
        .subcommand(ast())
        .subcommand(code())
}

pub fn exec_debug(args: &ArgMatches) -> anyhow::Result<()> {
    match args.subcommand() {
        Some(("ast", args)) => exec_ast(args),
        Some(("code", args)) => exec_code(args),
        _ => unreachable!(),
    }
}

pub fn exec_ast(args: &ArgMatches) -> anyhow::Result<()> {
    let text = args.get_one::<String>("PATTERN").unwrap();

    let pattern = parse(text)
        .with_context(|| format!("invalid pattern `{}`", text))?;

    print!("{}", tree(&pattern));
    Ok(())
}

pub fn exec_code(args: &ArgMatches) -> anyhow::Result<()> {
    let text = args.get_one::<String>("PATTERN").unwrap();

    let program = parse(text)
        .and_then(|pattern| compile_pattern(&pattern))
        .with_context(|| format!("invalid pattern `{}`", text))?;

    print!("{}", program);
    Ok(())
}

/// Renders the pattern as an indented tree, one node per line.
fn tree(pattern: &Pattern) -> String {
    let mut output = String::new();
    let mut stack = vec![(pattern, 0)];

    while let Some((node, depth)) = stack.pop() {
        output.push_str(&"  ".repeat(depth));

        match node {
            Pattern::Empty => output.push_str("empty"),
            Pattern::Literal(class) => match class.as_char() {
                Some(c) => output.push_str(&format!("literal {:?}", c)),
                None => output.push_str(&format!("class {}", ranges(class))),
            },
            Pattern::Chain(first, second) => {
                output.push_str("chain");
                stack.push((second.as_ref(), depth + 1));
                stack.push((first.as_ref(), depth + 1));
            }
            Pattern::Either(first, second) => {
                output.push_str("either");
                stack.push((second.as_ref(), depth + 1));
                stack.push((first.as_ref(), depth + 1));
            }
            Pattern::Star(body) => {
                output.push_str("star");
                stack.push((body.as_ref(), depth + 1));
            }
            Pattern::Plus(body) => {
                output.push_str("plus");
                stack.push((body.as_ref(), depth + 1));
            }
        }

        output.push('\n');
    }

    output
}

fn ranges(class: &CharClass) -> String {
    if class.is_empty() {
        return "[]".to_string();
    }
    class
        .ranges()
        .iter()
        .map(|(start, end)| format!("[{:?}-{:?}]", start, end))
        .collect::<Vec<_>>()
        .join(" ")
}
