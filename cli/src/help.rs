pub const CONFIG_FILE: &str = r#"Config file for rex

Specifies a config file which controls the behavior of rex. If config file is not
specified, ${HOME}/.rex.toml is used. If it does not exist the default options are
applied.

Example:

[search]
engine = "vm"
max_chars = 0
print_leftover = true"#;

pub const ENGINE_LONG_HELP: &str = r#"Backend used for the search

Both backends produce the same results. `nfa` walks the pattern tree directly,
`vm` compiles the pattern to a program for a Pike VM. Defaults to the value of
`search.engine` in the config file, or `vm` if not set."#;

pub const MAX_CHARS_LONG_HELP: &str = r#"Maximum number of characters read from the input

The search stops after reading N characters, even if a match could be found
further ahead. Zero means no limit.

The input is read whole into memory before searching, so this limits the
characters searched, not the bytes read. The input must be valid UTF-8,
otherwise rex fails with an error."#;

pub const EXIT_STATUS: &str = r#"Exit status:
  0  a match was found
  1  no match was found
  2  an error occurred"#;
